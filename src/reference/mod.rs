//! Canonical book/chapter/verse addressing.
//!
//! A [`Ref`] names a whole book (`Gen`), a whole chapter (`Gen.1`), a verse
//! (`Gen.1.1`), a sub-verse part (`Gen.1.1a`) or a verse range within one
//! chapter (`Gen.1.1-5`). Two notations are accepted:
//!
//! - dotted canonical form: `Book.Chapter.Verse[sub][-end]`
//! - colon human form: `Book Chapter:Verse[sub][-end]`
//!
//! Both parse to the same value, and [`Ref`]'s `Display` always produces the
//! dotted form, so `s.parse::<Ref>()?.to_string() == s` for every canonical `s`.
//!
//! # Example
//!
//! ```
//! use scriptorium::reference::Ref;
//!
//! let r: Ref = "1John 3:16".parse().unwrap();
//! assert_eq!(r.to_string(), "1John.3.16");
//! assert!(Ref::whole_chapter("1John", 3).contains(&r));
//! ```

pub mod books;
mod lexer;
mod parser;
mod range;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use books::{BOOKS, book_index, is_known_book};
pub use range::RefRange;

/// Error returned when a reference string cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid reference {input:?}: {reason}")]
pub struct ParseRefError {
    pub input: String,
    pub reason: String,
}

impl ParseRefError {
    pub(crate) fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A scripture reference.
///
/// `chapter == 0` means the whole book, `verse == 0` the whole chapter.
/// When `verse_end` is set it is never smaller than `verse`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Ref {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub verse_end: Option<u32>,
    pub sub_verse: Option<char>,
}

impl Ref {
    /// A single verse.
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self {
            book: book.into(),
            chapter,
            verse,
            verse_end: None,
            sub_verse: None,
        }
    }

    /// A reference to an entire book.
    pub fn whole_book(book: impl Into<String>) -> Self {
        Self::new(book, 0, 0)
    }

    /// A reference to an entire chapter.
    pub fn whole_chapter(book: impl Into<String>, chapter: u32) -> Self {
        Self::new(book, chapter, 0)
    }

    /// Parse either notation.
    pub fn parse(input: &str) -> Result<Self, ParseRefError> {
        parser::parse_ref(input)
    }

    /// Set the sub-verse letter.
    pub fn with_sub_verse(mut self, sub: char) -> Self {
        self.sub_verse = Some(sub);
        self
    }

    /// Extend to a range ending at `end` within the same chapter.
    pub fn with_end(mut self, end: u32) -> Self {
        self.verse_end = Some(end);
        self
    }

    pub fn is_whole_book(&self) -> bool {
        self.chapter == 0 && self.verse == 0 && self.verse_end.is_none()
    }

    pub fn is_whole_chapter(&self) -> bool {
        self.chapter != 0 && self.verse == 0 && self.verse_end.is_none()
    }

    pub fn is_range(&self) -> bool {
        self.verse_end.is_some()
    }

    /// Last verse covered (the range end, or the verse itself).
    pub fn last_verse(&self) -> u32 {
        self.verse_end.unwrap_or(self.verse)
    }

    /// The dotted canonical form.
    pub fn osis_id(&self) -> String {
        self.to_string()
    }

    /// Key used to index mappings: book, chapter and verse only.
    pub fn verse_key(&self) -> String {
        format!("{}.{}.{}", self.book, self.chapter, self.verse)
    }

    /// The colon human form (`Gen 1:1a-3`).
    pub fn to_human(&self) -> String {
        let mut out = self.book.clone();
        if self.has_verse_part() || self.chapter != 0 {
            out.push(' ');
            out.push_str(&self.chapter.to_string());
        }
        if self.has_verse_part() {
            out.push(':');
            self.write_verse_part(&mut out);
        }
        out
    }

    /// Whether `other` falls inside this reference.
    ///
    /// A whole-book reference contains everything in that book, a whole-chapter
    /// reference every verse of that chapter, and a ranged reference every verse
    /// in `[verse, verse_end]`. A reference without a sub-verse letter contains
    /// all parts of its verse; one with a letter contains only that part of its
    /// first verse, and any later verses of its range in full.
    pub fn contains(&self, other: &Ref) -> bool {
        if self.book != other.book {
            return false;
        }
        if self.chapter == 0 {
            return true;
        }
        if self.chapter != other.chapter {
            return false;
        }
        if self.verse == 0 && self.verse_end.is_none() {
            return true;
        }
        if other.verse == 0 {
            return false;
        }
        if other.verse < self.verse || other.last_verse() > self.last_verse() {
            return false;
        }
        match self.sub_verse {
            Some(sub) if other.verse == self.verse => other.sub_verse == Some(sub),
            _ => true,
        }
    }

    fn has_verse_part(&self) -> bool {
        self.verse != 0 || self.verse_end.is_some() || self.sub_verse.is_some()
    }

    fn write_verse_part(&self, out: &mut String) {
        out.push_str(&self.verse.to_string());
        if let Some(sub) = self.sub_verse {
            out.push(sub);
        }
        if let Some(end) = self.verse_end {
            out.push('-');
            out.push_str(&end.to_string());
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.book.clone();
        if self.has_verse_part() || self.chapter != 0 {
            out.push('.');
            out.push_str(&self.chapter.to_string());
        }
        if self.has_verse_part() {
            out.push('.');
            self.write_verse_part(&mut out);
        }
        f.write_str(&out)
    }
}

impl FromStr for Ref {
    type Err = ParseRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ref::parse(s)
    }
}

impl From<Ref> for String {
    fn from(r: Ref) -> String {
        r.to_string()
    }
}

impl TryFrom<String> for Ref {
    type Error = ParseRefError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ref::parse(&s)
    }
}

impl Ord for Ref {
    fn cmp(&self, other: &Self) -> Ordering {
        books::book_sort_key(&self.book)
            .cmp(&books::book_sort_key(&other.book))
            .then(self.chapter.cmp(&other.chapter))
            .then(self.verse.cmp(&other.verse))
            .then(self.sub_verse.cmp(&other.sub_verse))
            .then(self.verse_end.cmp(&other.verse_end))
    }
}

impl PartialOrd for Ref {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(Ref::whole_book("Gen").to_string(), "Gen");
        assert_eq!(Ref::whole_chapter("Gen", 3).to_string(), "Gen.3");
        assert_eq!(Ref::new("Gen", 3, 4).to_string(), "Gen.3.4");
        assert_eq!(
            Ref::new("Gen", 3, 4).with_sub_verse('a').with_end(6).to_string(),
            "Gen.3.4a-6"
        );
        assert_eq!(Ref::new("Ps", 119, 1).with_end(8).to_human(), "Ps 119:1-8");
        assert_eq!(Ref::whole_chapter("Ps", 23).to_human(), "Ps 23");
    }

    #[test]
    fn test_colon_and_dotted_agree() {
        let a: Ref = "Gen 31:55".parse().unwrap();
        let b: Ref = "Gen.31.55".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Gen.31.55");
    }

    #[test]
    fn test_contains_whole_book() {
        let book = Ref::whole_book("Gen");
        assert!(book.contains(&Ref::new("Gen", 50, 26)));
        assert!(book.contains(&Ref::whole_chapter("Gen", 2)));
        assert!(!book.contains(&Ref::new("Exod", 1, 1)));
    }

    #[test]
    fn test_contains_whole_chapter() {
        let ch = Ref::whole_chapter("Gen", 1);
        assert!(ch.contains(&Ref::new("Gen", 1, 31)));
        assert!(!ch.contains(&Ref::new("Gen", 2, 1)));
    }

    #[test]
    fn test_contains_range() {
        let range = Ref::new("Gen", 1, 3).with_end(5);
        assert!(range.contains(&Ref::new("Gen", 1, 3)));
        assert!(range.contains(&Ref::new("Gen", 1, 5)));
        assert!(range.contains(&Ref::new("Gen", 1, 4).with_end(5)));
        assert!(!range.contains(&Ref::new("Gen", 1, 2)));
        assert!(!range.contains(&Ref::new("Gen", 1, 6)));
        assert!(!range.contains(&Ref::new("Gen", 1, 4).with_end(6)));
        assert!(!range.contains(&Ref::whole_chapter("Gen", 1)));
    }

    #[test]
    fn test_contains_sub_verse() {
        let verse = Ref::new("Gen", 1, 1);
        let part = Ref::new("Gen", 1, 1).with_sub_verse('a');
        assert!(verse.contains(&part));
        assert!(part.contains(&part));
        assert!(!part.contains(&verse));
    }

    #[test]
    fn test_contains_sub_verse_range() {
        let range: Ref = "Gen.1.1a-3".parse().unwrap();
        assert!(range.contains(&Ref::new("Gen", 1, 2)));
        assert!(range.contains(&Ref::new("Gen", 1, 3)));
        assert!(range.contains(&Ref::new("Gen", 1, 3).with_sub_verse('b')));
        assert!(range.contains(&Ref::new("Gen", 1, 1).with_sub_verse('a')));
        assert!(range.contains(&range));
        assert!(!range.contains(&Ref::new("Gen", 1, 1)));
        assert!(!range.contains(&Ref::new("Gen", 1, 1).with_sub_verse('b')));
        assert!(!range.contains(&Ref::new("Gen", 1, 4)));
    }

    #[test]
    fn test_ordering_uses_canon() {
        let mut refs = vec![
            Ref::new("Matt", 1, 1),
            Ref::new("Gen", 2, 1),
            Ref::new("Gen", 1, 10),
            Ref::new("Gen", 1, 2),
        ];
        refs.sort();
        let ids: Vec<_> = refs.iter().map(|r| r.to_string()).collect();
        assert_eq!(ids, ["Gen.1.2", "Gen.1.10", "Gen.2.1", "Matt.1.1"]);
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let r = Ref::new("Ps", 10, 1);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"Ps.10.1\"");
        let back: Ref = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
        assert!(serde_json::from_str::<Ref>("\"not a ref\"").is_err());
    }

    fn canonical_ref() -> impl Strategy<Value = String> {
        (
            prop_oneof![Just(None), (1u32..4).prop_map(Some)],
            "[A-Z][a-z]{1,6}",
            0u32..200,
            0u32..200,
            prop::option::of(prop::char::range('a', 'e')),
            prop::option::of(0u32..50),
        )
            .prop_map(|(prefix, name, chapter, verse, sub, extra)| {
                let mut s = prefix.map(|p| p.to_string()).unwrap_or_default();
                s.push_str(&name);
                if chapter == 0 {
                    return s;
                }
                s.push_str(&format!(".{chapter}"));
                if verse == 0 {
                    return s;
                }
                s.push_str(&format!(".{verse}"));
                if let Some(c) = sub {
                    s.push(c);
                }
                if let Some(extra) = extra {
                    s.push_str(&format!("-{}", verse + extra));
                }
                s
            })
    }

    proptest! {
        #[test]
        fn prop_parse_format_round_trip(s in canonical_ref()) {
            let r: Ref = s.parse().unwrap();
            prop_assert_eq!(r.to_string(), s);
        }

        #[test]
        fn prop_human_form_parses_to_same_ref(s in canonical_ref()) {
            let r: Ref = s.parse().unwrap();
            let human: Ref = r.to_human().parse().unwrap();
            prop_assert_eq!(human, r);
        }

        #[test]
        fn prop_range_contains_its_verses(
            chapter in 1u32..150,
            verse in 1u32..100,
            len in 0u32..20,
            offset in 0u32..20,
        ) {
            let range = Ref::new("Ps", chapter, verse).with_end(verse + len);
            let inner = Ref::new("Ps", chapter, verse + offset);
            prop_assert_eq!(range.contains(&inner), offset <= len);
            prop_assert!(Ref::whole_chapter("Ps", chapter).contains(&inner));
        }
    }
}
