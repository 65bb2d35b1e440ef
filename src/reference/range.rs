//! Ranges spanning chapter or book boundaries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ParseRefError, Ref};

/// An inclusive range between two references, e.g. `Gen.31.55-Gen.32.2`.
///
/// Unlike a ranged [`Ref`], the endpoints may lie in different chapters or
/// books. Ordering follows the canonical book order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RefRange {
    start: Ref,
    end: Ref,
}

impl RefRange {
    /// Build a range; fails when `end` sorts before `start`.
    pub fn new(start: Ref, end: Ref) -> Result<Self, ParseRefError> {
        if end < start {
            return Err(ParseRefError::new(
                &format!("{start}-{end}"),
                "range end precedes range start",
            ));
        }
        Ok(Self { start, end })
    }

    /// Parse `A-B` where both sides are full references. A single reference
    /// (optionally with its own `-end`) yields a range over what it covers.
    pub fn parse(input: &str) -> Result<Self, ParseRefError> {
        let trimmed = input.trim();
        if let Some((left, right)) = split_full_range(trimmed) {
            return Self::new(Ref::parse(left)?, Ref::parse(right)?);
        }
        let single = Ref::parse(trimmed)?;
        Ok(Self::from(single))
    }

    pub fn start(&self) -> &Ref {
        &self.start
    }

    pub fn end(&self) -> &Ref {
        &self.end
    }

    /// Whether `r` lies within the range, by canonical position.
    pub fn contains(&self, r: &Ref) -> bool {
        let first = Ref::new(r.book.clone(), r.chapter, r.verse);
        let last = Ref::new(r.book.clone(), r.chapter, r.last_verse());
        position(&self.start) <= position(&first) && position(&last) <= position(&self.end)
    }
}

impl From<Ref> for RefRange {
    fn from(r: Ref) -> Self {
        let mut start = r.clone();
        start.verse_end = None;
        let mut end = r;
        if let Some(last) = end.verse_end.take() {
            end.verse = last;
            end.sub_verse = None;
        }
        Self { start, end }
    }
}

/// Canonical position ignoring sub-verse and range suffixes.
fn position(r: &Ref) -> (usize, &str, u32, u32) {
    let (book, unknown) = super::books::book_sort_key(&r.book);
    (book, unknown, r.chapter, r.verse)
}

/// Split at the first `-` whose right side starts a book name.
fn split_full_range(s: &str) -> Option<(&str, &str)> {
    s.match_indices('-').find_map(|(idx, _)| {
        let right = s[idx + 1..].trim_start();
        let starts_book = right
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .starts_with(|c: char| c.is_ascii_uppercase());
        starts_book.then(|| (s[..idx].trim_end(), right))
    })
}

impl fmt::Display for RefRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl FromStr for RefRange {
    type Err = ParseRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RefRange::parse(s)
    }
}

impl From<RefRange> for String {
    fn from(r: RefRange) -> String {
        r.to_string()
    }
}

impl TryFrom<String> for RefRange {
    type Error = ParseRefError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        RefRange::parse(&s)
    }
}
