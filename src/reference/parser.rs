//! Recursive-descent parser for references.
//!
//! Grammar (whitespace only where shown):
//!
//! ```text
//! ref     := book [ "." chapter [ "." verse ] | SP chapter [ ":" verse ] ]
//! verse   := INT [ sub ] [ "-" INT ]
//! book    := [ INT ] IDENT        (adjacent, IDENT starts uppercase)
//! sub     := IDENT                (adjacent, one lowercase letter)
//! ```

use super::lexer::{Kind, Lexeme, lex};
use super::{ParseRefError, Ref};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Notation {
    Dotted,
    Colon,
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Lexeme>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, ParseRefError> {
        Ok(Self {
            input,
            tokens: lex(input)?,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&Lexeme> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Lexeme> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn error(&self, reason: impl Into<String>) -> ParseRefError {
        ParseRefError::new(self.input, reason)
    }

    fn expect(&mut self, kind: Kind, what: &str) -> Result<Lexeme, ParseRefError> {
        match self.bump() {
            Some(tok) if tok.kind == kind => Ok(tok),
            Some(tok) => Err(self.error(format!(
                "expected {what} at offset {}, found {:?}",
                tok.start, tok.kind
            ))),
            None => Err(self.error(format!("expected {what}, found end of input"))),
        }
    }

    fn int(&mut self, what: &str) -> Result<(u32, usize), ParseRefError> {
        match self.bump() {
            Some(Lexeme {
                kind: Kind::Int(n),
                end,
                ..
            }) => Ok((n, end)),
            Some(tok) => Err(self.error(format!(
                "expected {what} number at offset {}",
                tok.start
            ))),
            None => Err(self.error(format!("expected {what} number, found end of input"))),
        }
    }

    /// `[INT] IDENT` with the identifier starting uppercase. A numeric prefix
    /// must touch the identifier (`1John`, not `1 John`).
    fn book(&mut self) -> Result<String, ParseRefError> {
        let mut book = String::new();
        let mut prefix_end = None;

        if let Some(Lexeme {
            kind: Kind::Int(n),
            end,
            ..
        }) = self.peek()
        {
            book.push_str(&n.to_string());
            prefix_end = Some(*end);
            self.pos += 1;
        }

        match self.bump() {
            Some(Lexeme {
                kind: Kind::Ident(name),
                start,
                ..
            }) => {
                if let Some(end) = prefix_end
                    && end != start
                {
                    return Err(self.error("numeric book prefix must be attached to the name"));
                }
                if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
                    return Err(self.error(format!(
                        "book name {name:?} must start with an uppercase letter"
                    )));
                }
                book.push_str(&name);
                Ok(book)
            }
            _ => Err(self.error("expected book name")),
        }
    }

    /// Optional sub-verse letter directly after the verse number.
    fn sub_verse(&mut self, verse_end: usize) -> Result<Option<char>, ParseRefError> {
        let Some(Lexeme {
            kind: Kind::Ident(name),
            start,
            ..
        }) = self.peek()
        else {
            return Ok(None);
        };
        if *start != verse_end {
            return Err(self.error("sub-verse letter must follow the verse number"));
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_lowercase() => {
                self.pos += 1;
                Ok(Some(c))
            }
            _ => Err(self.error(format!(
                "sub-verse marker must be a single lowercase letter, found {name:?}"
            ))),
        }
    }

    fn parse(mut self) -> Result<Ref, ParseRefError> {
        let book = self.book()?;
        if self.at_end() {
            return Ok(Ref::whole_book(book));
        }

        let notation = match self.bump().map(|t| t.kind) {
            Some(Kind::Dot) => Notation::Dotted,
            Some(Kind::Space) => Notation::Colon,
            _ => return Err(self.error("expected '.' or space after book name")),
        };

        let (chapter, _) = self.int("chapter")?;
        if chapter == 0 {
            return Err(self.error(
                "chapter numbers start at 1; omit the chapter for a whole book",
            ));
        }
        if self.at_end() {
            return Ok(Ref::whole_chapter(book, chapter));
        }

        match notation {
            Notation::Dotted => self.expect(Kind::Dot, "'.'")?,
            Notation::Colon => self.expect(Kind::Colon, "':'")?,
        };

        let (verse, verse_end_offset) = self.int("verse")?;
        if verse == 0 {
            return Err(self.error(
                "verse numbers start at 1; omit the verse for a whole chapter",
            ));
        }
        let mut r = Ref::new(book, chapter, verse);
        r.sub_verse = self.sub_verse(verse_end_offset)?;

        if matches!(self.peek(), Some(Lexeme { kind: Kind::Dash, .. })) {
            self.pos += 1;
            if matches!(
                self.peek(),
                Some(Lexeme {
                    kind: Kind::Ident(_),
                    ..
                })
            ) {
                return Err(self.error("range end must be a verse number; use RefRange for spans"));
            }
            let (end, _) = self.int("range end")?;
            if end < verse {
                return Err(self.error(format!("range end {end} precedes verse {verse}")));
            }
            r.verse_end = Some(end);
        }

        if let Some(tok) = self.peek() {
            return Err(self.error(format!("trailing input at offset {}", tok.start)));
        }
        Ok(r)
    }
}

/// Parse a reference in dotted (`Gen.1.1a-3`) or colon (`Gen 1:1a-3`) notation.
pub(crate) fn parse_ref(input: &str) -> Result<Ref, ParseRefError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseRefError::new(input, "empty reference"));
    }
    Parser::new(trimmed)?.parse()
}
