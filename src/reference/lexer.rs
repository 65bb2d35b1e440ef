//! Tokenizer for reference strings.
//!
//! Produces integers, identifiers (ASCII letters), the punctuation used by both
//! the dotted and the colon notation, and collapsed whitespace. Every lexeme
//! records its byte span so the parser can tell adjacent tokens (`1John`,
//! `3a`) from separated ones.

use super::ParseRefError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Kind {
    Int(u32),
    Ident(String),
    Dot,
    Colon,
    Dash,
    Space,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lexeme {
    pub kind: Kind,
    pub start: usize,
    pub end: usize,
}

pub(crate) fn lex(input: &str) -> Result<Vec<Lexeme>, ParseRefError> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let b = bytes[i];
        let kind = if b.is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let value = input[start..i]
                .parse::<u32>()
                .map_err(|_| ParseRefError::new(input, "number out of range"))?;
            Kind::Int(value)
        } else if b.is_ascii_alphabetic() {
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            Kind::Ident(input[start..i].to_string())
        } else if b.is_ascii_whitespace() {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            Kind::Space
        } else {
            i += 1;
            match b {
                b'.' => Kind::Dot,
                b':' => Kind::Colon,
                b'-' => Kind::Dash,
                _ => {
                    let ch = input[start..].chars().next().unwrap_or('?');
                    return Err(ParseRefError::new(
                        input,
                        format!("unexpected character {ch:?} at offset {start}"),
                    ));
                }
            }
        };
        out.push(Lexeme {
            kind,
            start,
            end: i,
        });
    }

    Ok(out)
}
