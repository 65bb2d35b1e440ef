//! Word/punctuation/whitespace tokenization.

use super::tags::TokenClass;
use super::Token;

/// Classify a single character.
///
/// Non-ASCII characters count as word characters so accented Latin, Greek,
/// Hebrew and other scripts stay inside words.
fn classify(c: char) -> TokenClass {
    if c.is_whitespace() {
        TokenClass::Whitespace
    } else if c.is_alphanumeric() || c == '\'' || !c.is_ascii() {
        TokenClass::Word
    } else {
        TokenClass::Punctuation
    }
}

/// Split `text` into maximal runs of one character class.
///
/// Ranges are half-open and counted in characters, not bytes. The tokens
/// cover the text exactly: concatenating their texts reproduces the input.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current: Option<(TokenClass, usize, String)> = None;

    for (pos, c) in text.chars().enumerate() {
        let class = classify(c);
        match current.as_mut() {
            Some((run_class, _, buf)) if *run_class == class => buf.push(c),
            _ => {
                if let Some((run_class, start, buf)) = current.take() {
                    push_token(&mut tokens, run_class, start, pos, buf);
                }
                current = Some((class, pos, c.to_string()));
            }
        }
    }

    if let Some((run_class, start, buf)) = current {
        let end = start + buf.chars().count();
        push_token(&mut tokens, run_class, start, end, buf);
    }

    tokens
}

fn push_token(tokens: &mut Vec<Token>, class: TokenClass, start: usize, end: usize, text: String) {
    let index = tokens.len();
    tokens.push(Token {
        id: format!("t{index}"),
        index,
        char_start: start,
        char_end: end,
        text,
        class,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn summary(text: &str) -> Vec<(String, &'static str)> {
        tokenize(text)
            .into_iter()
            .map(|t| {
                let class = match t.class {
                    TokenClass::Word => "w",
                    TokenClass::Whitespace => "s",
                    TokenClass::Punctuation => "p",
                    TokenClass::Unknown(_) => "?",
                };
                (t.text, class)
            })
            .collect()
    }

    #[test]
    fn test_simple_sentence() {
        let tokens = summary("In the beginning, God");
        assert_eq!(
            tokens,
            vec![
                ("In".into(), "w"),
                (" ".into(), "s"),
                ("the".into(), "w"),
                (" ".into(), "s"),
                ("beginning".into(), "w"),
                (",".into(), "p"),
                (" ".into(), "s"),
                ("God".into(), "w"),
            ]
        );
    }

    #[test]
    fn test_apostrophe_and_unicode_stay_in_words() {
        let tokens = summary("LORD's ἀρχῇ בְּרֵאשִׁית");
        assert_eq!(tokens[0], ("LORD's".into(), "w"));
        assert_eq!(tokens[2], ("ἀρχῇ".into(), "w"));
        assert_eq!(tokens[4], ("בְּרֵאשִׁית".into(), "w"));
    }

    #[test]
    fn test_char_ranges_not_bytes() {
        let tokens = tokenize("\u{1f00}\u{3c1}\u{3c7}\u{1fc7}.");
        assert_eq!((tokens[0].char_start, tokens[0].char_end), (0, 4));
        assert_eq!((tokens[1].char_start, tokens[1].char_end), (4, 5));
    }

    #[test]
    fn test_empty_text() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_punctuation_runs_merge() {
        // the closing curly quote is non-ASCII and therefore a word character
        let tokens = summary("end.\u{201d}--");
        assert_eq!(
            tokens,
            vec![
                ("end".into(), "w"),
                (".".into(), "p"),
                ("\u{201d}".into(), "w"),
                ("--".into(), "p"),
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_tokens_cover_text(text in "\\PC{0,64}") {
            let tokens = tokenize(&text);
            let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
            prop_assert_eq!(&joined, &text);

            let mut expected_start = 0;
            for (i, token) in tokens.iter().enumerate() {
                prop_assert_eq!(token.index, i);
                prop_assert_eq!(token.char_start, expected_start);
                prop_assert!(token.char_end > token.char_start);
                expected_start = token.char_end;
            }
            prop_assert_eq!(expected_start, text.chars().count());
        }

        #[test]
        fn prop_adjacent_tokens_differ_in_class(text in "[a-z ,.;]{0,40}") {
            let tokens = tokenize(&text);
            for pair in tokens.windows(2) {
                prop_assert_ne!(&pair[0].class, &pair[1].class);
            }
        }
    }
}
