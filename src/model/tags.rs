//! Tagged fields of the IR and the `tag_enum!` macro.

/// Macro for defining string-tagged IR enums.
///
/// Each generated enum has one variant per known tag plus `Unknown(String)`,
/// which captures any other tag verbatim. Deserializing never fails on an
/// unrecognized tag; validation reports it instead.
///
/// # Example
///
/// ```ignore
/// tag_enum! {
///     /// Kind of thing.
///     pub enum Kind {
///         Alpha => "ALPHA",
///         Beta => "BETA",
///     }
/// }
/// ```
macro_rules! tag_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $tag:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(from = "String", into = "String")]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
            /// A tag outside the known set, kept verbatim.
            Unknown(String),
        }

        impl $name {
            /// Returns the serialized tag.
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $tag,)*
                    $name::Unknown(tag) => tag,
                }
            }

            /// Parse a tag; unrecognized input becomes `Unknown`.
            pub fn from_tag(tag: &str) -> Self {
                match tag {
                    $($tag => $name::$variant,)*
                    other => $name::Unknown(other.to_string()),
                }
            }

            /// Whether this is one of the known tags.
            pub fn is_known(&self) -> bool {
                !matches!(self, $name::Unknown(_))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::Unknown(String::new())
            }
        }

        impl From<String> for $name {
            fn from(tag: String) -> Self {
                $name::from_tag(&tag)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                match value {
                    $name::Unknown(tag) => tag,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

tag_enum! {
    /// Kind of SWORD module a corpus was imported from.
    pub enum ModuleType {
        Bible => "BIBLE",
        Commentary => "COMMENTARY",
        Dictionary => "DICTIONARY",
        GenBook => "GENBOOK",
        Devotional => "DEVOTIONAL",
    }
}

tag_enum! {
    /// Structural layer a span belongs to.
    pub enum SpanType {
        Verse => "VERSE",
        Chapter => "CHAPTER",
        Paragraph => "PARAGRAPH",
        PoetryLine => "POETRY_LINE",
        Quotation => "QUOTATION",
        RedLetter => "RED_LETTER",
        Note => "NOTE",
        CrossRef => "CROSS_REF",
        Section => "SECTION",
        Title => "TITLE",
    }
}

tag_enum! {
    /// Kind of metadata an annotation attaches to a span.
    pub enum AnnotationType {
        Strongs => "STRONGS",
        Morphology => "MORPHOLOGY",
        Footnote => "FOOTNOTE",
        CrossRef => "CROSS_REF",
        Gloss => "GLOSS",
    }
}

tag_enum! {
    /// Character class of a token.
    pub enum TokenClass {
        Word => "WORD",
        Whitespace => "WHITESPACE",
        Punctuation => "PUNCTUATION",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags_round_trip() {
        let json = serde_json::to_string(&SpanType::PoetryLine).unwrap();
        assert_eq!(json, "\"POETRY_LINE\"");
        let back: SpanType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SpanType::PoetryLine);
    }

    #[test]
    fn test_unknown_tag_preserved() {
        let parsed: ModuleType = serde_json::from_str("\"LEXICON\"").unwrap();
        assert_eq!(parsed, ModuleType::Unknown("LEXICON".into()));
        assert!(!parsed.is_known());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"LEXICON\"");
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert!(!AnnotationType::from_tag("strongs").is_known());
        assert!(AnnotationType::from_tag("STRONGS").is_known());
    }

    #[test]
    fn test_default_is_empty_unknown() {
        assert_eq!(TokenClass::default().as_str(), "");
        assert!(!TokenClass::default().is_known());
    }
}
