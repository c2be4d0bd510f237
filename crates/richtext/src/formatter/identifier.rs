//! Names of the built-in formats.

use std::fmt;
use std::str::FromStr;

use crate::RichTextError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatIdentifier {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Link,
    Blockquote,
    OrderedList,
    UnorderedList,
    Header1,
    Header2,
    Header3,
    Header4,
    Header5,
    Header6,
    Pre,
    Code,
    Paragraph,
}

impl FormatIdentifier {
    pub const ALL: [FormatIdentifier; 17] = [
        FormatIdentifier::Bold,
        FormatIdentifier::Italic,
        FormatIdentifier::Underline,
        FormatIdentifier::Strikethrough,
        FormatIdentifier::Link,
        FormatIdentifier::Blockquote,
        FormatIdentifier::OrderedList,
        FormatIdentifier::UnorderedList,
        FormatIdentifier::Header1,
        FormatIdentifier::Header2,
        FormatIdentifier::Header3,
        FormatIdentifier::Header4,
        FormatIdentifier::Header5,
        FormatIdentifier::Header6,
        FormatIdentifier::Pre,
        FormatIdentifier::Code,
        FormatIdentifier::Paragraph,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormatIdentifier::Bold => "bold",
            FormatIdentifier::Italic => "italic",
            FormatIdentifier::Underline => "underline",
            FormatIdentifier::Strikethrough => "strikethrough",
            FormatIdentifier::Link => "link",
            FormatIdentifier::Blockquote => "blockquote",
            FormatIdentifier::OrderedList => "orderedList",
            FormatIdentifier::UnorderedList => "unorderedList",
            FormatIdentifier::Header1 => "header1",
            FormatIdentifier::Header2 => "header2",
            FormatIdentifier::Header3 => "header3",
            FormatIdentifier::Header4 => "header4",
            FormatIdentifier::Header5 => "header5",
            FormatIdentifier::Header6 => "header6",
            FormatIdentifier::Pre => "pre",
            FormatIdentifier::Code => "code",
            FormatIdentifier::Paragraph => "paragraph",
        }
    }
}

impl fmt::Display for FormatIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatIdentifier {
    type Err = RichTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatIdentifier::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| RichTextError::UnknownFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifier() {
        assert_eq!("orderedList".parse::<FormatIdentifier>().unwrap(), FormatIdentifier::OrderedList);
        assert_eq!("header3".parse::<FormatIdentifier>().unwrap(), FormatIdentifier::Header3);
    }

    #[test]
    fn test_unknown_identifier() {
        let err = "sparkle".parse::<FormatIdentifier>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown format: sparkle");
    }

    #[test]
    fn test_display_roundtrip() {
        for id in FormatIdentifier::ALL {
            assert_eq!(id.to_string().parse::<FormatIdentifier>().unwrap(), id);
        }
    }
}
