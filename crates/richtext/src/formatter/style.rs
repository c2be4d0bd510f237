//! Stateless style formatters.

use std::ops::Range;

use crate::styled::{
    Attributes, CharacterStyle, HtmlRepresentation, Link, ListStyle, ParagraphProperty,
    StyledText,
};

/// Detects, applies and removes one kind of style on a range of styled text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatter {
    Character(CharacterStyle),
    /// Link to the given target; any link counts as present
    Link(String),
    Blockquote,
    List(ListStyle),
    Header(u8),
    Pre,
    Paragraph,
}

impl Formatter {
    /// Paragraph formatters always act on whole paragraphs
    pub fn is_paragraph_formatter(&self) -> bool {
        !matches!(self, Formatter::Character(_) | Formatter::Link(_))
    }

    /// The range this formatter acts on when asked to format `range`
    pub fn application_range(&self, text: &StyledText, range: Range<usize>) -> Range<usize> {
        if self.is_paragraph_formatter() {
            text.paragraph_range(range)
        } else {
            range
        }
    }

    /// Check if the style covers the whole (expanded) range.
    ///
    /// An empty range checks the style at that location: the character before it for
    /// character styles, the paragraph containing it for paragraph styles.
    pub fn present(&self, text: &StyledText, range: Range<usize>) -> bool {
        if range.is_empty() {
            return self.present_at(text, range.start);
        }
        let range = self.application_range(text, range);
        let runs = text.runs_in(range);
        !runs.is_empty() && runs.iter().all(|run| self.matches(&run.attributes))
    }

    pub fn present_at(&self, text: &StyledText, location: usize) -> bool {
        let s = text.as_str();
        let before = s[..location].char_indices().next_back().map(|(i, _)| i);
        let offset = if self.is_paragraph_formatter() && location < s.len() {
            Some(location)
        } else {
            before.or(if location < s.len() { Some(location) } else { None })
        };
        offset.is_some_and(|o| self.matches(text.attributes_at(o)))
    }

    /// Check if a single set of attributes carries this style
    pub fn matches(&self, attributes: &Attributes) -> bool {
        let paragraph = &attributes.paragraph;
        match self {
            Formatter::Character(style) => attributes.has_style(*style),
            Formatter::Link(_) => attributes.link.is_some(),
            Formatter::Blockquote => paragraph
                .iter()
                .any(|p| matches!(p, ParagraphProperty::Blockquote(_))),
            Formatter::List(style) => paragraph.iter().rev().find_map(|p| match p {
                ParagraphProperty::TextList { style, .. } => Some(*style),
                _ => None,
            }) == Some(*style),
            Formatter::Header(level) => paragraph
                .iter()
                .any(|p| matches!(p, ParagraphProperty::Header { level: l, .. } if l == level)),
            Formatter::Pre => paragraph.iter().any(ParagraphProperty::is_pre),
            Formatter::Paragraph => paragraph
                .iter()
                .any(|p| matches!(p, ParagraphProperty::HtmlParagraph(_))),
        }
    }

    pub fn apply(&self, text: &mut StyledText, range: Range<usize>) {
        self.apply_with(text, range, None);
    }

    /// Apply the style, recording the HTML it should be written back as
    pub fn apply_with(
        &self,
        text: &mut StyledText,
        range: Range<usize>,
        representation: Option<HtmlRepresentation>,
    ) {
        let range = self.application_range(text, range);
        text.update_attributes(range, |attributes| {
            self.apply_to(attributes, representation.clone())
        });
    }

    pub fn remove(&self, text: &mut StyledText, range: Range<usize>) {
        let range = self.application_range(text, range);
        text.update_attributes(range, |attributes| self.remove_from(attributes));
    }

    /// Remove the style if it covers the whole range, apply it everywhere otherwise
    pub fn toggle(&self, text: &mut StyledText, range: Range<usize>) {
        if self.present(text, range.clone()) {
            self.remove(text, range);
        } else {
            self.apply(text, range);
        }
    }

    fn apply_to(&self, attributes: &mut Attributes, representation: Option<HtmlRepresentation>) {
        let snapshot = representation.as_ref().and_then(|r| r.element()).cloned();
        let paragraph = &mut attributes.paragraph;
        match self {
            Formatter::Character(style) => attributes.add_style(*style, representation),
            Formatter::Link(href) => {
                attributes.link = Some(Link {
                    href: href.clone(),
                    representation: snapshot,
                })
            }
            Formatter::Blockquote => {
                if !self.matches_paragraph(paragraph) {
                    let index = leaf_block_index(paragraph).unwrap_or(paragraph.len());
                    paragraph.insert(index, ParagraphProperty::Blockquote(snapshot));
                }
            }
            Formatter::List(new_style) => {
                let innermost = paragraph.iter_mut().rev().find_map(|p| match p {
                    ParagraphProperty::TextList { style, .. } => Some(style),
                    _ => None,
                });
                match innermost {
                    Some(style) => *style = *new_style,
                    None => {
                        paragraph.insert(0, ParagraphProperty::HtmlLi(None));
                        paragraph.insert(
                            0,
                            ParagraphProperty::TextList {
                                style: *new_style,
                                representation: snapshot,
                            },
                        );
                    }
                }
            }
            Formatter::Header(new_level) => {
                let header = paragraph.iter_mut().find_map(|p| match p {
                    ParagraphProperty::Header { level, .. } => Some(level),
                    _ => None,
                });
                match header {
                    Some(level) => *level = *new_level,
                    None => replace_leaf_paragraph(
                        paragraph,
                        ParagraphProperty::Header {
                            level: *new_level,
                            representation: snapshot,
                        },
                    ),
                }
            }
            Formatter::Pre => {
                if !self.matches_paragraph(paragraph) {
                    replace_leaf_paragraph(paragraph, ParagraphProperty::Pre(snapshot));
                }
            }
            Formatter::Paragraph => {
                if !self.matches_paragraph(paragraph) {
                    paragraph.push(ParagraphProperty::HtmlParagraph(snapshot));
                }
            }
        }
    }

    fn remove_from(&self, attributes: &mut Attributes) {
        let paragraph = &mut attributes.paragraph;
        match self {
            Formatter::Character(style) => attributes.remove_style(*style),
            Formatter::Link(_) => attributes.link = None,
            Formatter::Blockquote => {
                paragraph.retain(|p| !matches!(p, ParagraphProperty::Blockquote(_)))
            }
            Formatter::List(_) => {
                if let Some(index) = paragraph.iter().rposition(ParagraphProperty::is_list) {
                    paragraph.remove(index);
                    if matches!(paragraph.get(index), Some(ParagraphProperty::HtmlLi(_))) {
                        paragraph.remove(index);
                    }
                }
            }
            Formatter::Header(_) => {
                paragraph.retain(|p| !matches!(p, ParagraphProperty::Header { .. }))
            }
            Formatter::Pre => paragraph.retain(|p| !p.is_pre()),
            Formatter::Paragraph => {
                paragraph.retain(|p| !matches!(p, ParagraphProperty::HtmlParagraph(_)))
            }
        }
    }

    fn matches_paragraph(&self, paragraph: &[ParagraphProperty]) -> bool {
        let attributes = Attributes {
            paragraph: paragraph.to_vec(),
            ..Attributes::default()
        };
        self.matches(&attributes)
    }
}

// Position of the innermost paragraph, heading or pre marker.
fn leaf_block_index(paragraph: &[ParagraphProperty]) -> Option<usize> {
    paragraph.iter().position(|p| {
        matches!(
            p,
            ParagraphProperty::HtmlParagraph(_)
                | ParagraphProperty::Header { .. }
                | ParagraphProperty::Pre(_)
        )
    })
}

// Headings and pre blocks take the place of a plain paragraph marker.
fn replace_leaf_paragraph(paragraph: &mut Vec<ParagraphProperty>, property: ParagraphProperty) {
    match paragraph
        .iter()
        .position(|p| matches!(p, ParagraphProperty::HtmlParagraph(_)))
    {
        Some(index) => paragraph[index] = property,
        None => paragraph.push(property),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> StyledText {
        StyledText::with_attributes(text, Attributes::new())
    }

    #[test]
    fn test_character_formatter_uses_range_as_is() {
        let mut text = plain("Hello world");
        let bold = Formatter::Character(CharacterStyle::Bold);
        bold.apply(&mut text, 0..5);
        assert!(bold.present(&text, 0..5));
        assert!(!bold.present(&text, 0..6));
        assert!(bold.present(&text, 5..5));
        assert!(!bold.present(&text, 7..7));
    }

    #[test]
    fn test_paragraph_formatter_expands_range() {
        let mut text = plain("one\ntwo\nthree");
        let quote = Formatter::Blockquote;
        assert_eq!(quote.application_range(&text, 5..6), 4..8);
        quote.apply(&mut text, 5..6);
        assert!(quote.present(&text, 4..8));
        assert!(!quote.present(&text, 0..3));
        assert!(!quote.present(&text, 9..10));
    }

    #[test]
    fn test_toggle() {
        let mut text = plain("Apply a blockquote");
        let quote = Formatter::Blockquote;
        quote.toggle(&mut text, 0..5);
        assert!(quote.present(&text, 0..18));
        quote.toggle(&mut text, 0..5);
        assert!(!quote.present(&text, 0..18));
        assert!(text.runs()[0].attributes.paragraph.is_empty());
    }

    #[test]
    fn test_toggle_partial_applies_everywhere() {
        let mut text = plain("Hello");
        let italic = Formatter::Character(CharacterStyle::Italic);
        italic.apply(&mut text, 0..2);
        italic.toggle(&mut text, 0..5);
        assert!(italic.present(&text, 0..5));
    }

    #[test]
    fn test_list_formatter_switches_style() {
        let mut text = plain("item");
        Formatter::List(ListStyle::Unordered).apply(&mut text, 0..0);
        assert!(Formatter::List(ListStyle::Unordered).present(&text, 0..4));

        Formatter::List(ListStyle::Ordered).apply(&mut text, 0..0);
        assert!(Formatter::List(ListStyle::Ordered).present(&text, 0..4));
        assert_eq!(text.attributes_at(0).list_depth(), 1);

        Formatter::List(ListStyle::Ordered).remove(&mut text, 0..4);
        assert!(text.attributes_at(0).paragraph.is_empty());
    }

    #[test]
    fn test_header_replaces_paragraph_and_level() {
        let mut text = plain("Title");
        Formatter::Paragraph.apply(&mut text, 0..5);
        Formatter::Header(1).apply(&mut text, 0..5);
        assert_eq!(text.attributes_at(0).paragraph.len(), 1);
        assert!(Formatter::Header(1).present(&text, 0..5));

        Formatter::Header(3).apply(&mut text, 0..5);
        assert!(Formatter::Header(3).present(&text, 0..5));
        assert!(!Formatter::Header(1).present(&text, 0..5));
    }

    #[test]
    fn test_link_with_representation() {
        let mut text = plain("click");
        let snapshot = crate::styled::ElementSnapshot::new(
            "a",
            richtext_core::attrs(&[("href", "x"), ("target", "_blank")]),
        );
        Formatter::Link("x".to_string()).apply_with(
            &mut text,
            0..5,
            Some(HtmlRepresentation::Element(snapshot.clone())),
        );
        let link = text.attributes_at(0).link.clone().unwrap();
        assert_eq!(link.href, "x");
        assert_eq!(link.representation, Some(snapshot));
    }

    #[test]
    fn test_blockquote_wraps_leaf_block() {
        let mut text = plain("quoted");
        Formatter::Paragraph.apply(&mut text, 0..0);
        Formatter::Blockquote.apply(&mut text, 0..0);
        assert!(matches!(
            text.attributes_at(0).paragraph.as_slice(),
            [ParagraphProperty::Blockquote(_), ParagraphProperty::HtmlParagraph(_)]
        ));
    }
}
