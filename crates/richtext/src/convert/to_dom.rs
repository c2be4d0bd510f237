//! Styled text → DOM.
//!
//! Each paragraph becomes a chain of block elements built from its paragraph
//! properties, merged into the blocks of the previous paragraph where both share an
//! equal outer structure. Character styles become inline elements, reusing the elements
//! of the previous run where possible.

use std::cmp::Reverse;
use std::ops::Range;

use log::trace;
use richtext_core::{elements, set_attribute, Attribute, CssProperty, Document, NodeId};

use crate::parser::parse_html;
use crate::service::ConverterOptions;
use crate::styled::{
    Attachment, Attributes, CharacterStyle, ElementSnapshot, HtmlRepresentation,
    ParagraphProperty, StyledText,
};
use crate::utilities::{is_raw_html_element, LINE_SEPARATOR, OBJECT_REPLACEMENT, PARAGRAPH_SEPARATOR};

/// Convert styled text into a document
pub fn to_dom(text: &StyledText, options: &ConverterOptions) -> Document {
    let mut converter = StyledToDom {
        text,
        document: Document::new(),
        previous_blocks: Vec::new(),
    };
    for range in text.paragraph_ranges() {
        converter.paragraph(range);
    }
    if let Some(replacement) = options.trailing_empty_line_replacement {
        if text.as_str().ends_with(PARAGRAPH_SEPARATOR) {
            converter.trailing_line(replacement);
        }
    }
    let root = converter.document.root();
    converter.document.normalize(root);
    converter.document
}

struct StyledToDom<'a> {
    text: &'a StyledText,
    document: Document,
    /// Block chain of the last paragraph, outermost first
    previous_blocks: Vec<NodeId>,
}

impl StyledToDom<'_> {
    fn paragraph(&mut self, range: Range<usize>) {
        let text = self.text;
        let s = &text.as_str()[range.clone()];
        let content = if s.ends_with(PARAGRAPH_SEPARATOR) {
            range.start..range.end - 1
        } else {
            range.clone()
        };
        let attributes = text.attributes_at(range.start);

        if let Some(node) = self.standalone_block(attributes, content.clone()) {
            let root = self.document.root();
            self.document.append_child(root, node);
            self.previous_blocks.clear();
            return;
        }

        let chain = self.create_blocks(attributes);
        if let Some(leaf) = chain.last().copied() {
            self.inline(leaf, content, attributes.is_in_pre());
        }
        self.place(chain);
    }

    fn trailing_line(&mut self, replacement: char) {
        let text = self.text;
        let attributes = text.attributes_at(text.len() - 1);
        let chain = self.create_blocks(attributes);
        if let Some(leaf) = chain.last().copied() {
            let node = self.document.create_text(&replacement.to_string());
            self.document.append_child(leaf, node);
        }
        self.place(chain);
    }

    // A paragraph without properties holding only a block-level attachment is written
    // without a wrapping paragraph.
    fn standalone_block(&mut self, attributes: &Attributes, content: Range<usize>) -> Option<NodeId> {
        if !attributes.paragraph.is_empty() || &self.text.as_str()[content] != "\u{FFFC}" {
            return None;
        }
        let block = match attributes.attachment.as_ref()? {
            Attachment::Html { tag, .. } => elements::is_block(tag) || is_raw_html_element(tag),
            Attachment::Element(snapshot) => elements::is_block(&snapshot.name),
            _ => false,
        };
        if !block {
            return None;
        }
        let attachment = attributes.attachment.clone()?;
        self.attachment(&attachment)
    }

    fn create_blocks(&mut self, attributes: &Attributes) -> Vec<NodeId> {
        let mut snapshots: Vec<ElementSnapshot> = attributes
            .paragraph
            .iter()
            .filter(|p| !matches!(p, ParagraphProperty::Header { level: 0, .. }))
            .map(|p| p.element())
            .collect();
        if snapshots.is_empty() {
            snapshots.push(ElementSnapshot::new("p", Vec::new()));
        }

        let chain: Vec<NodeId> = snapshots.iter().map(|s| s.create(&mut self.document)).collect();
        for pair in chain.windows(2) {
            self.document.append_child(pair[0], pair[1]);
        }
        chain
    }

    /// Attach a new block chain after the previous paragraph, merging shared outer
    /// blocks.
    fn place(&mut self, chain: Vec<NodeId>) {
        let left = std::mem::take(&mut self.previous_blocks);
        // The innermost blocks of two paragraphs are never merged.
        let limit = if left.len() == chain.len() {
            left.len().saturating_sub(1)
        } else {
            left.len().min(chain.len())
        };
        let mut shared = left
            .iter()
            .zip(&chain)
            .take(limit)
            .take_while(|(l, r)| self.mergeable(**l, **r))
            .count();
        while shared > 0 && self.document.is_element_named(chain[shared - 1], "li") {
            shared -= 1;
        }

        if shared == 0 {
            let root = self.document.root();
            self.document.append_child(root, chain[0]);
            self.previous_blocks = chain;
            return;
        }

        trace!("merging {shared} block(s) with the previous paragraph");
        let target = left[shared - 1];
        for child in self.document.take_children(chain[shared - 1]) {
            self.document.append_child(target, child);
        }
        self.document.remove(chain[0]);
        self.previous_blocks = left[..shared].iter().chain(&chain[shared..]).copied().collect();
    }

    fn mergeable(&self, left: NodeId, right: NodeId) -> bool {
        match (self.document.element(left), self.document.element(right)) {
            (Some(l), Some(r)) => l == r && elements::is_mergeable_block(&l.name),
            _ => false,
        }
    }

    fn inline(&mut self, leaf: NodeId, range: Range<usize>, in_pre: bool) {
        if range.is_empty() {
            return;
        }
        let text = self.text;
        let runs = text.runs_in(range);
        let items: Vec<Vec<InlineItem>> = runs.iter().map(|r| inline_items(&r.attributes)).collect();
        let mut open: Vec<(InlineItem, NodeId)> = Vec::new();

        for (index, run) in runs.iter().enumerate() {
            let wanted = &items[index];
            let mut desired: Vec<InlineItem> = open
                .iter()
                .filter(|(item, _)| wanted.contains(item))
                .map(|(item, _)| item.clone())
                .collect();
            let mut new: Vec<InlineItem> = wanted.iter().filter(|i| !desired.contains(i)).cloned().collect();
            new.sort_by_key(|item| {
                let span: usize = runs[index..]
                    .iter()
                    .zip(&items[index..])
                    .take_while(|(_, run_items)| run_items.contains(item))
                    .map(|(r, _)| r.range.len())
                    .sum();
                (Reverse(span), item.rank())
            });
            desired.extend(new);

            let common = open
                .iter()
                .zip(&desired)
                .take_while(|((open_item, _), item)| open_item == *item)
                .count();
            open.truncate(common);
            for item in desired.into_iter().skip(common) {
                let parent = open.last().map_or(leaf, |(_, node)| *node);
                let node = item.snapshot.create(&mut self.document);
                self.document.append_child(parent, node);
                open.push((item, node));
            }

            let parent = open.last().map_or(leaf, |(_, node)| *node);
            let s = &text.as_str()[run.range.clone()];
            self.leaves(parent, s, &run.attributes, in_pre);
        }
    }

    fn leaves(&mut self, parent: NodeId, s: &str, attributes: &Attributes, in_pre: bool) {
        let mut buffer = String::new();
        for c in s.chars() {
            let node = match (c, &attributes.attachment) {
                (LINE_SEPARATOR, Some(Attachment::LineBreak(snapshot))) => Some(snapshot.create(&mut self.document)),
                (LINE_SEPARATOR, _) if in_pre => {
                    buffer.push('\n');
                    continue;
                }
                (OBJECT_REPLACEMENT, Some(attachment)) => {
                    let attachment = attachment.clone();
                    self.attachment(&attachment)
                }
                _ => {
                    buffer.push(c);
                    continue;
                }
            };
            self.flush_text(parent, &mut buffer);
            if let Some(node) = node {
                self.document.append_child(parent, node);
            }
        }
        self.flush_text(parent, &mut buffer);
    }

    fn flush_text(&mut self, parent: NodeId, buffer: &mut String) {
        if !buffer.is_empty() {
            let node = self.document.create_text(buffer);
            self.document.append_child(parent, node);
            buffer.clear();
        }
    }

    fn attachment(&mut self, attachment: &Attachment) -> Option<NodeId> {
        match attachment {
            Attachment::Comment(text) => Some(self.document.create_comment(text)),
            Attachment::Element(snapshot) | Attachment::LineBreak(snapshot) => {
                Some(snapshot.create(&mut self.document))
            }
            Attachment::Html { raw, .. } => {
                let parsed = parse_html(raw);
                let roots = parsed.children(parsed.root());
                match roots {
                    [] => None,
                    [single] => Some(self.document.import(&parsed, *single)),
                    _ => {
                        let span = self.document.create_element("span");
                        for node in roots {
                            let copy = self.document.import(&parsed, *node);
                            self.document.append_child(span, copy);
                        }
                        Some(span)
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InlineKey {
    Style(CharacterStyle),
    Link,
    Unsupported(usize),
}

/// An inline element a run wants open around it
#[derive(Debug, Clone, PartialEq, Eq)]
struct InlineItem {
    key: InlineKey,
    snapshot: ElementSnapshot,
}

impl InlineItem {
    // Nesting order for elements that open together, outermost first.
    fn rank(&self) -> usize {
        match self.key {
            InlineKey::Style(CharacterStyle::Bold) => 0,
            InlineKey::Style(CharacterStyle::Italic) => 1,
            InlineKey::Link => 2,
            InlineKey::Style(CharacterStyle::Strikethrough) => 3,
            InlineKey::Style(CharacterStyle::Underline) => 4,
            InlineKey::Style(CharacterStyle::Code) => 5,
            InlineKey::Style(CharacterStyle::Cite) => 6,
            InlineKey::Unsupported(depth) => 7 + depth,
        }
    }
}

fn inline_items(attributes: &Attributes) -> Vec<InlineItem> {
    let mut items = Vec::new();
    for (style, representation) in &attributes.character {
        let snapshot = match representation {
            Some(HtmlRepresentation::Element(snapshot)) => snapshot.clone(),
            Some(HtmlRepresentation::Attribute(attribute)) => {
                ElementSnapshot::new("span", vec![attribute.clone()])
            }
            Some(HtmlRepresentation::InlineCss(property)) => {
                if carried_by_unsupported(attributes, property) {
                    continue;
                }
                ElementSnapshot::new("span", vec![Attribute::new("style", &property.to_string())])
            }
            None => ElementSnapshot::new(style.default_element_name(), Vec::new()),
        };
        items.push(InlineItem {
            key: InlineKey::Style(*style),
            snapshot,
        });
    }

    if let Some(link) = &attributes.link {
        let mut snapshot = link
            .representation
            .clone()
            .unwrap_or_else(|| ElementSnapshot::new("a", Vec::new()));
        set_attribute(&mut snapshot.attributes, Attribute::new("href", &link.href));
        items.push(InlineItem {
            key: InlineKey::Link,
            snapshot,
        });
    }

    for (depth, snapshot) in attributes.unsupported.iter().enumerate() {
        items.push(InlineItem {
            key: InlineKey::Unsupported(depth),
            snapshot: snapshot.clone(),
        });
    }
    items
}

fn carried_by_unsupported(attributes: &Attributes, property: &CssProperty) -> bool {
    attributes.unsupported.iter().any(|snapshot| {
        snapshot
            .attribute("style")
            .and_then(|a| a.css())
            .is_some_and(|css| css.contains(property))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::to_styled_text;
    use crate::formatter::Formatter;
    use crate::styled::ListStyle;
    use crate::utilities::ZERO_WIDTH_SPACE;
    use richtext_core::{serialize, SerializeOptions};

    fn html(text: &StyledText) -> String {
        serialize(&to_dom(text, &ConverterOptions::default()), &SerializeOptions::default())
    }

    fn roundtrip(source: &str) -> String {
        let document = crate::parser::parse_html(source);
        html(&to_styled_text(&document, &ConverterOptions::default()))
    }

    #[test]
    fn test_plain_text_gets_paragraph() {
        let text = StyledText::with_attributes("Hello", Attributes::new());
        assert_eq!(html(&text), "<p>Hello</p>");
    }

    #[test]
    fn test_roundtrips() {
        for source in [
            "<p>Hello <b>bold <i>both</i></b></p>",
            "<p>a</p><p>b</p>",
            "<ul><li>One</li><li>Two</li></ul>",
            "<ol><li>First</li><li><ol><li>Second</li></ol></li></ol>",
            "<blockquote><p>Quote</p><cite>Author</cite></blockquote>",
            "<h1>Title</h1><p>Body with <a href=\"x\" target=\"_blank\">link</a></p>",
            "<p>a<br>b</p>",
            "<pre>line 1\nline 2</pre>",
            "<p></p><p>b</p>",
            "<p>a</p><p></p>",
            "<p><span class=\"x\">unsupported</span> text</p>",
            "<p><img src=\"x.jpg\" alt=\"Alt\"></p>",
            "<hr>",
            "<hr><hr>",
            "<p> </p>",
            "<p>\u{2028}x</p>",
            "<script>(a = b || []).push({});</script>",
            "<figure><img src=\"a.jpg\"><figcaption>Caption</figcaption></figure>",
        ] {
            assert_eq!(roundtrip(source), source, "round trip of {source}");
        }
    }

    #[test]
    fn test_comment_placement() {
        assert_eq!(
            roundtrip("<!-- c --><h2 class=\"x\">body</h2>"),
            "<p><!-- c --></p><h2 class=\"x\">body</h2>"
        );
    }

    #[test]
    fn test_block_attachments_are_paragraphs() {
        let source = "<p>a</p><!-- c --><hr><p>b</p>";
        let once = roundtrip(source);
        assert_eq!(once, "<p>a</p><p><!-- c --></p><hr><p>b</p>");
        assert_eq!(roundtrip(&once), once);

        assert_eq!(roundtrip("<img src=\"x.jpg\"><hr>"), "<p><img src=\"x.jpg\"></p><hr>");
        assert_eq!(roundtrip("<hr><table><tr><td>x</td></tr></table>"), "<hr><table><tr><td>x</td></tr></table>");
        assert_eq!(roundtrip("<blockquote><hr></blockquote>"), "<blockquote><hr></blockquote>");
    }

    #[test]
    fn test_typing_at_paragraph_start_keeps_blocks() {
        for (source, expected) in [
            ("<p>a</p><h1>b</h1>", "<p>a</p><h1>Xb</h1>"),
            ("<p>a</p><ul><li>b</li></ul>", "<p>a</p><ul><li>Xb</li></ul>"),
            ("<h2>a</h2><blockquote>b</blockquote>", "<h2>a</h2><blockquote>Xb</blockquote>"),
        ] {
            let document = crate::parser::parse_html(source);
            let mut text = to_styled_text(&document, &ConverterOptions::default());
            text.insert(2, "X");
            assert_eq!(html(&text), expected, "typing into {source}");
        }
    }

    #[test]
    fn test_typed_line_break() {
        let mut text = StyledText::with_attributes("ab", Attributes::new());
        text.insert(1, "\u{2028}");
        assert_eq!(html(&text), "<p>a<br>b</p>");
    }

    #[test]
    fn test_blockquote_toggling() {
        let mut text = StyledText::with_attributes("Apply a blockquote", Attributes::new());
        Formatter::Blockquote.toggle(&mut text, 0..0);
        assert_eq!(html(&text), "<blockquote>Apply a blockquote</blockquote>");
        Formatter::Blockquote.toggle(&mut text, 0..0);
        assert_eq!(html(&text), "<p>Apply a blockquote</p>");
    }

    #[test]
    fn test_overlapping_styles() {
        let mut text = StyledText::with_attributes("abcdef", Attributes::new());
        Formatter::Character(CharacterStyle::Bold).apply(&mut text, 0..4);
        Formatter::Character(CharacterStyle::Italic).apply(&mut text, 2..6);
        assert_eq!(
            html(&text),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_longer_style_is_outermost() {
        let mut text = StyledText::with_attributes("abcdef", Attributes::new());
        Formatter::Character(CharacterStyle::Italic).apply(&mut text, 0..6);
        Formatter::Character(CharacterStyle::Bold).apply(&mut text, 0..3);
        assert_eq!(html(&text), "<p><em><strong>abc</strong>def</em></p>");
    }

    #[test]
    fn test_edited_unsupported_span_is_dropped() {
        let document = crate::parser::parse_html("<p><span class=\"x\">ab</span></p>");
        let mut text = to_styled_text(&document, &ConverterOptions::default());
        text.insert(1, "X");
        assert_eq!(html(&text), "<p>aXb</p>");
    }

    #[test]
    fn test_inline_css_style_survives_edit() {
        let document = crate::parser::parse_html("<p><span style=\"font-weight: bold\">ab</span></p>");
        let mut text = to_styled_text(&document, &ConverterOptions::default());
        assert_eq!(html(&text), "<p><span style=\"font-weight: bold\">ab</span></p>");
        text.insert(1, "X");
        assert_eq!(html(&text), "<p><span style=\"font-weight: bold\">aXb</span></p>");
    }

    #[test]
    fn test_list_style_change() {
        let document = crate::parser::parse_html("<ul><li>a</li><li>b</li></ul>");
        let mut text = to_styled_text(&document, &ConverterOptions::default());
        let len = text.len();
        Formatter::List(ListStyle::Ordered).apply(&mut text, 0..len);
        assert_eq!(html(&text), "<ol><li>a</li><li>b</li></ol>");
    }

    #[test]
    fn test_empty_list_item() {
        let mut attributes = Attributes::new();
        attributes.paragraph.push(ParagraphProperty::TextList {
            style: ListStyle::Unordered,
            representation: None,
        });
        attributes.paragraph.push(ParagraphProperty::HtmlLi(None));
        let text = StyledText::with_attributes("a\n\n", attributes);
        assert_eq!(html(&text), "<ul><li>a</li><li></li></ul>");
    }

    #[test]
    fn test_trailing_empty_line_replacement() {
        let text = StyledText::with_attributes("a\n", Attributes::new());
        assert_eq!(html(&text), "<p>a</p>");

        let options = ConverterOptions {
            trailing_empty_line_replacement: Some(ZERO_WIDTH_SPACE),
            ..ConverterOptions::default()
        };
        let document = to_dom(&text, &options);
        assert_eq!(
            serialize(&document, &SerializeOptions::default()),
            "<p>a</p><p>\u{200B}</p>"
        );
    }

    #[test]
    fn test_pre_line_separators() {
        let mut attributes = Attributes::new();
        attributes.paragraph.push(ParagraphProperty::Pre(None));
        let text = StyledText::with_attributes("a\u{2028}b", attributes);
        assert_eq!(html(&text), "<pre>a\nb</pre>");
    }

    #[test]
    fn test_multiple_html_roots_are_wrapped() {
        let attributes = Attributes {
            attachment: Some(Attachment::Html {
                tag: "b".to_string(),
                raw: "<b>x</b><i>y</i>".to_string(),
            }),
            ..Attributes::default()
        };
        let text = StyledText::with_attributes("\u{FFFC}", attributes);
        assert_eq!(html(&text), "<p><span><b>x</b><i>y</i></span></p>");
    }
}
