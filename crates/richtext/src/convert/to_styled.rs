//! DOM → styled text.
//!
//! Walks the tree depth first. Inline elements add character styles, block elements push
//! paragraph properties, and every block boundary that follows content becomes one
//! paragraph separator carrying the properties of the paragraph it closes.

use log::trace;
use richtext_core::{elements, serialize_node, Document, ElementData, NodeData, NodeId, SerializeOptions};

use crate::service::ConverterOptions;
use crate::styled::{
    Attachment, Attributes, CharacterStyle, ElementSnapshot, HtmlRepresentation, Link,
    ParagraphProperty, StyledText,
};
use crate::utilities::{
    is_attachment_element, is_raw_html_element, LINE_SEPARATOR, OBJECT_REPLACEMENT,
    PARAGRAPH_SEPARATOR,
};

/// Convert a document into styled text
pub fn to_styled_text(document: &Document, options: &ConverterOptions) -> StyledText {
    let mut converter = DomToStyled {
        document,
        output: StyledText::new(),
        pending: None,
        line_has_content: false,
        empty_blocks: 0,
    };
    let root = document.root();
    for child in document.children(root) {
        converter.node(*child, &options.default_attributes);
    }
    converter.finish()
}

// A paragraph separator that is written once more content follows.
struct Pending {
    attributes: Attributes,
    from_empty_block: bool,
}

struct DomToStyled<'a> {
    document: &'a Document,
    output: StyledText,
    pending: Option<Pending>,
    line_has_content: bool,
    /// Counts empty blocks so that nested empty blocks produce one paragraph
    empty_blocks: usize,
}

impl DomToStyled<'_> {
    fn finish(mut self) -> StyledText {
        if let Some(pending) = self.pending.take() {
            if pending.from_empty_block {
                self.output
                    .push(&PARAGRAPH_SEPARATOR.to_string(), pending.attributes);
            }
        }
        self.output
    }

    fn emit(&mut self, text: &str, attributes: Attributes) {
        if let Some(pending) = self.pending.take() {
            self.output
                .push(&PARAGRAPH_SEPARATOR.to_string(), pending.attributes);
        }
        self.output.push(text, attributes);
        self.line_has_content = true;
    }

    fn emit_attachment(&mut self, attachment: Attachment, attributes: &Attributes) {
        let mut attributes = attributes.clone();
        attributes.attachment = Some(attachment);
        self.emit(&OBJECT_REPLACEMENT.to_string(), attributes);
    }

    fn node(&mut self, id: NodeId, attributes: &Attributes) {
        let document = self.document;
        match document.data(id) {
            NodeData::Root => {}
            NodeData::Element(element) => self.element(id, element, attributes),
            NodeData::Text(text) => self.text(id, text, attributes),
            NodeData::Comment(text) => {
                self.emit_attachment(Attachment::Comment(text.clone()), attributes)
            }
            NodeData::CData(_) => self.raw_html(id, "", attributes),
        }
    }

    fn children(&mut self, id: NodeId, attributes: &Attributes) {
        let document = self.document;
        for child in document.children(id) {
            self.node(*child, attributes);
        }
    }

    fn raw_html(&mut self, id: NodeId, tag: &str, attributes: &Attributes) {
        let raw = serialize_node(self.document, id, &SerializeOptions::default());
        let attachment = Attachment::Html {
            tag: tag.to_string(),
            raw,
        };
        if elements::is_block(tag) || is_raw_html_element(tag) {
            self.block_attachment(attachment, attributes);
        } else {
            self.emit_attachment(attachment, attributes);
        }
    }

    // Outside of any block, a block-level attachment is a paragraph of its own.
    fn block_attachment(&mut self, attachment: Attachment, attributes: &Attributes) {
        if !attributes.paragraph.is_empty() {
            self.emit_attachment(attachment, attributes);
            return;
        }
        if self.line_has_content && self.pending.is_none() {
            self.pending = Some(Pending {
                attributes: paragraph_only(attributes),
                from_empty_block: false,
            });
        }
        self.emit_attachment(attachment, attributes);
        self.pending = Some(Pending {
            attributes: paragraph_only(attributes),
            from_empty_block: false,
        });
        self.line_has_content = false;
    }

    fn element(&mut self, id: NodeId, element: &ElementData, attributes: &Attributes) {
        let name = element.name.as_str();
        let snapshot = ElementSnapshot::from_element(element);
        let has_children = !self.document.children(id).is_empty();

        if name == "br" {
            let mut attributes = attributes.clone();
            attributes.attachment = Some(Attachment::LineBreak(snapshot));
            self.emit(&LINE_SEPARATOR.to_string(), attributes);
            return;
        }
        if is_raw_html_element(name) {
            self.raw_html(id, name, attributes);
            return;
        }
        if is_attachment_element(name) {
            if has_children {
                self.raw_html(id, name, attributes);
            } else if elements::is_block(name) {
                self.block_attachment(Attachment::Element(snapshot), attributes);
            } else {
                self.emit_attachment(Attachment::Element(snapshot), attributes);
            }
            return;
        }

        let in_blockquote = self
            .document
            .parent(id)
            .is_some_and(|p| self.document.is_element_named(p, "blockquote"));
        if name == "cite" && in_blockquote {
            self.block(id, ParagraphProperty::Cite(Some(snapshot)), attributes);
            return;
        }
        if let Some(style) = CharacterStyle::from_element_name(name) {
            let mut inner = attributes.clone();
            inner.add_style(style, Some(HtmlRepresentation::Element(snapshot)));
            self.children(id, &inner);
            return;
        }
        if name == "a" {
            if let Some(href) = element.attribute_value("href") {
                let mut inner = attributes.clone();
                inner.link = Some(Link {
                    href,
                    representation: Some(snapshot),
                });
                self.children(id, &inner);
                return;
            }
        }
        if let Some(property) = ParagraphProperty::from_element(element) {
            self.block(id, property, attributes);
            return;
        }
        if element.is_block_level() || !has_children {
            self.raw_html(id, name, attributes);
            return;
        }

        // Inline element without a style of its own.
        let mut inner = attributes.clone();
        if let Some(css) = element.attribute("style").and_then(|a| a.css()) {
            for property in css {
                if let Some(style) = CharacterStyle::from_css(property) {
                    if !inner.has_style(style) {
                        inner.add_style(style, Some(HtmlRepresentation::InlineCss(property.clone())));
                    }
                }
            }
        }
        inner.unsupported.push(snapshot);
        self.children(id, &inner);
    }

    fn block(&mut self, id: NodeId, property: ParagraphProperty, attributes: &Attributes) {
        if self.line_has_content && self.pending.is_none() {
            self.pending = Some(Pending {
                attributes: paragraph_only(attributes),
                from_empty_block: false,
            });
            self.line_has_content = false;
        }

        let mut inner = attributes.clone();
        inner.paragraph.push(property);
        let length_before = self.output.len();
        let empty_blocks_before = self.empty_blocks;

        self.children(id, &inner);

        if self.line_has_content {
            self.pending = Some(Pending {
                attributes: paragraph_only(&inner),
                from_empty_block: false,
            });
            self.line_has_content = false;
        } else if self.output.len() == length_before && self.empty_blocks == empty_blocks_before {
            trace!("empty block becomes an empty paragraph");
            if let Some(pending) = self.pending.take() {
                self.output
                    .push(&PARAGRAPH_SEPARATOR.to_string(), pending.attributes);
            }
            self.pending = Some(Pending {
                attributes: paragraph_only(&inner),
                from_empty_block: true,
            });
            self.empty_blocks += 1;
        }
    }

    fn text(&mut self, id: NodeId, text: &str, attributes: &Attributes) {
        if attributes.is_in_pre() {
            let text = text.replace('\n', &LINE_SEPARATOR.to_string());
            self.emit(&text, attributes.clone());
            return;
        }

        let previous = self.document.previous_sibling(id);
        let next = self.document.next_sibling(id);
        let after_block = self.borders_block(previous, id);
        let before_block = self.borders_block(next, id);

        let mut text = text;
        // Whitespace filling a block on its own is content.
        let alone = previous.is_none() && next.is_none() && !text.contains('\n');
        if after_block && before_block && text.trim().is_empty() && !alone {
            trace!("skipping whitespace between blocks");
            return;
        }
        if after_block {
            let trimmed = text.trim_start();
            if text[..text.len() - trimmed.len()].contains('\n') {
                text = trimmed;
            }
        }
        if before_block {
            let trimmed = text.trim_end();
            if text[trimmed.len()..].contains('\n') {
                text = trimmed;
            }
        }
        if text.is_empty() {
            return;
        }
        self.emit(&text.replace('\n', " "), attributes.clone());
    }

    // Whether the given sibling of `id` is a block, or `id` is at the edge of a block
    // (or of the root) when there is no sibling.
    fn borders_block(&self, sibling: Option<NodeId>, id: NodeId) -> bool {
        match sibling {
            Some(sibling) => self.document.is_block_level(sibling),
            None => match self.document.parent(id) {
                Some(parent) => {
                    matches!(self.document.data(parent), NodeData::Root)
                        || self.document.is_block_level(parent)
                }
                None => true,
            },
        }
    }
}

// Separators only carry paragraph properties.
fn paragraph_only(attributes: &Attributes) -> Attributes {
    Attributes {
        paragraph: attributes.paragraph.clone(),
        ..Attributes::default()
    }
}
