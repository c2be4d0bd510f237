//! HTML serialization
//!
//! Converts a node tree back into HTML text. Plain output adds nothing to the markup;
//! pretty output breaks lines around block-level elements.

use crate::dom::{Document, ElementData, NodeData, NodeId};
use crate::elements;
use crate::entities::escape_text;
use crate::options::SerializeOptions;

/// Serialize a whole document
pub fn serialize(document: &Document, options: &SerializeOptions) -> String {
    serialize_node(document, document.root(), options)
}

/// Serialize a node and its subtree
pub fn serialize_node(document: &Document, id: NodeId, options: &SerializeOptions) -> String {
    let mut out = String::with_capacity(256);
    let serializer = Serializer { document, options };
    serializer.node(id, 0, false, &mut out);

    if options.prettify {
        out.trim_matches('\n').to_string()
    } else {
        out
    }
}

/// Serialize the children of a node, without the node itself
pub fn serialize_children(document: &Document, id: NodeId, options: &SerializeOptions) -> String {
    let mut out = String::new();
    let serializer = Serializer { document, options };
    for child in document.children(id) {
        serializer.node(*child, 0, false, &mut out);
    }

    if options.prettify {
        out.trim_matches('\n').to_string()
    } else {
        out
    }
}

struct Serializer<'a> {
    document: &'a Document,
    options: &'a SerializeOptions,
}

impl Serializer<'_> {
    fn node(&self, id: NodeId, level: usize, raw: bool, out: &mut String) {
        match self.document.data(id) {
            NodeData::Root => {
                for child in self.document.children(id) {
                    self.node(*child, level, raw, out);
                }
            }
            NodeData::Element(element) => self.element(id, element, level, out),
            NodeData::Text(text) if raw => out.push_str(text),
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
        }
    }

    fn element(&self, id: NodeId, element: &ElementData, level: usize, out: &mut String) {
        let pretty = self.options.prettify;
        let block = element.is_block_level();

        if pretty && block {
            self.line_prefix(level, out);
        }
        out.push('<');
        out.push_str(&element.name);
        for attr in &element.attributes {
            out.push(' ');
            out.push_str(&attr.to_html());
        }
        out.push('>');

        if element.is_void() {
            return;
        }

        let raw = elements::is_raw_text(&element.name);
        for child in self.document.children(id) {
            self.node(*child, level + 1, raw, out);
        }

        if pretty && self.has_block_child(id) {
            self.line_prefix(level, out);
        }
        out.push_str("</");
        out.push_str(&element.name);
        out.push('>');

        if pretty && block && self.followed_by_inline(id) {
            out.push('\n');
        }
    }

    fn line_prefix(&self, level: usize, out: &mut String) {
        out.push('\n');
        for _ in 0..level {
            out.push_str(&self.options.indent);
        }
    }

    fn has_block_child(&self, id: NodeId) -> bool {
        self.document
            .children(id)
            .iter()
            .any(|c| self.document.element(*c).is_some_and(|e| e.is_block_level()))
    }

    fn followed_by_inline(&self, id: NodeId) -> bool {
        match self.document.next_sibling(id) {
            Some(next) => !self.document.element(next).is_some_and(|e| e.is_block_level()),
            None => false,
        }
    }
}
