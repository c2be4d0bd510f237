//! Builds a [`Document`] from the token stream.
//!
//! The builder keeps a stack of open elements and applies a small set of recovery rules
//! so that any input produces a tree:
//!
//! - a block start tag closes an open `<p>` that only has inline elements above it
//! - `<li>` closes an open `<li>` of the same list, a heading closes an open heading
//! - void and self-closing elements are never left open
//! - an end tag without a matching open element is ignored, `</p>` alone yields `<p></p>`
//! - an inline end tag that skips over open formatting elements reopens them after it

use log::debug;
use richtext_core::{elements, Attribute, Document, NodeData, NodeId};

use super::tokenizer::Token;

pub(crate) struct TreeBuilder {
    document: Document,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self {
            document: Document::new(),
            open: Vec::new(),
        }
    }

    pub(crate) fn build(mut self, tokens: Vec<Token>) -> Document {
        for token in tokens {
            match token {
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => self.start_tag(&name, attributes, self_closing),
                Token::EndTag(name) => self.end_tag(&name),
                Token::Text(text) | Token::RawText(text) => self.text(&text),
                Token::Comment(text) => {
                    let comment = self.document.create_comment(&text);
                    self.append(comment);
                }
                Token::CData(text) => {
                    let cdata = self.document.create_cdata(&text);
                    self.append(cdata);
                }
            }
        }
        if !self.open.is_empty() {
            debug!("{} element(s) left open at end of input", self.open.len());
        }
        self.document
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.document.root())
    }

    fn append(&mut self, node: NodeId) {
        let parent = self.current();
        self.document.append_child(parent, node);
    }

    fn open_name(&self, index: usize) -> &str {
        self.document.name(self.open[index]).unwrap_or_default()
    }

    fn start_tag(&mut self, name: &str, attributes: Vec<Attribute>, self_closing: bool) {
        if elements::is_block(name) {
            self.close_paragraph_before_block();
        }
        if name == "li" {
            self.close_matching_until(|n| n == "li", |n| n == "ul" || n == "ol");
        }
        if elements::heading_level(name).is_some() {
            self.close_matching_until(
                |n| elements::heading_level(n).is_some(),
                |n| elements::is_block(n) && elements::heading_level(n).is_none(),
            );
        }

        let element = self.document.create_element_with(name, attributes);
        self.append(element);
        if !self_closing && !elements::is_void(name) {
            self.open.push(element);
        }
    }

    fn close_paragraph_before_block(&mut self) {
        for index in (0..self.open.len()).rev() {
            let name = self.open_name(index);
            if name == "p" {
                debug!("implicitly closing <p> before block element");
                self.open.truncate(index);
                return;
            }
            if elements::is_block(name) {
                return;
            }
        }
    }

    /// Pop through the nearest open element matching `target`, unless an element matching
    /// `boundary` is found first.
    fn close_matching_until(&mut self, target: impl Fn(&str) -> bool, boundary: impl Fn(&str) -> bool) {
        for index in (0..self.open.len()).rev() {
            let name = self.open_name(index);
            if target(name) {
                debug!("implicitly closing <{name}>");
                self.open.truncate(index);
                return;
            }
            if boundary(name) {
                return;
            }
        }
    }

    fn end_tag(&mut self, name: &str) {
        if elements::is_void(name) {
            return;
        }

        if elements::is_block(name) || !elements::is_formatting(name) {
            match (0..self.open.len()).rev().find(|i| self.open_name(*i) == name) {
                Some(index) => self.open.truncate(index),
                None if name == "p" => {
                    debug!("</p> without open paragraph");
                    let p = self.document.create_element("p");
                    self.append(p);
                }
                None => debug!("ignoring unmatched </{name}>"),
            }
            return;
        }

        // Formatting end tags only match within the current block.
        let mut found = None;
        for index in (0..self.open.len()).rev() {
            let open_name = self.open_name(index);
            if open_name == name {
                found = Some(index);
                break;
            }
            if elements::is_block(open_name) {
                break;
            }
        }
        let Some(index) = found else {
            debug!("ignoring unmatched </{name}>");
            return;
        };

        let skipped: Vec<NodeId> = self.open.drain(index + 1..).collect();
        self.open.truncate(index);
        for node in skipped {
            let Some(element) = self.document.element(node) else {
                continue;
            };
            if !elements::is_formatting(&element.name) {
                continue;
            }
            debug!("reopening <{}> after </{name}>", element.name);
            let (name, attributes) = (element.name.clone(), element.attributes.clone());
            let reopened = self.document.create_element_with(&name, attributes);
            self.append(reopened);
            self.open.push(reopened);
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        if let Some(last) = self.document.last_child(parent) {
            if let NodeData::Text(existing) = self.document.data_mut(last) {
                existing.push_str(text);
                return;
            }
        }
        let node = self.document.create_text(text);
        self.document.append_child(parent, node);
    }
}
