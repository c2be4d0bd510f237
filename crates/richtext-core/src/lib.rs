//! richtext-core - HTML node tree and serialization
//!
//! This crate provides the node tree, attribute model, entity handling and HTML
//! serialization shared by the `richtext` parser and converters.
//!
//! # Architecture
//!
//! ```text
//! HTML String ──parse──▶ ┌──────────────┐
//!                        │              │
//!                        │   Document   │ ──serialize──▶ HTML String
//! Styled Text ─────────▶ │              │
//!                        └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use richtext_core::{serialize, Document, SerializeOptions};
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let p = doc.create_element("p");
//! let text = doc.create_text("Hello World");
//! doc.append_child(p, text);
//! doc.append_child(root, p);
//!
//! let html = serialize(&doc, &SerializeOptions::default());
//! assert_eq!(html, "<p>Hello World</p>");
//! ```

mod attribute;
mod dom;
pub mod elements;
mod entities;
mod options;
mod serialize;

pub use attribute::{css_to_string, parse_inline_css, set_attribute, Attribute, AttributeValue, CssProperty};
pub use dom::{attrs, Ancestors, Descendants, Document, ElementData, NodeData, NodeId};
pub use entities::{escape_attribute, escape_text, unescape};
pub use options::SerializeOptions;
pub use serialize::{serialize, serialize_children, serialize_node};
