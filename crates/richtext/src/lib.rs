//! # richtext
//!
//! Convert HTML to styled text and back.
//!
//! HTML is parsed into a [`richtext_core::Document`], converted into [`StyledText`] (a
//! flat string with runs of formatting attributes) for editing, and converted back into
//! a document that serializes to HTML. Markup the editor has no formatter for travels
//! through the styled text untouched, so unknown elements, comments, scripts and
//! attributes survive a round trip.
//!
//! ## Design
//!
//! - **Styled text**: one `\n` per paragraph boundary, U+2028 for `<br>` and U+FFFC for
//!   attachments such as images, comments and raw HTML blocks
//! - **Formatters**: a fixed registry of character and paragraph formatters that apply,
//!   remove and toggle attributes over a range
//! - **Processors**: string passes (shortcodes) around parsing and serialization, and
//!   tree passes over the parsed document
//!
//! ## Example
//!
//! ```rust
//! use richtext::{FormatIdentifier, RichTextService};
//!
//! let service = RichTextService::new();
//! let mut text = service.html_to_styled_text("<p>Hello <b>World</b></p>");
//! assert_eq!(text.as_str(), "Hello World");
//!
//! service
//!     .formatters()
//!     .get(FormatIdentifier::Italic)
//!     .apply(&mut text, 0..5);
//! assert_eq!(
//!     service.styled_text_to_html(&text, false),
//!     "<p><em>Hello</em> <b>World</b></p>"
//! );
//! ```

pub mod convert;
pub mod formatter;
mod parser;
pub mod processors;
mod service;
pub mod styled;
mod utilities;

pub use convert::{to_dom, to_styled_text};
pub use formatter::{FormatIdentifier, Formatter, Formatters};
pub use parser::{first_element_name, parse_html};
pub use service::{caption_shortcodes, ConverterOptions, RichTextService};
pub use styled::{
    Attachment, Attributes, CharacterStyle, ElementSnapshot, HtmlRepresentation, Link,
    ListStyle, ParagraphProperty, Run, StyledText,
};
pub use utilities::*;

/// Error type for richtext operations
#[derive(Debug, thiserror::Error)]
pub enum RichTextError {
    #[error("Invalid shortcode tag: {0}")]
    InvalidShortcodeTag(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, RichTextError>;
