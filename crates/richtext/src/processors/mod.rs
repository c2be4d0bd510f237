//! Pre and post processing passes.
//!
//! [`HtmlProcessor`]s rewrite raw HTML strings: before parsing on the way in and after
//! serialization on the way out. [`TreeProcessor`]s rewrite the parsed node tree.

mod caption;
mod html_element;
mod paragraphs;
mod shortcode;

pub use caption::{
    CaptionFigureInputProcessor, CaptionFigureOutputProcessor, CaptionShortcodeInputProcessor,
    CaptionShortcodeOutputProcessor, CAPTION,
};
pub use html_element::{HtmlElement, HtmlElementProcessor, HtmlElementRewriter};
pub use paragraphs::ParagraphRestorer;
pub use shortcode::{
    parse_shortcode_attributes, serialize_shortcode_attributes, Shortcode, ShortcodeAttribute,
    ShortcodeAttributeValue, ShortcodeProcessor, ShortcodeRewriter,
};

use richtext_core::Document;

/// How a shortcode or element occurrence was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `[tag /]` or `<tag />`
    SelfClosing,
    /// An opening tag with a matching closing tag
    Closed,
    /// An opening tag that is never closed
    Single,
}

/// A pass over raw HTML
pub trait HtmlProcessor: Send + Sync {
    fn process(&self, html: &str) -> String;
}

/// A pass over a parsed tree, editing it in place
pub trait TreeProcessor: Send + Sync {
    fn process(&self, document: &mut Document);
}

impl<F> HtmlProcessor for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn process(&self, html: &str) -> String {
        self(html)
    }
}

impl<F> TreeProcessor for F
where
    F: Fn(&mut Document) + Send + Sync,
{
    fn process(&self, document: &mut Document) {
        self(document)
    }
}
