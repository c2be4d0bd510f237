//! HTML parsing support.
//!
//! Parsing never fails: malformed markup is recovered into the closest sensible tree.
//! Attribute order, unknown elements, comments, CDATA sections and raw `script` /
//! `style` content are all kept so that serializing the tree reproduces the input.

mod tokenizer;
mod tree_builder;

use richtext_core::{Document, ElementData};

/// Parse an HTML fragment into a [`Document`].
///
/// # Example
///
/// ```rust
/// use richtext::parse_html;
/// use richtext_core::{serialize, SerializeOptions};
///
/// let document = parse_html("<p>Hello <b>World</b></p>");
/// assert_eq!(serialize(&document, &SerializeOptions::default()), "<p>Hello <b>World</b></p>");
/// ```
pub fn parse_html(html: &str) -> Document {
    tree_builder::TreeBuilder::new().build(tokenizer::tokenize(html))
}

/// Name of the first element in an HTML snippet, lowercased.
///
/// Works on incomplete markup such as `"<span"`.
pub fn first_element_name(html: &str) -> Option<String> {
    tokenizer::first_tag_name(html)
}

/// Parse the start tag whose `<` is at byte `start`.
///
/// Returns the element, whether the tag was written self-closing and the byte offset
/// just past the tag.
pub(crate) fn parse_start_tag(html: &str, start: usize) -> Option<(ElementData, bool, usize)> {
    if html.as_bytes().get(start) != Some(&b'<') {
        return None;
    }
    match tokenizer::start_tag(html, start) {
        (
            tokenizer::Token::StartTag {
                name,
                attributes,
                self_closing,
            },
            end,
        ) if !name.is_empty() => Some((ElementData::with_attributes(&name, attributes), self_closing, end)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use richtext_core::{serialize, NodeData, SerializeOptions};

    #[test]
    fn test_parse_keeps_attribute_order() {
        let html = r#"<img src="x.jpg" class="alignnone" alt="Alt" title="Title">"#;
        let document = parse_html(html);
        assert_eq!(serialize(&document, &SerializeOptions::default()), html);
    }

    #[test]
    fn test_parse_start_tag() {
        let html = "x<div data-shortcode=\"caption\" id='1'>y";
        let (element, self_closing, end) = parse_start_tag(html, 1).unwrap();
        assert_eq!(element.name, "div");
        assert_eq!(element.attribute_value("id").as_deref(), Some("1"));
        assert!(!self_closing);
        assert_eq!(&html[end..], "y");
        assert!(parse_start_tag(html, 0).is_none());
    }

    #[test]
    fn test_parse_empty() {
        let document = parse_html("");
        assert!(document.children(document.root()).is_empty());
    }

    #[test]
    fn test_parse_unknown_elements() {
        let html = "<custom-tag data-x=\"1\"><x:y>text</x:y></custom-tag>";
        let document = parse_html(html);
        assert_eq!(serialize(&document, &SerializeOptions::default()), html);
    }

    #[test]
    fn test_parse_text_is_decoded() {
        let document = parse_html("a &amp; b &#128512;");
        let child = document.children(document.root())[0];
        assert_eq!(document.data(child), &NodeData::Text("a & b \u{1F600}".to_string()));
    }

    #[test]
    fn test_first_element_name() {
        assert_eq!(first_element_name("<span"), Some("span".to_string()));
        assert_eq!(first_element_name("<IMG src=x>"), Some("img".to_string()));
        assert_eq!(first_element_name("plain"), None);
    }
}
