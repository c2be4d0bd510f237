//! Control characters and element tables used by the converters.

/// Separates paragraphs in styled text
pub const PARAGRAPH_SEPARATOR: char = '\n';

/// Line break inside a paragraph (`<br>`)
pub const LINE_SEPARATOR: char = '\u{2028}';

/// Placeholder for an attachment: comments, images, rules, raw HTML
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// Placeholder content for blocks that would otherwise be empty, the usual
/// `trailing_empty_line_replacement`
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Elements that become element attachments (one object replacement character)
pub const ATTACHMENT_ELEMENTS: &[&str] = &["hr", "img", "video", "audio", "embed", "source"];

/// Elements that are carried as raw HTML attachments
pub const RAW_HTML_ELEMENTS: &[&str] = &[
    "script", "style", "table", "iframe", "object", "noscript", "form", "dl", "address",
    "fieldset",
];

/// Check if an element is converted to a single attachment character
pub fn is_attachment_element(tag: &str) -> bool {
    ATTACHMENT_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

/// Check if an element is kept as raw HTML
pub fn is_raw_html_element(tag: &str) -> bool {
    RAW_HTML_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_tables() {
        assert!(is_attachment_element("IMG"));
        assert!(!is_attachment_element("p"));
        assert!(is_raw_html_element("script"));
        assert!(is_raw_html_element("table"));
        assert!(!is_raw_html_element("div"));
    }
}
