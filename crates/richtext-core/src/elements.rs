//! Element name tables used by the parser, serializer and converters.

/// Block-level HTML elements
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "blockquote", "dd", "div", "dl", "dt", "fieldset", "figcaption", "figure",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "noscript", "ol", "p", "pre",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Void (self-closing) HTML elements
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is raw text and never markup
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Block elements that can be merged together when they are siblings
pub const MERGEABLE_BLOCK_ELEMENTS: &[&str] = &[
    "blockquote", "div", "figure", "figcaption", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
    "li", "ol", "ul", "p", "pre",
];

/// Style elements that can be merged together when they are siblings
pub const MERGEABLE_STYLE_ELEMENTS: &[&str] =
    &["i", "em", "b", "strong", "strike", "u", "code", "cite"];

/// Formatting elements the parser closes and reopens on mismatched end tags
pub const FORMATTING_ELEMENTS: &[&str] = &[
    "a", "b", "big", "code", "em", "font", "i", "s", "small", "strike", "strong", "tt", "u",
    "del", "cite", "span", "sub", "sup",
];

/// Heading element names, indexed by level - 1
pub const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Check if a tag is a block-level element
pub fn is_block(tag: &str) -> bool {
    contains_ignore_case(BLOCK_ELEMENTS, tag)
}

/// Check if a tag is a void element
pub fn is_void(tag: &str) -> bool {
    contains_ignore_case(VOID_ELEMENTS, tag)
}

/// Check if a tag holds raw text
pub fn is_raw_text(tag: &str) -> bool {
    contains_ignore_case(RAW_TEXT_ELEMENTS, tag)
}

pub fn is_mergeable_block(tag: &str) -> bool {
    contains_ignore_case(MERGEABLE_BLOCK_ELEMENTS, tag)
}

pub fn is_mergeable_style(tag: &str) -> bool {
    contains_ignore_case(MERGEABLE_STYLE_ELEMENTS, tag)
}

pub fn is_formatting(tag: &str) -> bool {
    contains_ignore_case(FORMATTING_ELEMENTS, tag)
}

/// Heading level (1-6) of a tag, if it is a heading
pub fn heading_level(tag: &str) -> Option<u8> {
    HEADINGS
        .iter()
        .position(|h| h.eq_ignore_ascii_case(tag))
        .map(|i| i as u8 + 1)
}

/// Names that render the same way as `tag`, `tag` first.
pub fn equivalent_names(tag: &str) -> &'static [&'static str] {
    match tag {
        "strong" => &["strong", "b"],
        "b" => &["b", "strong"],
        "em" => &["em", "i"],
        "i" => &["i", "em"],
        "s" => &["s", "strike", "del"],
        "del" => &["del", "strike", "s"],
        "strike" => &["strike", "del", "s"],
        _ => &[],
    }
}

/// Check if two tag names are equivalent
pub fn is_equivalent(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || equivalent_names(&a.to_ascii_lowercase()).contains(&b)
}

fn contains_ignore_case(list: &[&str], tag: &str) -> bool {
    list.iter().any(|t| t.eq_ignore_ascii_case(tag))
}
