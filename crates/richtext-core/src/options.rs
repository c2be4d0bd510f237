//! Configuration options for HTML serialization

/// Options for HTML serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Break lines and indent around block-level elements
    pub prettify: bool,

    /// Indentation added per nesting level when prettifying
    pub indent: String,
}

impl SerializeOptions {
    /// Options for prettified output
    pub fn pretty() -> Self {
        Self {
            prettify: true,
            ..Default::default()
        }
    }
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            prettify: false,
            indent: "  ".to_string(),
        }
    }
}
