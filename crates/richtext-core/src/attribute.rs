//! Element attributes and inline CSS.

use std::fmt;

use crate::entities::escape_attribute;

/// A single `name: value` declaration from a `style` attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssProperty {
    pub name: String,
    pub value: String,
}

impl CssProperty {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for CssProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Parse an inline style declaration list.
///
/// Declarations are split on `;`, then on the first `:`. Names and values are trimmed,
/// declarations without a colon or with an empty name are dropped. Order is kept.
pub fn parse_inline_css(css: &str) -> Vec<CssProperty> {
    css.split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(CssProperty::new(name, value.trim()))
        })
        .collect()
}

/// Serialize properties as `name: value; name: value`
pub fn css_to_string(properties: &[CssProperty]) -> String {
    properties
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Attribute value variants
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeValue {
    /// Attribute present without a value, e.g. `<input disabled>`
    None,
    String(String),
    InlineCss(Vec<CssProperty>),
}

impl AttributeValue {
    pub fn is_none(&self) -> bool {
        matches!(self, AttributeValue::None)
    }

    /// The value as it appears between the quotes, unescaped.
    pub fn to_value_string(&self) -> Option<String> {
        match self {
            AttributeValue::None => None,
            AttributeValue::String(s) => Some(s.clone()),
            AttributeValue::InlineCss(props) => Some(css_to_string(props)),
        }
    }
}

/// An HTML attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    /// Create an attribute with a string value.
    ///
    /// `style` values are parsed into inline CSS.
    pub fn new(name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        let value = if name == "style" {
            AttributeValue::InlineCss(parse_inline_css(value))
        } else {
            AttributeValue::String(value.to_string())
        };
        Self { name, value }
    }

    /// Create a value-less attribute
    pub fn flag(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value: AttributeValue::None,
        }
    }

    /// String view of the value, if any
    pub fn value_str(&self) -> Option<&str> {
        match &self.value {
            AttributeValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Inline CSS properties, if this is a parsed `style` attribute
    pub fn css(&self) -> Option<&[CssProperty]> {
        match &self.value {
            AttributeValue::InlineCss(props) => Some(props),
            _ => None,
        }
    }

    /// Serialize as it appears inside a start tag (without the leading space)
    pub fn to_html(&self) -> String {
        match self.value.to_value_string() {
            None => self.name.clone(),
            Some(value) => format!("{}=\"{}\"", self.name, escape_attribute(&value)),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// Insert or replace `attribute` in `attributes`, keeping the position of an existing
/// attribute with the same name.
pub fn set_attribute(attributes: &mut Vec<Attribute>, attribute: Attribute) {
    match attributes.iter_mut().find(|a| a.name == attribute.name) {
        Some(existing) => existing.value = attribute.value,
        None => attributes.push(attribute),
    }
}
