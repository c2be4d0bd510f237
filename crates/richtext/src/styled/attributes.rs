//! Formatting metadata carried by styled-text runs.

use indexmap::IndexMap;
use richtext_core::{Attribute, CssProperty, Document, ElementData, NodeId};

/// A copy of an element's name and attributes, detached from any tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementSnapshot {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl ElementSnapshot {
    pub fn new(name: &str, attributes: Vec<Attribute>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes,
        }
    }

    pub fn from_element(element: &ElementData) -> Self {
        Self::new(&element.name, element.attributes.clone())
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Create a detached element in `document` from this snapshot
    pub fn create(&self, document: &mut Document) -> NodeId {
        document.create_element_with(&self.name, self.attributes.clone())
    }
}

/// The HTML that produced a style, kept so that it can be written back unchanged
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HtmlRepresentation {
    Attribute(Attribute),
    Element(ElementSnapshot),
    InlineCss(CssProperty),
}

impl HtmlRepresentation {
    pub fn element(&self) -> Option<&ElementSnapshot> {
        match self {
            HtmlRepresentation::Element(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// Character-level styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CharacterStyle {
    Bold,
    Italic,
    Strikethrough,
    Underline,
    Code,
    Cite,
}

impl CharacterStyle {
    /// Element written for the style when no representation was captured
    pub fn default_element_name(self) -> &'static str {
        match self {
            CharacterStyle::Bold => "strong",
            CharacterStyle::Italic => "em",
            CharacterStyle::Strikethrough => "strike",
            CharacterStyle::Underline => "u",
            CharacterStyle::Code => "code",
            CharacterStyle::Cite => "cite",
        }
    }

    /// Style applied by an element name, if any
    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "b" | "strong" => Some(CharacterStyle::Bold),
            "i" | "em" => Some(CharacterStyle::Italic),
            "s" | "strike" | "del" => Some(CharacterStyle::Strikethrough),
            "u" => Some(CharacterStyle::Underline),
            "code" => Some(CharacterStyle::Code),
            "cite" => Some(CharacterStyle::Cite),
            _ => None,
        }
    }

    /// Style applied by an inline CSS declaration, if any
    pub fn from_css(property: &CssProperty) -> Option<Self> {
        let value = property.value.to_ascii_lowercase();
        match property.name.to_ascii_lowercase().as_str() {
            "font-weight" if value == "bold" || value == "bolder" || value == "700" => {
                Some(CharacterStyle::Bold)
            }
            "font-style" if value == "italic" => Some(CharacterStyle::Italic),
            "text-decoration" | "text-decoration-line" => {
                if value.contains("underline") {
                    Some(CharacterStyle::Underline)
                } else if value.contains("line-through") {
                    Some(CharacterStyle::Strikethrough)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// A hyperlink on a run of characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub href: String,
    pub representation: Option<ElementSnapshot>,
}

impl Link {
    pub fn new(href: &str) -> Self {
        Self {
            href: href.to_string(),
            representation: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListStyle {
    Ordered,
    Unordered,
}

impl ListStyle {
    /// Marker shown in front of the `number`-th item (1-based)
    pub fn marker_text(self, number: usize) -> String {
        match self {
            ListStyle::Ordered => format!("{number}.\t"),
            ListStyle::Unordered => "\u{2022}\t\t".to_string(),
        }
    }

    pub fn element_name(self) -> &'static str {
        match self {
            ListStyle::Ordered => "ol",
            ListStyle::Unordered => "ul",
        }
    }
}

/// Block-level markers of a paragraph, outermost first
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParagraphProperty {
    Blockquote(Option<ElementSnapshot>),
    TextList {
        style: ListStyle,
        representation: Option<ElementSnapshot>,
    },
    HtmlParagraph(Option<ElementSnapshot>),
    /// Level 0 means "not a heading" and is never written out
    Header {
        level: u8,
        representation: Option<ElementSnapshot>,
    },
    Figure(Option<ElementSnapshot>),
    Figcaption(Option<ElementSnapshot>),
    Cite(Option<ElementSnapshot>),
    Pre(Option<ElementSnapshot>),
    HtmlLi(Option<ElementSnapshot>),
    Div(Option<ElementSnapshot>),
}

impl ParagraphProperty {
    /// Property for a block element, with its snapshot
    pub fn from_element(element: &ElementData) -> Option<Self> {
        let snapshot = Some(ElementSnapshot::from_element(element));
        let property = match element.name.as_str() {
            "blockquote" => ParagraphProperty::Blockquote(snapshot),
            "ul" => ParagraphProperty::TextList {
                style: ListStyle::Unordered,
                representation: snapshot,
            },
            "ol" => ParagraphProperty::TextList {
                style: ListStyle::Ordered,
                representation: snapshot,
            },
            "li" => ParagraphProperty::HtmlLi(snapshot),
            "p" => ParagraphProperty::HtmlParagraph(snapshot),
            "pre" => ParagraphProperty::Pre(snapshot),
            "div" => ParagraphProperty::Div(snapshot),
            "figure" => ParagraphProperty::Figure(snapshot),
            "figcaption" => ParagraphProperty::Figcaption(snapshot),
            name => {
                let level = richtext_core::elements::heading_level(name)?;
                ParagraphProperty::Header {
                    level,
                    representation: snapshot,
                }
            }
        };
        Some(property)
    }

    pub fn representation(&self) -> Option<&ElementSnapshot> {
        match self {
            ParagraphProperty::Blockquote(r)
            | ParagraphProperty::HtmlParagraph(r)
            | ParagraphProperty::Figure(r)
            | ParagraphProperty::Figcaption(r)
            | ParagraphProperty::Cite(r)
            | ParagraphProperty::Pre(r)
            | ParagraphProperty::HtmlLi(r)
            | ParagraphProperty::Div(r) => r.as_ref(),
            ParagraphProperty::TextList { representation, .. }
            | ParagraphProperty::Header { representation, .. } => representation.as_ref(),
        }
    }

    /// Element written when no representation was captured
    pub fn default_element_name(&self) -> &'static str {
        match self {
            ParagraphProperty::Blockquote(_) => "blockquote",
            ParagraphProperty::TextList { style, .. } => style.element_name(),
            ParagraphProperty::HtmlParagraph(_) => "p",
            ParagraphProperty::Header { level, .. } => {
                richtext_core::elements::HEADINGS[(*level).clamp(1, 6) as usize - 1]
            }
            ParagraphProperty::Figure(_) => "figure",
            ParagraphProperty::Figcaption(_) => "figcaption",
            ParagraphProperty::Cite(_) => "cite",
            ParagraphProperty::Pre(_) => "pre",
            ParagraphProperty::HtmlLi(_) => "li",
            ParagraphProperty::Div(_) => "div",
        }
    }

    /// Element this property is written as.
    ///
    /// A representation is only used if it still names an element of the same kind, so
    /// that changing a list's style or a heading's level wins over the captured markup.
    pub fn element(&self) -> ElementSnapshot {
        let default = self.default_element_name();
        match self.representation() {
            Some(r) if r.name == default || !self.is_fixed_name() => r.clone(),
            _ => ElementSnapshot::new(default, Vec::new()),
        }
    }

    // Lists and headings encode their style in the element name.
    fn is_fixed_name(&self) -> bool {
        matches!(
            self,
            ParagraphProperty::TextList { .. } | ParagraphProperty::Header { .. }
        )
    }

    /// Compare the kind of two properties, ignoring styles and representations
    pub fn same_kind(&self, other: &ParagraphProperty) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ParagraphProperty::TextList { .. })
    }

    pub fn is_pre(&self) -> bool {
        matches!(self, ParagraphProperty::Pre(_))
    }
}

/// Objects represented in the text by a single placeholder character
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attachment {
    Comment(String),
    /// Raw markup of an element the converters do not model
    Html { tag: String, raw: String },
    /// A void or media element such as `img` or `hr`
    Element(ElementSnapshot),
    LineBreak(ElementSnapshot),
}

/// Everything that applies to a run of characters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    /// Character styles, in the order they were applied
    pub character: IndexMap<CharacterStyle, Option<HtmlRepresentation>>,
    pub link: Option<Link>,
    /// Block markers, outermost first
    pub paragraph: Vec<ParagraphProperty>,
    /// Elements without a style of their own, outermost first
    pub unsupported: Vec<ElementSnapshot>,
    pub attachment: Option<Attachment>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_style(&self, style: CharacterStyle) -> bool {
        self.character.contains_key(&style)
    }

    pub fn add_style(&mut self, style: CharacterStyle, representation: Option<HtmlRepresentation>) {
        self.character.insert(style, representation);
    }

    pub fn remove_style(&mut self, style: CharacterStyle) {
        self.character.shift_remove(&style);
    }

    pub fn with_style(mut self, style: CharacterStyle) -> Self {
        self.add_style(style, None);
        self
    }

    pub fn with_link(mut self, href: &str) -> Self {
        self.link = Some(Link::new(href));
        self
    }

    pub fn with_paragraph(mut self, property: ParagraphProperty) -> Self {
        self.paragraph.push(property);
        self
    }

    /// Number of lists this paragraph is nested in
    pub fn list_depth(&self) -> usize {
        self.paragraph.iter().filter(|p| p.is_list()).count()
    }

    pub fn is_in_pre(&self) -> bool {
        self.paragraph.iter().any(ParagraphProperty::is_pre)
    }

    /// Copy used for newly typed text: attachments and unsupported markup are not
    /// inherited.
    pub fn for_typing(&self) -> Self {
        Self {
            character: self.character.clone(),
            link: self.link.clone(),
            paragraph: self.paragraph.clone(),
            unsupported: Vec::new(),
            attachment: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use richtext_core::attrs;

    #[test]
    fn test_character_style_from_element_name() {
        assert_eq!(CharacterStyle::from_element_name("strong"), Some(CharacterStyle::Bold));
        assert_eq!(CharacterStyle::from_element_name("del"), Some(CharacterStyle::Strikethrough));
        assert_eq!(CharacterStyle::from_element_name("span"), None);
    }

    #[test]
    fn test_character_style_from_css() {
        let bold = CssProperty::new("font-weight", "bold");
        let underline = CssProperty::new("text-decoration", "underline");
        let color = CssProperty::new("color", "red");
        assert_eq!(CharacterStyle::from_css(&bold), Some(CharacterStyle::Bold));
        assert_eq!(CharacterStyle::from_css(&underline), Some(CharacterStyle::Underline));
        assert_eq!(CharacterStyle::from_css(&color), None);
    }

    #[test]
    fn test_marker_text() {
        assert_eq!(ListStyle::Ordered.marker_text(3), "3.\t");
        assert_eq!(ListStyle::Unordered.marker_text(3), "\u{2022}\t\t");
    }

    #[test]
    fn test_paragraph_property_element() {
        let element = ElementData::with_attributes("ol", attrs(&[("start", "3")]));
        let property = ParagraphProperty::from_element(&element).unwrap();
        assert_eq!(property.element(), ElementSnapshot::new("ol", attrs(&[("start", "3")])));

        let restyled = ParagraphProperty::TextList {
            style: ListStyle::Unordered,
            representation: property.representation().cloned(),
        };
        assert_eq!(restyled.element(), ElementSnapshot::new("ul", vec![]));
    }

    #[test]
    fn test_heading_property() {
        let element = ElementData::with_attributes("h2", attrs(&[("class", "x")]));
        let property = ParagraphProperty::from_element(&element).unwrap();
        assert!(matches!(property, ParagraphProperty::Header { level: 2, .. }));
        assert_eq!(property.element().name, "h2");
        assert!(ParagraphProperty::from_element(&ElementData::new("span")).is_none());
    }

    #[test]
    fn test_attributes_equality_ignores_style_order() {
        let a = Attributes::new().with_style(CharacterStyle::Bold).with_style(CharacterStyle::Italic);
        let b = Attributes::new().with_style(CharacterStyle::Italic).with_style(CharacterStyle::Bold);
        assert_eq!(a, b);
    }

    #[test]
    fn test_for_typing_drops_unsupported() {
        let mut attributes = Attributes::new().with_style(CharacterStyle::Bold);
        attributes.unsupported.push(ElementSnapshot::new("span", vec![]));
        attributes.attachment = Some(Attachment::Comment("c".to_string()));
        let typing = attributes.for_typing();
        assert!(typing.has_style(CharacterStyle::Bold));
        assert!(typing.unsupported.is_empty());
        assert!(typing.attachment.is_none());
    }
}
