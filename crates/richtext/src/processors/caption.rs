//! Built-in `[caption]` shortcode handling.
//!
//! Two pairs of processors are provided. The div pair keeps every shortcode argument in
//! `data-shortcode*` attributes so the shortcode comes back byte for byte:
//!
//! ```text
//! [caption id="1" align="left"]<img src="a.jpg">Text[/caption]
//!     ⇅
//! <div data-shortcode="caption" id="1" align="left"><img src="a.jpg">Text</div>
//! ```
//!
//! The figure pair produces semantic markup instead:
//!
//! ```text
//! [caption]<img src=".">Text[/caption]
//!     ⇅
//! <figure><img src="."><figcaption>Text</figcaption></figure>
//! ```

use richtext_core::{serialize_children, serialize_node, set_attribute, Attribute, SerializeOptions};

use super::shortcode::{serialize_shortcode_attributes, Shortcode, ShortcodeAttribute, ShortcodeProcessor};
use super::{HtmlElement, HtmlElementProcessor, HtmlProcessor, TagKind};
use crate::parser::parse_html;
use crate::Result;

pub const CAPTION: &str = "caption";

const SHORTCODE: &str = "data-shortcode";
const SHORTCODE_TYPE: &str = "data-shortcode-type";
const SHORTCODE_ARG: &str = "data-shortcode-arg-";

/// `[caption ...]...[/caption]` to `<div data-shortcode="caption" ...>...</div>`.
///
/// Named arguments become attributes of the div, unnamed ones become
/// `data-shortcode-arg-1`, `data-shortcode-arg-2`... Shortcodes that are not closed get
/// `data-shortcode-type="single"` or `"self-closing"`.
pub struct CaptionShortcodeInputProcessor {
    shortcodes: ShortcodeProcessor,
}

impl CaptionShortcodeInputProcessor {
    pub fn new() -> Result<Self> {
        Self::for_tag(CAPTION)
    }

    /// The same conversion for another shortcode
    pub fn for_tag(tag: &str) -> Result<Self> {
        Ok(Self {
            shortcodes: ShortcodeProcessor::new(tag, |shortcode| Some(shortcode_to_div(shortcode)))?,
        })
    }
}

impl HtmlProcessor for CaptionShortcodeInputProcessor {
    fn process(&self, html: &str) -> String {
        self.shortcodes.process(html)
    }
}

fn shortcode_to_div(shortcode: &Shortcode) -> String {
    let mut attributes = vec![Attribute::new(SHORTCODE, &shortcode.tag)];
    let mut unnamed = 0;
    for attribute in &shortcode.attributes {
        match attribute.value_str() {
            Some(value) => set_attribute(&mut attributes, Attribute::new(&attribute.key, value)),
            None => {
                unnamed += 1;
                attributes.push(Attribute::new(&format!("{SHORTCODE_ARG}{unnamed}"), &attribute.key));
            }
        }
    }
    match shortcode.kind {
        TagKind::Closed => {}
        TagKind::Single => attributes.push(Attribute::new(SHORTCODE_TYPE, "single")),
        TagKind::SelfClosing => attributes.push(Attribute::new(SHORTCODE_TYPE, "self-closing")),
    }

    let attributes: Vec<String> = attributes.iter().map(Attribute::to_html).collect();
    format!(
        "<div {}>{}</div>",
        attributes.join(" "),
        shortcode.content.as_deref().unwrap_or("")
    )
}

/// The inverse of [`CaptionShortcodeInputProcessor`]. Divs without a matching
/// `data-shortcode` attribute are left alone.
pub struct CaptionShortcodeOutputProcessor {
    elements: HtmlElementProcessor,
}

impl CaptionShortcodeOutputProcessor {
    pub fn new() -> Self {
        Self::for_tag(CAPTION)
    }

    pub fn for_tag(tag: &str) -> Self {
        let tag = tag.to_string();
        Self {
            elements: HtmlElementProcessor::new("div", move |element| div_to_shortcode(&tag, element)),
        }
    }
}

impl Default for CaptionShortcodeOutputProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlProcessor for CaptionShortcodeOutputProcessor {
    fn process(&self, html: &str) -> String {
        self.elements.process(html)
    }
}

fn div_to_shortcode(tag: &str, element: &HtmlElement) -> Option<String> {
    if element.attribute(SHORTCODE) != Some(tag) {
        return None;
    }

    let mut attributes = Vec::new();
    for attribute in &element.attributes {
        if attribute.name == SHORTCODE || attribute.name == SHORTCODE_TYPE {
            continue;
        }
        let value = attribute.value.to_value_string().unwrap_or_default();
        if attribute.name.starts_with(SHORTCODE_ARG) {
            let value = if value.contains(char::is_whitespace) {
                format!("\"{value}\"")
            } else {
                value
            };
            attributes.push(ShortcodeAttribute::unnamed(&value));
        } else {
            attributes.push(ShortcodeAttribute::new(&attribute.name, &value));
        }
    }

    let opening = match serialize_shortcode_attributes(&attributes) {
        arguments if arguments.is_empty() => tag.to_string(),
        arguments => format!("{tag} {arguments}"),
    };
    Some(match element.attribute(SHORTCODE_TYPE) {
        Some("self-closing") => format!("[{opening} /]"),
        Some("single") => format!("[{opening}]"),
        _ => format!(
            "[{opening}]{}[/{tag}]",
            element.content.as_deref().unwrap_or("")
        ),
    })
}

/// `[caption]<img ...>Text[/caption]` to `<figure><img ...><figcaption>Text</figcaption></figure>`.
///
/// The shortcode's named arguments become attributes of the figure. A caption that has no
/// image, or nothing besides the image, is left unchanged.
pub struct CaptionFigureInputProcessor {
    shortcodes: ShortcodeProcessor,
}

impl CaptionFigureInputProcessor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            shortcodes: ShortcodeProcessor::new(CAPTION, shortcode_to_figure)?,
        })
    }
}

impl HtmlProcessor for CaptionFigureInputProcessor {
    fn process(&self, html: &str) -> String {
        self.shortcodes.process(html)
    }
}

fn shortcode_to_figure(shortcode: &Shortcode) -> Option<String> {
    let mut document = parse_html(shortcode.content.as_deref()?);
    let root = document.root();
    let children = document.children(root).to_vec();
    let image = document.child_element(root, "img")?;
    if children.len() < 2 {
        return None;
    }

    let attributes: Vec<Attribute> = shortcode
        .attributes
        .iter()
        .filter_map(|a| a.value_str().map(|value| Attribute::new(&a.key, value)))
        .collect();
    let figure = document.create_element_with("figure", attributes);
    let figcaption = document.create_element("figcaption");
    for child in children {
        document.detach(child);
        if child != image {
            document.append_child(figcaption, child);
        }
    }
    document.append_child(figure, image);
    document.append_child(figure, figcaption);
    document.append_child(root, figure);

    Some(serialize_node(&document, figure, &SerializeOptions::default()))
}

/// The inverse of [`CaptionFigureInputProcessor`]: figures holding an image (or a linked
/// image) and a `figcaption` become `[caption]` shortcodes.
pub struct CaptionFigureOutputProcessor {
    elements: HtmlElementProcessor,
}

impl CaptionFigureOutputProcessor {
    pub fn new() -> Self {
        Self {
            elements: HtmlElementProcessor::new("figure", figure_to_shortcode),
        }
    }
}

impl Default for CaptionFigureOutputProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlProcessor for CaptionFigureOutputProcessor {
    fn process(&self, html: &str) -> String {
        self.elements.process(html)
    }
}

fn figure_to_shortcode(element: &HtmlElement) -> Option<String> {
    let document = parse_html(element.content.as_deref()?);
    let root = document.root();
    let media = document
        .child_element(root, "img")
        .or_else(|| document.child_element(root, "a"))?;
    let caption = document.child_element(root, "figcaption")?;

    let attributes: Vec<String> = element.attributes.iter().map(Attribute::to_html).collect();
    let opening = if attributes.is_empty() {
        CAPTION.to_string()
    } else {
        format!("{CAPTION} {}", attributes.join(" "))
    };
    let options = SerializeOptions::default();
    Some(format!(
        "[{opening}]{}{}[/{CAPTION}]",
        serialize_node(&document, media, &options),
        serialize_children(&document, caption, &options)
    ))
}
