//! WordPress-style shortcodes: `[tag attr="value"]content[/tag]`.

use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{HtmlProcessor, TagKind};
use crate::{Result, RichTextError};

/// Attribute grammar used by WordPress' `shortcode_parse_atts()`.
///
/// Groups: 1/2 name and double-quoted value, 3/4 name and single-quoted value, 5/6 name
/// and unquoted value, 7 quoted value without a name, 8 unquoted value without a name.
static ATTRIBUTES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"((?:\w|-)+)\s*=\s*"([^"]*)"(?:\s|$)"#,
        r#"|((?:\w|-)+)\s*=\s*'([^']*)'(?:\s|$)"#,
        r#"|((?:\w|-)+)\s*=\s*([^\s'"]+)(?:\s|$)"#,
        r#"|"([^"]*)"(?:\s|$)"#,
        r#"|(\S+)(?:\s|$)"#,
    ))
    .unwrap_or_else(|e| panic!("invalid shortcode attribute pattern: {e}"))
});

static TAG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w-]+$").unwrap_or_else(|e| panic!("invalid tag pattern: {e}")));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcodeAttributeValue {
    Nil,
    String(String),
}

/// A shortcode attribute. Unnamed attributes keep their text in `key` with a `Nil` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcodeAttribute {
    pub key: String,
    pub value: ShortcodeAttributeValue,
}

impl ShortcodeAttribute {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: ShortcodeAttributeValue::String(value.to_string()),
        }
    }

    pub fn unnamed(value: &str) -> Self {
        Self {
            key: value.to_string(),
            value: ShortcodeAttributeValue::Nil,
        }
    }

    pub fn is_unnamed(&self) -> bool {
        self.value == ShortcodeAttributeValue::Nil
    }

    pub fn value_str(&self) -> Option<&str> {
        match &self.value {
            ShortcodeAttributeValue::String(s) => Some(s),
            ShortcodeAttributeValue::Nil => None,
        }
    }
}

impl fmt::Display for ShortcodeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ShortcodeAttributeValue::Nil => f.write_str(&self.key),
            ShortcodeAttributeValue::String(value) => write!(f, "{}=\"{}\"", self.key, value),
        }
    }
}

/// Parse a shortcode attribute list, e.g. `id="1" align='left' width=300 bare`
pub fn parse_shortcode_attributes(text: &str) -> Vec<ShortcodeAttribute> {
    ATTRIBUTES
        .captures_iter(text)
        .filter_map(|caps| {
            let group = |i: usize| caps.get(i).map(|m| m.as_str());
            for (name, value) in [(1, 2), (3, 4), (5, 6)] {
                if let (Some(key), Some(value)) = (group(name), group(value)) {
                    return Some(ShortcodeAttribute::new(key, value));
                }
            }
            group(7).or(group(8)).map(ShortcodeAttribute::unnamed)
        })
        .collect()
}

/// Serialize attributes as they appear inside the opening bracket, space separated
pub fn serialize_shortcode_attributes(attributes: &[ShortcodeAttribute]) -> String {
    attributes
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// One occurrence of a shortcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcode {
    pub tag: String,
    pub kind: TagKind,
    pub attributes: Vec<ShortcodeAttribute>,
    /// Text between the opening and closing tags, for `Closed` shortcodes
    pub content: Option<String>,
}

impl Shortcode {
    /// Value of a named attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key && !a.is_unnamed())
            .and_then(|a| a.value_str())
    }

    pub fn unnamed_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|a| a.is_unnamed())
            .map(|a| a.key.as_str())
    }
}

pub type ShortcodeRewriter = Box<dyn Fn(&Shortcode) -> Option<String> + Send + Sync>;

/// Rewrites every occurrence of one shortcode tag.
///
/// A closing tag pairs with its nearest unclosed opening tag; openers that are never
/// closed are `Single`. Nested shortcodes are rewritten first, so a rewriter sees the
/// already rewritten content. Escaped shortcodes (`[[tag]]`) are left alone, as is
/// every occurrence the rewriter returns `None` for.
pub struct ShortcodeProcessor {
    tag: String,
    opener: Regex,
    closer: String,
    rewriter: ShortcodeRewriter,
}

#[derive(Debug, Clone)]
struct Opener {
    start: usize,
    end: usize,
    arguments: String,
    self_closing: bool,
}

#[derive(Debug, Clone)]
struct Occurrence {
    start: usize,
    end: usize,
    opener: Opener,
    /// (content start, content end) for closed shortcodes
    content: Option<(usize, usize)>,
}

impl ShortcodeProcessor {
    pub fn new<F>(tag: &str, rewriter: F) -> Result<Self>
    where
        F: Fn(&Shortcode) -> Option<String> + Send + Sync + 'static,
    {
        if !TAG_NAME.is_match(tag) {
            return Err(RichTextError::InvalidShortcodeTag(tag.to_string()));
        }
        let opener = Regex::new(&format!(
            r"\[(\[?)({})((?:[^\]/]|/[^\]])*?)(/)?\](\]?)",
            regex::escape(tag)
        ))?;
        Ok(Self {
            tag: tag.to_string(),
            opener,
            closer: format!("[/{tag}]"),
            rewriter: Box::new(rewriter),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn openers(&self, text: &str) -> Vec<Opener> {
        let mut openers = Vec::new();
        let mut from = 0;
        while let Some(caps) = self.opener.captures_at(text, from) {
            let Some(all) = caps.get(0) else { break };
            let arguments = caps.get(3).map_or("", |m| m.as_str());
            let escaped = caps.get(1).is_some_and(|m| !m.is_empty())
                && caps.get(5).is_some_and(|m| !m.is_empty());

            // The tag name must end here: `[captions]` is not `[caption]`.
            let boundary = arguments
                .chars()
                .next()
                .map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '-'));
            if !boundary {
                from = all.start() + 1;
                continue;
            }
            from = all.end();
            if escaped {
                continue;
            }

            // A leading `[` or trailing `]` that is not an escape belongs to the text.
            let start = all.start() + caps.get(1).map_or(0, |m| m.len());
            let end = all.end() - caps.get(5).map_or(0, |m| m.len());
            openers.push(Opener {
                start,
                end,
                arguments: arguments.to_string(),
                self_closing: caps.get(4).is_some(),
            });
        }
        openers
    }

    fn occurrences(&self, text: &str) -> Vec<Occurrence> {
        enum Event {
            Open(Opener),
            Close(usize),
        }

        let mut events: Vec<(usize, Event)> = self
            .openers(text)
            .into_iter()
            .map(|o| (o.start, Event::Open(o)))
            .collect();
        events.extend(
            text.match_indices(&self.closer)
                .map(|(i, _)| (i, Event::Close(i))),
        );
        events.sort_by_key(|(position, _)| *position);

        let mut occurrences = Vec::new();
        let mut unclosed: Vec<Opener> = Vec::new();
        for (_, event) in events {
            match event {
                Event::Open(opener) if opener.self_closing => occurrences.push(Occurrence {
                    start: opener.start,
                    end: opener.end,
                    opener,
                    content: None,
                }),
                Event::Open(opener) => unclosed.push(opener),
                Event::Close(position) => match unclosed.pop() {
                    Some(opener) => occurrences.push(Occurrence {
                        start: opener.start,
                        end: position + self.closer.len(),
                        content: Some((opener.end, position)),
                        opener,
                    }),
                    None => debug!("ignoring unmatched {}", self.closer),
                },
            }
        }
        occurrences.extend(unclosed.into_iter().map(|opener| Occurrence {
            start: opener.start,
            end: opener.end,
            opener,
            content: None,
        }));
        occurrences.sort_by_key(|o| o.start);
        occurrences
    }

    fn rewrite(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for occurrence in self.occurrences(text) {
            // Nested occurrences are handled together with their enclosing one.
            if occurrence.start < cursor {
                continue;
            }
            out.push_str(&text[cursor..occurrence.start]);
            out.push_str(&self.replace(text, &occurrence));
            cursor = occurrence.end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    fn replace(&self, text: &str, occurrence: &Occurrence) -> String {
        let opener = &occurrence.opener;
        let (kind, content) = match occurrence.content {
            Some((start, end)) => (TagKind::Closed, Some(self.rewrite(&text[start..end]))),
            None if opener.self_closing => (TagKind::SelfClosing, None),
            None => (TagKind::Single, None),
        };
        let shortcode = Shortcode {
            tag: self.tag.clone(),
            kind,
            attributes: parse_shortcode_attributes(&opener.arguments),
            content,
        };

        match (self.rewriter)(&shortcode) {
            Some(replacement) => {
                debug!("rewrote [{}] shortcode", self.tag);
                replacement
            }
            None => match &shortcode.content {
                Some(content) => format!(
                    "{}{}{}",
                    &text[opener.start..opener.end],
                    content,
                    self.closer
                ),
                None => text[occurrence.start..occurrence.end].to_string(),
            },
        }
    }
}

impl HtmlProcessor for ShortcodeProcessor {
    fn process(&self, html: &str) -> String {
        if !html.contains('[') {
            return html.to_string();
        }
        self.rewrite(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(tag: &str) -> ShortcodeProcessor {
        ShortcodeProcessor::new(tag, |shortcode| {
            let kind = match shortcode.kind {
                TagKind::SelfClosing => "self-closing",
                TagKind::Closed => "closed",
                TagKind::Single => "single",
            };
            Some(format!(
                "<{kind} {}>{}</{kind}>",
                serialize_shortcode_attributes(&shortcode.attributes),
                shortcode.content.clone().unwrap_or_default()
            ))
        })
        .unwrap()
    }

    #[test]
    fn test_parse_attributes() {
        let attributes = parse_shortcode_attributes(r#"id="1" align='left' width=300 "quoted value" bare"#);
        assert_eq!(
            attributes,
            vec![
                ShortcodeAttribute::new("id", "1"),
                ShortcodeAttribute::new("align", "left"),
                ShortcodeAttribute::new("width", "300"),
                ShortcodeAttribute::unnamed("quoted value"),
                ShortcodeAttribute::unnamed("bare"),
            ]
        );
    }

    #[test]
    fn test_attribute_value_with_equals_sign() {
        let attributes = parse_shortcode_attributes(r#"class="span data-mce-type=""#);
        assert_eq!(attributes, vec![ShortcodeAttribute::new("class", "span data-mce-type=")]);
    }

    #[test]
    fn test_serialize_attributes() {
        let attributes = vec![ShortcodeAttribute::new("src", "a.mp4"), ShortcodeAttribute::unnamed("loop")];
        assert_eq!(serialize_shortcode_attributes(&attributes), "src=\"a.mp4\" loop");
    }

    #[test]
    fn test_kinds() {
        let processor = echo("video");
        assert_eq!(processor.process("[video src=a /]"), "<self-closing src=\"a\"></self-closing>");
        assert_eq!(processor.process("[video]x[/video]"), "<closed >x</closed>");
        assert_eq!(processor.process("a [video src=a] b"), "a <single src=\"a\"></single> b");
    }

    #[test]
    fn test_unnamed_and_mixed_attributes() {
        let processor = ShortcodeProcessor::new("wpvideo", |shortcode| {
            let src = shortcode.unnamed_attributes().next()?;
            Some(format!(
                "<video src=\"videopress://{src}\" width=\"{}\" />",
                shortcode.attribute("w")?
            ))
        })
        .unwrap();
        assert_eq!(
            processor.process("[wpvideo OcobLTqC w=640 h=400 autoplay=true] Some Text"),
            "<video src=\"videopress://OcobLTqC\" width=\"640\" /> Some Text"
        );
    }

    #[test]
    fn test_tag_boundary() {
        let processor = echo("caption");
        assert_eq!(processor.process("[captions]x"), "[captions]x");
        assert_eq!(processor.process("[caption-x]"), "[caption-x]");
    }

    #[test]
    fn test_escaped_shortcode_untouched() {
        let processor = echo("caption");
        assert_eq!(processor.process("[[caption]]"), "[[caption]]");
    }

    #[test]
    fn test_nested_same_tag() {
        let processor = ShortcodeProcessor::new("box", |shortcode| {
            Some(format!("<div>{}</div>", shortcode.content.clone().unwrap_or_default()))
        })
        .unwrap();
        assert_eq!(
            processor.process("[box]a[box]b[/box]c[/box]"),
            "<div>a<div>b</div>c</div>"
        );
    }

    #[test]
    fn test_unclosed_opener_before_pair() {
        let processor = echo("b");
        assert_eq!(
            processor.process("[b x=1][b]y[/b]"),
            "<single x=\"1\"></single><closed >y</closed>"
        );
    }

    #[test]
    fn test_rewriter_declines() {
        let processor = ShortcodeProcessor::new("caption", |_| None).unwrap();
        let input = "[caption id=\"1\"]<img src=\"a.jpg\">Text[/caption]";
        assert_eq!(processor.process(input), input);
    }

    #[test]
    fn test_invalid_tag() {
        assert!(matches!(
            ShortcodeProcessor::new("bad tag", |_| None),
            Err(RichTextError::InvalidShortcodeTag(_))
        ));
    }
}
