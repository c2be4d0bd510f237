//! Rewriting of one element type inside serialized HTML.

use log::debug;
use richtext_core::Attribute;

use super::{HtmlProcessor, TagKind};
use crate::parser::parse_start_tag;

/// One occurrence of an element found in an HTML string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    pub tag: String,
    pub kind: TagKind,
    /// Decoded attributes, in source order
    pub attributes: Vec<Attribute>,
    /// Markup between the start and end tags, for `Closed` elements, with nested
    /// occurrences already rewritten
    pub content: Option<String>,
}

impl HtmlElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .and_then(|a| a.value_str())
    }
}

pub type HtmlElementRewriter = Box<dyn Fn(&HtmlElement) -> Option<String> + Send + Sync>;

/// Finds every `<tag ...>...</tag>` in a string and lets a rewriter replace it.
///
/// Matching is case-insensitive and nesting aware: the end tag paired with a start tag
/// is the one that balances nested elements of the same name. Nested occurrences are
/// rewritten before the element that contains them. When the rewriter returns `None`
/// the element is kept around its rewritten content.
pub struct HtmlElementProcessor {
    tag: String,
    rewriter: HtmlElementRewriter,
}

impl HtmlElementProcessor {
    pub fn new<F>(tag: &str, rewriter: F) -> Self
    where
        F: Fn(&HtmlElement) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            tag: tag.to_ascii_lowercase(),
            rewriter: Box::new(rewriter),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Next `prefix` + tag name in `lower`, with the name not continuing past the match
    fn find_tag(&self, lower: &str, prefix: &str, from: usize) -> Option<usize> {
        let needle = format!("{prefix}{}", self.tag);
        let mut at = from;
        while let Some(offset) = lower.get(at..)?.find(&needle) {
            let start = at + offset;
            let end = start + needle.len();
            let continues = lower
                .as_bytes()
                .get(end)
                .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':'));
            if !continues {
                return Some(start);
            }
            at = end;
        }
        None
    }

    /// Start and end byte of the end tag balancing an element opened before `from`
    fn matching_end(&self, html: &str, lower: &str, from: usize) -> Option<(usize, usize)> {
        let mut depth = 0usize;
        let mut at = from;
        loop {
            let close = self.find_tag(lower, "</", at)?;
            match self.find_tag(lower, "<", at) {
                Some(open) if open < close => {
                    at = match parse_start_tag(html, open) {
                        Some((_, self_closing, end)) => {
                            if !self_closing {
                                depth += 1;
                            }
                            end
                        }
                        None => open + 1,
                    };
                }
                _ => {
                    let end = lower[close..].find('>').map_or(lower.len(), |p| close + p + 1);
                    if depth == 0 {
                        return Some((close, end));
                    }
                    depth -= 1;
                    at = end;
                }
            }
        }
    }
}

impl HtmlProcessor for HtmlElementProcessor {
    fn process(&self, html: &str) -> String {
        let lower = html.to_ascii_lowercase();
        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;
        let mut at = 0;

        while let Some(start) = self.find_tag(&lower, "<", at) {
            let Some((element, self_closing, open_end)) = parse_start_tag(html, start) else {
                at = start + 1;
                continue;
            };

            let (kind, close, end) = if self_closing {
                (TagKind::SelfClosing, None, open_end)
            } else {
                match self.matching_end(html, &lower, open_end) {
                    Some((close, end)) => (TagKind::Closed, Some(close), end),
                    None => (TagKind::Single, None, open_end),
                }
            };

            let occurrence = HtmlElement {
                tag: self.tag.clone(),
                kind,
                attributes: element.attributes,
                content: close.map(|close| self.process(&html[open_end..close])),
            };
            match ((self.rewriter)(&occurrence), close, occurrence.content) {
                (Some(replacement), _, _) => {
                    debug!("rewrote <{}> element", self.tag);
                    out.push_str(&html[cursor..start]);
                    out.push_str(&replacement);
                    cursor = end;
                    at = end;
                }
                (None, Some(close), Some(content)) => {
                    out.push_str(&html[cursor..open_end]);
                    out.push_str(&content);
                    out.push_str(&html[close..end]);
                    cursor = end;
                    at = end;
                }
                _ => at = open_end,
            }
        }

        out.push_str(&html[cursor..]);
        out
    }
}
