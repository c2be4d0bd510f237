//! Lenient HTML tokenizer.
//!
//! Scans bytes for structural ASCII characters and slices the input only at those
//! positions, so every slice endpoint is a UTF-8 char boundary. Anything that does not
//! look like markup is text: a `<` that does not start a tag, comment or declaration is
//! kept literally.

use log::debug;
use richtext_core::{elements, set_attribute, unescape, Attribute};

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const CDATA_START: &[u8] = b"<![CDATA[";
const CDATA_END: &str = "]]>";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag(String),
    /// Entity-decoded character data
    Text(String),
    /// Verbatim content of `script` / `style`
    RawText(String),
    Comment(String),
    CData(String),
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'-' | b'.')
}

/// Locate `</name` followed by optional whitespace and `>`. Returns (start, end) byte
/// offsets of the close tag.
fn find_rawtext_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let n = name.len() + 2;
    let mut i = 0;
    while i + n <= bytes.len() {
        let rel = haystack[i..].find("</")?;
        i += rel;
        if i + n > bytes.len() {
            return None;
        }
        if starts_with_ignore_ascii_case_at(bytes, i + 2, name.as_bytes()) {
            let mut k = i + n;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < bytes.len() && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 2;
    }
    None
}

/// Tokenize a whole HTML string
pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    let mut text_start = 0;

    // Flush pending text into the token stream.
    fn flush(input: &str, start: usize, end: usize, out: &mut Vec<Token>) {
        debug_assert!(input.is_char_boundary(start) && input.is_char_boundary(end));
        if start < end {
            out.push(Token::Text(unescape(&input[start..end])));
        }
    }

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }

        if input[i..].starts_with(COMMENT_START) {
            flush(input, text_start, i, &mut out);
            let body_start = i + COMMENT_START.len();
            match input[body_start..].find(COMMENT_END) {
                Some(len) => {
                    out.push(Token::Comment(input[body_start..body_start + len].to_string()));
                    i = body_start + len + COMMENT_END.len();
                }
                None => {
                    debug!("unterminated comment at byte {i}");
                    out.push(Token::Comment(input[body_start..].to_string()));
                    i = bytes.len();
                }
            }
            text_start = i;
            continue;
        }

        if starts_with_ignore_ascii_case_at(bytes, i, CDATA_START) {
            flush(input, text_start, i, &mut out);
            let body_start = i + CDATA_START.len();
            match input[body_start..].find(CDATA_END) {
                Some(len) => {
                    out.push(Token::CData(input[body_start..body_start + len].to_string()));
                    i = body_start + len + CDATA_END.len();
                }
                None => {
                    debug!("unterminated CDATA section at byte {i}");
                    out.push(Token::CData(input[body_start..].to_string()));
                    i = bytes.len();
                }
            }
            text_start = i;
            continue;
        }

        match bytes.get(i + 1) {
            // Doctype and processing instructions carry no content for us.
            Some(b'!') | Some(b'?') => {
                flush(input, text_start, i, &mut out);
                let end = input[i..].find('>').map_or(bytes.len(), |p| i + p + 1);
                debug!("skipping declaration {:?}", &input[i..end]);
                i = end;
                text_start = i;
            }
            Some(b'/') if bytes.get(i + 2).is_some_and(|b| b.is_ascii_alphabetic()) => {
                flush(input, text_start, i, &mut out);
                let name_end = scan_name(bytes, i + 2);
                let name = input[i + 2..name_end].to_ascii_lowercase();
                i = input[name_end..].find('>').map_or(bytes.len(), |p| name_end + p + 1);
                out.push(Token::EndTag(name));
                text_start = i;
            }
            Some(b) if b.is_ascii_alphabetic() => {
                flush(input, text_start, i, &mut out);
                let (token, end) = start_tag(input, i);
                i = end;
                text_start = i;

                let raw_name = match &token {
                    Token::StartTag {
                        name, self_closing, ..
                    } if !self_closing && elements::is_raw_text(name) => Some(name.clone()),
                    _ => None,
                };
                out.push(token);

                if let Some(name) = raw_name {
                    match find_rawtext_close_tag(&input[i..], &name) {
                        Some((start, end)) => {
                            if start > 0 {
                                out.push(Token::RawText(input[i..i + start].to_string()));
                            }
                            out.push(Token::EndTag(name));
                            i += end;
                        }
                        None => {
                            debug!("unterminated <{name}> element");
                            if i < bytes.len() {
                                out.push(Token::RawText(input[i..].to_string()));
                            }
                            i = bytes.len();
                        }
                    }
                    text_start = i;
                }
            }
            // A lone '<' is text.
            _ => i += 1,
        }
    }

    flush(input, text_start, bytes.len(), &mut out);
    out
}

fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut j = start;
    while j < bytes.len() && is_name_byte(bytes[j]) {
        j += 1;
    }
    j
}

/// Parse a start tag beginning at `start` (which points at `<`). Returns the token and
/// the offset just past the tag. An unterminated tag runs to the end of the input.
pub(crate) fn start_tag(input: &str, start: usize) -> (Token, usize) {
    let bytes = input.as_bytes();
    let name_end = scan_name(bytes, start + 1);
    let name = input[start + 1..name_end].to_ascii_lowercase();
    let mut attributes = Vec::new();
    let mut self_closing = false;
    let mut i = name_end;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            debug!("unterminated <{name}> tag");
            break;
        }
        match bytes[i] {
            b'>' => {
                i += 1;
                break;
            }
            b'/' => {
                if bytes.get(i + 1) == Some(&b'>') {
                    self_closing = true;
                    i += 2;
                    break;
                }
                i += 1;
            }
            _ => {
                let (attribute, end) = attribute(input, i);
                if let Some(attribute) = attribute {
                    set_attribute(&mut attributes, attribute);
                }
                i = end;
            }
        }
    }

    (
        Token::StartTag {
            name,
            attributes,
            self_closing,
        },
        i,
    )
}

fn attribute(input: &str, start: usize) -> (Option<Attribute>, usize) {
    let bytes = input.as_bytes();
    let mut i = start;
    while i < bytes.len()
        && !bytes[i].is_ascii_whitespace()
        && !matches!(bytes[i], b'=' | b'>' | b'/')
    {
        i += 1;
    }
    // Stray '=' with no name: skip one byte.
    if i == start {
        return (None, start + 1);
    }
    let name = &input[start..i];

    let mut j = i;
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    if bytes.get(j) != Some(&b'=') {
        return (Some(Attribute::flag(name)), i);
    }
    j += 1;
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }

    let (raw, end) = match bytes.get(j) {
        Some(&quote) if quote == b'"' || quote == b'\'' => {
            let value_start = j + 1;
            match bytes[value_start..].iter().position(|b| *b == quote) {
                Some(len) => (&input[value_start..value_start + len], value_start + len + 1),
                None => (&input[value_start..], bytes.len()),
            }
        }
        _ => {
            let mut k = j;
            while k < bytes.len() && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                k += 1;
            }
            (&input[j..k], k)
        }
    };

    (Some(Attribute::new(name, &unescape(raw))), end)
}

/// Name of the first element tag in `html`, even if the tag is never closed.
pub(crate) fn first_tag_name(html: &str) -> Option<String> {
    let bytes = html.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if html[i..].starts_with(COMMENT_START) {
            i = html[i..].find(COMMENT_END).map_or(bytes.len(), |p| i + p + COMMENT_END.len());
            continue;
        }
        if bytes[i] == b'<' && bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
            let end = scan_name(bytes, i + 1);
            return Some(html[i + 1..end].to_ascii_lowercase());
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str, attributes: Vec<Attribute>) -> Token {
        Token::StartTag {
            name: name.to_string(),
            attributes,
            self_closing: false,
        }
    }

    #[test]
    fn test_simple_tags() {
        let tokens = tokenize("<p>Hi</p>");
        assert_eq!(
            tokens,
            vec![
                start("p", vec![]),
                Token::Text("Hi".to_string()),
                Token::EndTag("p".to_string()),
            ]
        );
    }

    #[test]
    fn test_attributes_quoting() {
        let tokens = tokenize(r#"<img src="a.jpg" alt='Al"t' width=300 hidden>"#);
        assert_eq!(
            tokens,
            vec![Token::StartTag {
                name: "img".to_string(),
                attributes: vec![
                    Attribute::new("src", "a.jpg"),
                    Attribute::new("alt", "Al\"t"),
                    Attribute::new("width", "300"),
                    Attribute::flag("hidden"),
                ],
                self_closing: false,
            }]
        );
    }

    #[test]
    fn test_attribute_entities_decoded() {
        let tokens = tokenize(r#"<a title="&quot;x&quot; &amp; y">"#);
        assert_eq!(tokens, vec![start("a", vec![Attribute::new("title", "\"x\" & y")])]);
    }

    #[test]
    fn test_duplicate_attribute_last_write_wins() {
        let tokens = tokenize(r#"<p class="a" id="x" class="b">"#);
        assert_eq!(
            tokens,
            vec![start("p", vec![Attribute::new("class", "b"), Attribute::new("id", "x")])]
        );
    }

    #[test]
    fn test_self_closing() {
        let tokens = tokenize("<br/><img src=x />");
        assert_eq!(
            tokens,
            vec![
                Token::StartTag {
                    name: "br".to_string(),
                    attributes: vec![],
                    self_closing: true
                },
                Token::StartTag {
                    name: "img".to_string(),
                    attributes: vec![Attribute::new("src", "x")],
                    self_closing: true
                },
            ]
        );
    }

    #[test]
    fn test_comment_with_angle_brackets() {
        let tokens = tokenize("<!-- <b>not a tag</b> -> still --><p>");
        assert_eq!(
            tokens,
            vec![
                Token::Comment(" <b>not a tag</b> -> still ".to_string()),
                start("p", vec![]),
            ]
        );
    }

    #[test]
    fn test_cdata() {
        let tokens = tokenize("<![CDATA[x < y && <b>]]>after");
        assert_eq!(
            tokens,
            vec![
                Token::CData("x < y && <b>".to_string()),
                Token::Text("after".to_string()),
            ]
        );
    }

    #[test]
    fn test_script_raw_text() {
        let tokens = tokenize("<script>(a = b || []).push({});</script>");
        assert_eq!(
            tokens,
            vec![
                start("script", vec![]),
                Token::RawText("(a = b || []).push({});".to_string()),
                Token::EndTag("script".to_string()),
            ]
        );
    }

    #[test]
    fn test_script_with_markup_inside() {
        let tokens = tokenize("<script>document.write('<p>x</p>')</SCRIPT >t");
        assert_eq!(
            tokens,
            vec![
                start("script", vec![]),
                Token::RawText("document.write('<p>x</p>')".to_string()),
                Token::EndTag("script".to_string()),
                Token::Text("t".to_string()),
            ]
        );
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let tokens = tokenize("a < b and 1<2");
        assert_eq!(tokens, vec![Token::Text("a < b and 1<2".to_string())]);
    }

    #[test]
    fn test_doctype_is_skipped() {
        let tokens = tokenize("<!DOCTYPE html><p>x</p>");
        assert_eq!(tokens[0], start("p", vec![]));
    }

    #[test]
    fn test_unicode_text() {
        let tokens = tokenize("<b>caf\u{e9} \u{1F600}</b>");
        assert_eq!(tokens[1], Token::Text("caf\u{e9} \u{1F600}".to_string()));
    }

    #[test]
    fn test_first_tag_name() {
        assert_eq!(first_tag_name("<span"), Some("span".to_string()));
        assert_eq!(first_tag_name("text <Video src=x>"), Some("video".to_string()));
        assert_eq!(first_tag_name("<!-- <b> --><i>"), Some("i".to_string()));
        assert_eq!(first_tag_name("no tags"), None);
    }
}
