//! HTML entity escaping and unescaping.
//!
//! Only structurally significant characters are encoded. Everything else, astral plane
//! characters included, passes through as UTF-8.

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

/// Escape text content: `&`, `<`, `>`, `"` and the non-breaking space.
pub fn escape_text(s: &str) -> String {
    escape(s, true)
}

/// Escape an attribute value: `&`, `<`, `>` and `"`.
pub fn escape_attribute(s: &str) -> String {
    escape(s, false)
}

fn escape(s: &str, nbsp: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' if nbsp => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode the named entities `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;` and
/// semicolon-terminated numeric references (`&#123;`, `&#x1F4A9;`).
///
/// Unknown names, missing semicolons, overlong digit runs and invalid scalar values are
/// left unchanged.
pub fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    let mut copy_start = 0;

    while i < bytes.len() {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }

        // Flush bytes up to '&' unchanged (preserves UTF-8).
        out.push_str(&s[copy_start..i]);

        if let Some((decoded, consumed)) = decode_at(bytes, i) {
            out.push(decoded);
            i += consumed;
        } else {
            out.push('&');
            i += 1;
        }
        copy_start = i;
    }

    out.push_str(&s[copy_start..]);
    out
}

fn decode_at(bytes: &[u8], start: usize) -> Option<(char, usize)> {
    const NAMED: &[(&[u8], char)] = &[
        (b"&amp;", '&'),
        (b"&lt;", '<'),
        (b"&gt;", '>'),
        (b"&quot;", '"'),
        (b"&apos;", '\''),
        (b"&nbsp;", '\u{a0}'),
    ];

    for (pattern, c) in NAMED {
        if bytes[start..].starts_with(pattern) {
            return Some((*c, pattern.len()));
        }
    }

    if bytes.get(start + 1) != Some(&b'#') {
        return None;
    }

    let (digits_start, radix, max_digits) = match bytes.get(start + 2) {
        Some(b'x') | Some(b'X') => (start + 3, 16, MAX_HEX_DIGITS),
        _ => (start + 2, 10, MAX_DEC_DIGITS),
    };

    let end = scan_numeric(bytes, digits_start, max_digits, radix == 16)?;
    // Digits are ASCII, so the slice is valid UTF-8.
    let digits = std::str::from_utf8(&bytes[digits_start..end]).ok()?;
    let value = u32::from_str_radix(digits, radix).ok()?;
    let c = char::from_u32(value)?;
    Some((c, end + 1 - start))
}

// Bounded scan to avoid quadratic behavior on adversarial input.
fn scan_numeric(bytes: &[u8], start: usize, max_digits: usize, hex: bool) -> Option<usize> {
    let mut j = start;
    while j < bytes.len() {
        let b = bytes[j];
        if b == b';' {
            return (j > start).then_some(j);
        }
        if j - start == max_digits {
            return None;
        }
        let ok = if hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        };
        if !ok {
            return None;
        }
        j += 1;
    }
    None
}
