//! Byte-span tokenizer for MJML and HTML-ish markup.
//!
//! Tolerant by construction: the only failures are an attribute quote that is never
//! closed and a control character inside a tag. Everything else yields tokens.

use std::ops::Range;

use crate::error::{MjmlError, MjmlResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    OpenTag {
        name: &'a str,
        attrs: Vec<(String, String)>,
        self_closing: bool,
        span: Range<usize>,
    },
    CloseTag {
        name: &'a str,
        span: Range<usize>,
    },
    Text {
        text: &'a str,
        span: Range<usize>,
    },
    Comment {
        text: &'a str,
        span: Range<usize>,
    },
    /// Verbatim body of a raw-text tag. `closed` is false when the body ended at a
    /// tag boundary or end of input instead of its own closing tag.
    RawText {
        text: &'a str,
        span: Range<usize>,
        closed: bool,
    },
}

pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    is_raw_text: fn(&str) -> bool,
    pending_raw: Option<&'a str>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str, is_raw_text: fn(&str) -> bool) -> Self {
        Self {
            src,
            pos: 0,
            is_raw_text,
            pending_raw: None,
        }
    }

    pub fn next_token(&mut self) -> MjmlResult<Option<Token<'a>>> {
        if let Some(name) = self.pending_raw.take() {
            let start = self.pos;
            let (end, closed) = raw_text_end(self.src, start, name);
            self.pos = end;
            return Ok(Some(Token::RawText {
                text: &self.src[start..end],
                span: start..end,
                closed,
            }));
        }

        if self.pos >= self.src.len() {
            return Ok(None);
        }

        let rest = &self.src[self.pos..];
        if rest.starts_with("<!--") {
            return Ok(Some(self.read_comment()));
        }
        if rest.starts_with("<![CDATA[") {
            return Ok(Some(self.read_until_marker("]]>")));
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            // Doctype or processing instruction: kept as a comment token.
            let start = self.pos;
            let end = find_byte(self.src, start, b'>').map_or(self.src.len(), |i| i + 1);
            self.pos = end;
            return Ok(Some(Token::Comment {
                text: &self.src[start..end],
                span: start..end,
            }));
        }

        let bytes = rest.as_bytes();
        if bytes[0] == b'<' && bytes.len() > 1 {
            if bytes[1] == b'/' && bytes.len() > 2 && is_name_start(bytes[2]) {
                return self.read_close_tag().map(Some);
            }
            if is_name_start(bytes[1]) {
                return self.read_open_tag().map(Some);
            }
        }
        Ok(Some(self.read_text()))
    }

    fn read_comment(&mut self) -> Token<'a> {
        let start = self.pos;
        let end = find_str(self.src, start + 4, "-->").map_or(self.src.len(), |i| i + 3);
        self.pos = end;
        Token::Comment {
            text: &self.src[start..end],
            span: start..end,
        }
    }

    fn read_until_marker(&mut self, marker: &str) -> Token<'a> {
        let start = self.pos;
        let end = find_str(self.src, start, marker).map_or(self.src.len(), |i| i + marker.len());
        self.pos = end;
        Token::Text {
            text: &self.src[start..end],
            span: start..end,
        }
    }

    fn read_text(&mut self) -> Token<'a> {
        let start = self.pos;
        // A lone '<' that does not open a tag is plain text.
        let end = find_byte(self.src, start + 1, b'<').unwrap_or(self.src.len());
        self.pos = end;
        Token::Text {
            text: &self.src[start..end],
            span: start..end,
        }
    }

    fn read_close_tag(&mut self) -> MjmlResult<Token<'a>> {
        let start = self.pos;
        let name_start = start + 2;
        let name_end = scan_name(self.src, name_start);
        let name = &self.src[name_start..name_end];
        let mut i = name_end;
        let bytes = self.src.as_bytes();
        while i < bytes.len() && bytes[i] != b'>' {
            if bytes[i] == b'<' {
                break;
            }
            check_control(self.src, i)?;
            i += 1;
        }
        let end = if i < bytes.len() && bytes[i] == b'>' { i + 1 } else { i };
        self.pos = end;
        Ok(Token::CloseTag {
            name,
            span: start..end,
        })
    }

    fn read_open_tag(&mut self) -> MjmlResult<Token<'a>> {
        let src = self.src;
        let bytes = src.as_bytes();
        let start = self.pos;
        let name_end = scan_name(src, start + 1);
        let name = &src[start + 1..name_end];
        let mut attrs: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;
        let mut i = name_end;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                // Tag still being typed: it ends with the input.
                break;
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    self_closing = true;
                    i += 2;
                    break;
                }
                // Next tag starts before this one was closed.
                b'<' => break,
                _ => {}
            }
            check_control(src, i)?;

            let attr_start = i;
            while i < bytes.len() && is_attr_name_byte(bytes[i]) {
                i += 1;
            }
            if i == attr_start {
                // Stray '=', quote or '/': skip the fragment.
                i += src[i..].chars().next().map_or(1, char::len_utf8);
                continue;
            }
            let attr_name = &src[attr_start..i];

            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j >= bytes.len() || bytes[j] != b'=' {
                push_attr(&mut attrs, attr_name, String::new());
                continue;
            }
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j >= bytes.len() {
                i = j;
                continue;
            }
            match bytes[j] {
                quote @ (b'"' | b'\'') => {
                    let close = find_byte(src, j + 1, quote).ok_or_else(|| {
                        MjmlError::parse_at(
                            src,
                            j,
                            format!("unterminated attribute value for '{}' in <{}>", attr_name, name),
                        )
                    })?;
                    push_attr(&mut attrs, attr_name, decode_entities(&src[j + 1..close]));
                    i = close + 1;
                }
                b'>' | b'<' => {
                    // `name=` with no value: malformed, skipped.
                    i = j;
                }
                _ => {
                    let value_start = j;
                    while j < bytes.len()
                        && !bytes[j].is_ascii_whitespace()
                        && bytes[j] != b'>'
                        && bytes[j] != b'<'
                        && !(bytes[j] == b'/' && bytes.get(j + 1) == Some(&b'>'))
                    {
                        check_control(src, j)?;
                        j += 1;
                    }
                    push_attr(&mut attrs, attr_name, decode_entities(&src[value_start..j]));
                    i = j;
                }
            }
        }

        self.pos = i;
        if !self_closing && (self.is_raw_text)(name) {
            self.pending_raw = Some(name);
        }
        Ok(Token::OpenTag {
            name,
            attrs,
            self_closing,
            span: start..i,
        })
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = MjmlResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// First occurrence wins, matching how browsers treat duplicate attributes.
fn push_attr(attrs: &mut Vec<(String, String)>, name: &str, value: String) {
    if attrs.iter().any(|(n, _)| n == name) {
        return;
    }
    attrs.push((name.to_string(), value));
}

fn check_control(src: &str, i: usize) -> MjmlResult<()> {
    let b = src.as_bytes()[i];
    if (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r')) || b == 0x7f {
        return Err(MjmlError::parse_at(
            src,
            i,
            format!("control character 0x{:02x} inside a tag", b),
        ));
    }
    Ok(())
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

fn is_attr_name_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'<' | b'/' | b'"' | b'\'') && b >= 0x20
}

fn scan_name(src: &str, from: usize) -> usize {
    let bytes = src.as_bytes();
    let mut i = from;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    i
}

fn find_byte(src: &str, from: usize, needle: u8) -> Option<usize> {
    if from >= src.len() {
        return None;
    }
    src.as_bytes()[from..]
        .iter()
        .position(|&b| b == needle)
        .map(|p| from + p)
}

fn find_str(src: &str, from: usize, needle: &str) -> Option<usize> {
    if from >= src.len() {
        return None;
    }
    src[from..].find(needle).map(|p| from + p)
}

/// ASCII case-insensitive search for `needle` starting at `from`.
fn find_ci(src: &str, from: usize, needle: &str) -> Option<usize> {
    let hay = src.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from >= hay.len() || hay.len() - from < needle.len() {
        return None;
    }
    (from..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Offset of the closing tag `</name>` at or after `from`.
pub(crate) fn find_closing_tag(src: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("</{}", name);
    let mut at = from;
    while let Some(i) = find_ci(src, at, &needle) {
        match src.as_bytes().get(i + needle.len()) {
            None => return Some(i),
            Some(b) if *b == b'>' || b.is_ascii_whitespace() => return Some(i),
            _ => at = i + 1,
        }
    }
    None
}

/// Next MJML tag boundary (`<mj-` or `</mj-`) at or after `from`.
fn find_mjml_boundary(src: &str, from: usize) -> Option<usize> {
    let open = find_ci(src, from, "<mj-");
    let close = find_ci(src, from, "</mj-");
    match (open, close) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn find_open_tag(src: &str, from: usize, needle: &str) -> Option<usize> {
    let mut at = from;
    while let Some(i) = find_ci(src, at, needle) {
        match src.as_bytes().get(i + needle.len()) {
            Some(b) if *b == b'>' || *b == b'/' || b.is_ascii_whitespace() => return Some(i),
            _ => at = i + 1,
        }
    }
    None
}

/// Offset of the `</name>` that closes the body starting at `from`, skipping nested
/// `<name>...</name>` pairs. `None` when the nesting never balances.
fn find_matching_close(src: &str, from: usize, name: &str) -> Option<usize> {
    let open_needle = format!("<{}", name);
    let mut depth = 0usize;
    let mut at = from;
    loop {
        let close = find_closing_tag(src, at, name)?;
        match find_open_tag(src, at, &open_needle).filter(|&o| o < close) {
            Some(o) => {
                let gt = find_byte(src, o, b'>');
                if gt.is_some_and(|g| src.as_bytes()[g - 1] != b'/') {
                    depth += 1;
                }
                at = gt.map_or(o + 1, |g| g + 1);
            }
            None if depth == 0 => return Some(close),
            None => {
                depth -= 1;
                at = close + 1;
            }
        }
    }
}

/// End of the raw body of `name` starting at `from`, and whether the body ended at
/// its own closing tag.
///
/// `mj-raw` bodies end at their matching `</mj-raw>`, so raw markup may hold further
/// `mj-raw` elements. Other `mj-*` bodies end at their own closing tag when no other
/// MJML closing tag comes first; otherwise they stop at the next MJML tag, so an
/// unclosed `<mj-text>` does not swallow its siblings.
fn raw_text_end(src: &str, from: usize, name: &str) -> (usize, bool) {
    let is_mjml = name.len() > 3 && name[..3].eq_ignore_ascii_case("mj-");
    if name.eq_ignore_ascii_case("mj-raw") {
        if let Some(c) =
            find_matching_close(src, from, name).or_else(|| find_closing_tag(src, from, name))
        {
            return (c, true);
        }
    }
    let close = find_closing_tag(src, from, name);
    if !is_mjml {
        return close.map_or((src.len(), false), |c| (c, true));
    }
    match close {
        Some(c) if find_ci(src, from, "</mj-") == Some(c) => (c, true),
        _ => match find_mjml_boundary(src, from) {
            Some(b) => (b, false),
            None => (src.len(), false),
        },
    }
}

/// Decode the entities the serializer produces plus numeric references.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
