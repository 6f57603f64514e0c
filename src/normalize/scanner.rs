//! Field-level recovery for bundle payloads that fail strict JSON decoding.
//!
//! The text is walked forward once to find key markers (`"html": "` and the
//! like) for the four known fields. Each value then runs from its opening
//! quote to the first unescaped quote that is followed either by a comma and
//! a `"name":` key, or by the final closing brace of the text. The key check
//! only reads up to the next quote, so each value scan stays linear in the
//! input length.

use crate::core::bundle::CodeBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Message,
    Html,
    Css,
    Js,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Message, Field::Html, Field::Css, Field::Js];

    pub fn key(self) -> &'static str {
        match self {
            Field::Message => "message",
            Field::Html => "html",
            Field::Css => "css",
            Field::Js => "js",
        }
    }
}

/// Where a known key sits in the text.
#[derive(Debug, Clone, Copy)]
struct KeyMarker {
    field: Field,
    /// Offset just past the value's opening quote.
    value_start: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveredFields {
    pub message: Option<String>,
    pub html: Option<String>,
    pub css: Option<String>,
    pub js: Option<String>,
}

impl RecoveredFields {
    pub fn count(&self) -> usize {
        [&self.message, &self.html, &self.css, &self.js]
            .iter()
            .filter(|f| f.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn into_bundle(self, fallback: &CodeBundle) -> CodeBundle {
        CodeBundle {
            message: self.message.unwrap_or_else(|| fallback.message.clone()),
            html: self.html.unwrap_or_else(|| fallback.html.clone()),
            css: self.css.unwrap_or_else(|| fallback.css.clone()),
            js: self.js.unwrap_or_else(|| fallback.js.clone()),
        }
    }

    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Message => &mut self.message,
            Field::Html => &mut self.html,
            Field::Css => &mut self.css,
            Field::Js => &mut self.js,
        }
    }
}

pub fn recover_fields(text: &str) -> RecoveredFields {
    let markers = scan_markers(text);
    let final_brace = text.rfind('}');
    let mut recovered = RecoveredFields::default();

    for marker in &markers {
        let slot = recovered.slot(marker.field);
        if slot.is_some() {
            continue;
        }
        if let Some(end) = value_end(text, marker.value_start, final_brace) {
            *slot = Some(unescape(&text[marker.value_start..end]));
        }
    }

    recovered
}

fn scan_markers(text: &str) -> Vec<KeyMarker> {
    let bytes = text.as_bytes();
    let mut markers = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('"') {
        let quote = pos + offset;
        pos = quote + 1;

        if !follows_separator(bytes, quote) {
            continue;
        }
        for field in Field::ALL {
            if let Some(value_start) = match_key(bytes, quote, field.key()) {
                markers.push(KeyMarker { field, value_start });
                break;
            }
        }
    }

    markers
}

/// A key must open the object or follow a comma.
fn follows_separator(bytes: &[u8], quote: usize) -> bool {
    match bytes[..quote]
        .iter()
        .rev()
        .find(|b| !b.is_ascii_whitespace())
    {
        None => true,
        Some(b) => *b == b'{' || *b == b',',
    }
}

/// Matches `"key"` `:` `"` starting at `quote`, returning the offset past the
/// value's opening quote.
fn match_key(bytes: &[u8], quote: usize, key: &str) -> Option<usize> {
    let key_end = quote + 1 + key.len();
    if bytes.get(quote + 1..key_end)? != key.as_bytes() || *bytes.get(key_end)? != b'"' {
        return None;
    }
    let mut i = skip_whitespace(bytes, key_end + 1);
    if *bytes.get(i)? != b':' {
        return None;
    }
    i = skip_whitespace(bytes, i + 1);
    (*bytes.get(i)? == b'"').then_some(i + 1)
}

fn value_end(text: &str, start: usize, final_brace: Option<usize>) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut pos = start;

    while let Some(offset) = text[pos..].find('"') {
        let quote = pos + offset;
        pos = quote + 1;

        if is_escaped(bytes, start, quote) {
            continue;
        }

        let after = skip_whitespace(bytes, quote + 1);
        match bytes.get(after).copied() {
            Some(b',') => {
                if starts_key(bytes, skip_whitespace(bytes, after + 1)) {
                    return Some(quote);
                }
            }
            Some(b'}') if Some(after) == final_brace => return Some(quote),
            _ => {}
        }
    }

    None
}

/// Matches `"name"` `:` at `pos` for any plain key name, known or not.
fn starts_key(bytes: &[u8], pos: usize) -> bool {
    if bytes.get(pos) != Some(&b'"') {
        return false;
    }
    let name_len = bytes[pos + 1..]
        .iter()
        .take_while(|b| !matches!(**b, b'"' | b'\\' | b'\n'))
        .count();
    let close = pos + 1 + name_len;
    if name_len == 0 || bytes.get(close) != Some(&b'"') {
        return false;
    }
    bytes.get(skip_whitespace(bytes, close + 1)) == Some(&b':')
}

/// A quote is escaped when an odd run of backslashes precedes it.
fn is_escaped(bytes: &[u8], floor: usize, quote: usize) -> bool {
    let run = bytes[floor..quote]
        .iter()
        .rev()
        .take_while(|b| **b == b'\\')
        .count();
    run % 2 == 1
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
        i += 1;
    }
    i
}

/// Single pass over JSON-style escapes. Unknown escapes are kept verbatim.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => out.push('\n'),
            Some('"') => out.push('"'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('u') => {
                chars.next();
                let hex: String = chars.clone().take(4).collect();
                let decoded = (hex.len() == 4 && hex.chars().all(|h| h.is_ascii_hexdigit()))
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => {
                        out.push(decoded);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    _ => out.push_str("\\u"),
                }
                continue;
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => {
                out.push('\\');
                continue;
            }
        }
        chars.next();
    }

    out
}
