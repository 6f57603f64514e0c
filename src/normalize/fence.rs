use regex::Regex;
use std::sync::LazyLock;

pub const FENCE: &str = "```";

static LEADING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\A```[a-z0-9_+.-]*\s*").expect("static pattern compiles")
});

static TRAILING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```\s*\z").expect("static pattern compiles"));

/// Removes one leading and one trailing code fence, anchored at the ends of
/// the text. If a fence still appears inside, only the span from the first
/// `{` to the last `}` is kept.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(m) = LEADING_FENCE.find(text) {
        text = &text[m.end()..];
    }
    if let Some(m) = TRAILING_FENCE.find(text) {
        text = &text[..m.start()];
    }

    if text.contains(FENCE) {
        if let Some(span) = braced_span(text) {
            text = span;
        }
    }

    text.trim()
}

/// First `{` through last `}`, inclusive.
pub fn braced_span(text: &str) -> Option<&str> {
    let first = text.find('{')?;
    let last = text.rfind('}')?;
    (first < last).then(|| &text[first..=last])
}
