use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

use crate::core::error::DecodeError;
use crate::normalize::{braced_span, strip_fences};

pub const DEFAULT_SUGGESTIONS: &str = "No suggestions available";

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("static pattern compiles")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    /// Lower-cased, de-duplicated, in first-seen order.
    pub colors: Vec<String>,
    pub suggestions: String,
}

pub fn decode_analysis(raw: &str) -> Result<Analysis, DecodeError> {
    let text = strip_fences(raw);

    let value = match serde_json::from_str::<Value>(text) {
        Ok(v) => v,
        // Prose around an unfenced object.
        Err(e) => braced_span(text)
            .and_then(|span| serde_json::from_str::<Value>(span).ok())
            .ok_or_else(|| DecodeError::Analysis(e.to_string()))?,
    };

    let Value::Object(obj) = value else {
        return Err(DecodeError::Analysis("expected a JSON object".into()));
    };

    let colors = match obj.get("colors") {
        Some(Value::Array(items)) => {
            collect_colors(items.iter().filter_map(Value::as_str))
        }
        _ => Vec::new(),
    };

    let suggestions = match obj.get("suggestions") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Array(items)) => {
            let lines: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if lines.is_empty() {
                DEFAULT_SUGGESTIONS.to_string()
            } else {
                lines.join("\n")
            }
        }
        _ => DEFAULT_SUGGESTIONS.to_string(),
    };

    Ok(Analysis {
        colors,
        suggestions,
    })
}

pub fn is_hex_color(candidate: &str) -> bool {
    HEX_COLOR.is_match(candidate)
}

fn collect_colors<'a>(candidates: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    for candidate in candidates {
        let candidate = candidate.trim();
        if !is_hex_color(candidate) {
            tracing::debug!(candidate, "dropping non-hex color");
            continue;
        }
        let color = candidate.to_ascii_lowercase();
        if !colors.contains(&color) {
            colors.push(color);
        }
    }
    colors
}
