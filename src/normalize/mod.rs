mod fence;
mod scanner;


pub use fence::{braced_span, strip_fences, FENCE};
pub use scanner::{recover_fields, unescape, Field, RecoveredFields};

use serde_json::Value;

use crate::core::bundle::CodeBundle;
use crate::core::error::DecodeError;

/// Which strategy produced the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePath {
    Strict,
    Recovered { fields: usize },
}

/// Turns raw model output into a bundle. Fields the output does not carry
/// are taken from `fallback`; fails only when neither a strict decode nor
/// field-level recovery finds anything.
pub fn normalize(raw: &str, fallback: &CodeBundle) -> Result<CodeBundle, DecodeError> {
    normalize_with_path(raw, fallback).map(|(bundle, _)| bundle)
}

pub fn normalize_with_path(
    raw: &str,
    fallback: &CodeBundle,
) -> Result<(CodeBundle, DecodePath), DecodeError> {
    let text = strip_fences(raw);

    let strict_err = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => {
            let field = |key: &str, default: &str| {
                map.get(key)
                    .and_then(Value::as_str)
                    .unwrap_or(default)
                    .to_string()
            };
            let bundle = CodeBundle {
                message: field("message", fallback.message.as_str()),
                html: field("html", fallback.html.as_str()),
                css: field("css", fallback.css.as_str()),
                js: field("js", fallback.js.as_str()),
            };
            return Ok((bundle, DecodePath::Strict));
        }
        Ok(other) => format!("expected a JSON object, got {}", json_kind(&other)),
        Err(e) => e.to_string(),
    };

    tracing::warn!(
        error = %strict_err,
        length = text.len(),
        "strict decode failed, attempting field recovery"
    );

    let recovered = recover_fields(text);
    if recovered.is_empty() {
        return Err(DecodeError::Unrecognized(strict_err));
    }

    let fields = recovered.count();
    tracing::info!(fields, "recovered fields from malformed model output");
    Ok((recovered.into_bundle(fallback), DecodePath::Recovered { fields }))
}

/// Article-prefixed JSON type name for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
