//! Shape checks for JSON-shaped requests arriving from the calling layer.

use serde_json::{Map, Value};

use crate::core::bundle::CodeBundle;
use crate::core::error::ValidationError;
use crate::core::message::HistoryEntry;
use crate::normalize::json_kind;

/// Longest accepted caller-supplied session id.
pub const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditRequest {
    pub history: Vec<HistoryEntry>,
    pub current: CodeBundle,
    pub session_id: Option<String>,
}

impl EditRequest {
    /// `{history, currentHtml, currentCss, currentJs, sessionId}`
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let obj = as_object(value)?;

        let history = match obj.get("history") {
            Some(Value::Array(entries)) => entries
                .iter()
                .enumerate()
                .map(|(i, entry)| history_entry(i, entry))
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(ValidationError::InvalidHistory(format!(
                    "got {}",
                    json_kind(other)
                )))
            }
            None => return Err(ValidationError::InvalidHistory("missing".into())),
        };

        Ok(Self {
            history,
            current: CodeBundle {
                message: String::new(),
                html: string_field(obj, "currentHtml")?,
                css: string_field(obj, "currentCss")?,
                js: string_field(obj, "currentJs")?,
            },
            session_id: optional_string(obj, "sessionId")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzeRequest {
    pub html: String,
    pub css: String,
    pub js: String,
    pub session_id: Option<String>,
}

impl AnalyzeRequest {
    /// `{html, css, js, sessionId}`
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let obj = as_object(value)?;
        Ok(Self {
            html: string_field(obj, "html")?,
            css: string_field(obj, "css")?,
            js: string_field(obj, "js")?,
            session_id: optional_string(obj, "sessionId")?,
        })
    }
}

/// Blank ids count as absent; over-long ids are rejected.
pub fn check_session_id(session_id: Option<&str>) -> Result<Option<&str>, ValidationError> {
    match session_id.map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) if id.chars().count() > MAX_SESSION_ID_LEN => {
            Err(ValidationError::InvalidSessionId(format!(
                "longer than {MAX_SESSION_ID_LEN} characters"
            )))
        }
        Some(id) if id.chars().any(char::is_control) => Err(ValidationError::InvalidSessionId(
            "contains control characters".into(),
        )),
        Some(id) => Ok(Some(id)),
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, ValidationError> {
    value.as_object().ok_or_else(|| {
        ValidationError::Malformed(format!("expected a JSON object, got {}", json_kind(value)))
    })
}

fn history_entry(index: usize, entry: &Value) -> Result<HistoryEntry, ValidationError> {
    let obj = entry.as_object().ok_or_else(|| {
        ValidationError::InvalidHistory(format!("entry {index} is {}", json_kind(entry)))
    })?;
    let text = |key: &str| match obj.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ValidationError::InvalidHistory(format!(
            "entry {index} {key} is {}",
            json_kind(other)
        ))),
    };
    Ok(HistoryEntry {
        role: text("role")?,
        content: text("content")?,
    })
}

/// Missing or null becomes an empty string.
fn string_field(obj: &Map<String, Value>, key: &str) -> Result<String, ValidationError> {
    Ok(optional_string(obj, key)?.unwrap_or_default())
}

fn optional_string(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, ValidationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ValidationError::Malformed(format!(
            "{key} must be a string, got {}",
            json_kind(other)
        ))),
    }
}
