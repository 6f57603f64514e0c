use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const DEFAULT_EDIT_MESSAGE: &str = "Code updated successfully";

static SCRIPT_SRC_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<script\s+src=["']script\.js["']\s*>\s*</script>"#)
        .expect("static pattern compiles")
});

static STYLESHEET_LINK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link\s+rel=["']stylesheet["']\s+href=["']style\.css["']\s*/?>"#)
        .expect("static pattern compiles")
});

/// One edit result: the assistant's message plus the three source parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBundle {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub js: String,
}

impl CodeBundle {
    pub fn new(
        message: impl Into<String>,
        html: impl Into<String>,
        css: impl Into<String>,
        js: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            html: html.into(),
            css: css.into(),
            js: js.into(),
        }
    }

    /// The bundle used to fill fields a model response leaves out.
    pub fn as_fallback(&self) -> Self {
        let mut fallback = self.clone();
        if fallback.message.is_empty() {
            fallback.message = DEFAULT_EDIT_MESSAGE.to_string();
        }
        fallback
    }

    /// Joins the parts into a single markup document: html, then an inline
    /// `<style>` and `<script>` block for each non-empty part.
    pub fn combined_markup(&self) -> String {
        let mut doc = strip_asset_links(&self.html);
        if !self.css.is_empty() {
            doc.push_str(&format!("\n<style>\n{}\n</style>", self.css));
        }
        if !self.js.is_empty() {
            doc.push_str(&format!("\n<script>\n{}\n</script>", self.js));
        }
        doc
    }
}

/// Removes `script.js` / `style.css` references; the parts are inlined instead.
pub fn strip_asset_links(html: &str) -> String {
    let without_script = SCRIPT_SRC_TAG.replace_all(html, "");
    STYLESHEET_LINK_TAG
        .replace_all(&without_script, "")
        .into_owned()
}
