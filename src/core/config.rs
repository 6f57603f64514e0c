use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::currency::{DEFAULT_CURRENCY_CODE, DEFAULT_EXCHANGE_RATE};
use crate::core::error::ConfigError;
use crate::core::model::{ModelId, PricingEntry, HAIKU_4_5};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const APP_DIR: &str = "tinyplugin-assist";
const LOCAL_CONFIG_FILE: &str = "tinyplugin-assist.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model and output budget for code edits
    #[serde(default = "default_edit_profile")]
    pub edit: RequestProfile,

    /// Model and output budget for color/suggestion analysis
    #[serde(default = "default_analyze_profile")]
    pub analyze: RequestProfile,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Extra or replacement pricing tiers, keyed by model id
    #[serde(default)]
    pub pricing: HashMap<String, PricingEntry>,

    /// Tier charged for unknown model ids
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    #[serde(default)]
    pub currency: CurrencyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestProfile {
    pub model: ModelId,
    pub max_tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    #[serde(default = "default_currency_code")]
    pub code: String,
    /// Units of the secondary currency per USD
    #[serde(default = "default_exchange_rate")]
    pub rate: f64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            code: default_currency_code(),
            rate: default_exchange_rate(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_edit_profile() -> RequestProfile {
    RequestProfile {
        model: ModelId::from(HAIKU_4_5),
        max_tokens: 8192,
    }
}

fn default_analyze_profile() -> RequestProfile {
    RequestProfile {
        model: ModelId::from(HAIKU_4_5),
        max_tokens: 2048,
    }
}

fn default_request_timeout() -> u64 {
    120
}

fn default_fallback_model() -> String {
    HAIKU_4_5.into()
}

fn default_currency_code() -> String {
    DEFAULT_CURRENCY_CODE.into()
}

fn default_exchange_rate() -> f64 {
    DEFAULT_EXCHANGE_RATE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            edit: default_edit_profile(),
            analyze: default_analyze_profile(),
            request_timeout_secs: default_request_timeout(),
            pricing: HashMap::new(),
            fallback_model: default_fallback_model(),
            currency: CurrencyConfig::default(),
        }
    }
}

/// Defaults, then the global config file, then `tinyplugin-assist.json` in
/// the working directory, then environment variables.
pub fn load_config(working_dir: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let wd = working_dir.unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    let mut config = AppConfig::default();

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join(APP_DIR).join("config.json");
        if global_path.exists() {
            merge_config(&mut config, read_config_file(&global_path)?);
        }
    }

    let local_path = wd.join(LOCAL_CONFIG_FILE);
    if local_path.exists() {
        merge_config(&mut config, read_config_file(&local_path)?);
    }

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    Ok(config)
}

pub fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::File(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| ConfigError::Invalid(format!("{}: {e}", path.display())))
}

fn merge_config(base: &mut AppConfig, overlay: AppConfig) {
    if overlay.api_key.is_some() {
        base.api_key = overlay.api_key;
    }
    if overlay.base_url != default_base_url() {
        base.base_url = overlay.base_url;
    }
    if overlay.edit != default_edit_profile() {
        base.edit = overlay.edit;
    }
    if overlay.analyze != default_analyze_profile() {
        base.analyze = overlay.analyze;
    }
    if overlay.request_timeout_secs != default_request_timeout() {
        base.request_timeout_secs = overlay.request_timeout_secs;
    }
    base.pricing.extend(overlay.pricing);
    if overlay.fallback_model != default_fallback_model() {
        base.fallback_model = overlay.fallback_model;
    }
    if overlay.currency.code != default_currency_code() {
        base.currency.code = overlay.currency.code;
    }
    if overlay.currency.rate != default_exchange_rate() {
        base.currency.rate = overlay.currency.rate;
    }
}

/// `lookup` resolves an environment variable name; injected for tests.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
        config.api_key = Some(key);
    }
    if let Some(url) = non_empty("ANTHROPIC_BASE_URL") {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(model) = non_empty("CLAUDE_MODEL") {
        config.edit.model = ModelId(model);
    }
    if let Some(raw) = non_empty("MAX_TOKENS") {
        match raw.trim().parse::<u64>() {
            Ok(n) if n > 0 => config.edit.max_tokens = n,
            _ => tracing::warn!(value = %raw, "ignoring invalid MAX_TOKENS"),
        }
    }
    if let Some(raw) = non_empty("USD_TO_SECONDARY_RATE") {
        match raw.trim().parse::<f64>() {
            Ok(rate) if rate.is_finite() && rate > 0.0 => config.currency.rate = rate,
            _ => tracing::warn!(value = %raw, "ignoring invalid USD_TO_SECONDARY_RATE"),
        }
    }
    if let Some(code) = non_empty("SECONDARY_CURRENCY") {
        config.currency.code = code;
    }
}

impl AppConfig {
    pub fn get_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.get_api_key().is_some()
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
