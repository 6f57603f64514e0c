mod anthropic;

#[cfg(test)]
mod tests;

pub use anthropic::AnthropicProvider;

/// Name of the provider `create_provider` builds.
pub const DEFAULT_PROVIDER: &str = "anthropic";

use crate::core::config::AppConfig;
use crate::core::error::ProviderError;
use crate::core::provider::Provider;
use std::sync::Arc;

pub fn create_provider(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.get_api_key().ok_or_else(|| {
        ProviderError::MissingApiKey(
            "ANTHROPIC_API_KEY not set. Set via env var or config file.".into(),
        )
    })?;

    Ok(Arc::new(AnthropicProvider::new(
        api_key.to_string(),
        config.base_url.clone(),
        config.request_timeout(),
    )))
}
