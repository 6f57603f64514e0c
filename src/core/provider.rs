use async_trait::async_trait;

use crate::core::error::ProviderError;
use crate::core::message::{ChatMessage, TokenUsage};
use crate::core::model::ModelId;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: ModelId,
    pub max_output_tokens: u64,
    pub system_prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: TokenUsage,
}

/// The external text-generation service.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError>;

    fn name(&self) -> &str;
}
