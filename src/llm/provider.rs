use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crate::config::LLMConfig;
use crate::types::{LLMRequest, LLMResponse, AppResult};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Cheaply cloneable handle over a chat-completion backend.
#[derive(Clone)]
pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
}

impl LLM {
    pub fn new(adapter: Arc<dyn LLMAdapter>) -> Self {
        Self { adapter }
    }

    /// OpenAI-compatible backend built from configuration
    pub fn openai(config: &LLMConfig) -> AppResult<Self> {
        let adapter = crate::llm::openai::OpenAIAdapter::with_options(
            &config.openai_api_key,
            &config.api_base,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::new(Arc::new(adapter)))
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}
