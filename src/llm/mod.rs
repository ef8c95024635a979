pub mod models;
pub mod openai;

use openai::OpenAiProvider;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::config::LlmConfig;
use models::{ChatOptions, ChatResponse, Message};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("Malformed completion response")]
    InvalidResponse,
    #[error("Rate Limited")]
    RateLimited,
}

/// A chat-completion backend used to answer questions the FAQ cannot.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError>;
}

pub struct ProviderFactory;

impl ProviderFactory {
    /// Builds the configured provider. `ollama` and other OpenAI-compatible
    /// servers go through the same client with their own `api_base`.
    pub fn create(config: &LlmConfig) -> Option<Arc<dyn LlmProvider>> {
        match config.provider.as_str() {
            "openai" | "ollama" | "openai-compatible" => Some(Arc::new(OpenAiProvider::new(
                config.api_key.clone(),
                config.api_base.clone(),
                config.model.clone(),
            ))),
            other => {
                warn!("Unknown LLM provider '{}', dynamic answers disabled", other);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            api_base: "http://localhost:11434/v1".to_string(),
            api_key: String::new(),
            model: "llama3".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    #[test]
    fn factory_knows_openai_compatible_providers() {
        assert_eq!(ProviderFactory::create(&config("openai")).unwrap().name(), "openai");
        assert!(ProviderFactory::create(&config("ollama")).is_some());
        assert!(ProviderFactory::create(&config("carrier-pigeon")).is_none());
    }
}
