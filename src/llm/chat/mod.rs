pub mod format;
pub mod openai;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use super::LlmConfig;
use self::format::ProviderMessage;
use self::openai::OpenAIChatClient;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub response: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("{0}")]
    Config(String),
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Runs one non-streaming completion over the given conversation.
    async fn complete(
        &self,
        messages: &[ProviderMessage]
    ) -> Result<CompletionResponse, ProviderError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

/// Builds the provider client, or `None` when no credential is configured.
pub fn new_client(config: &LlmConfig) -> Result<Option<Arc<dyn ChatClient>>, ProviderError> {
    if config.api_key.is_none() {
        return Ok(None);
    }
    let client: Arc<dyn ChatClient> = Arc::new(OpenAIChatClient::from_config(config)?);
    Ok(Some(client))
}
