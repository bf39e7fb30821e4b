pub mod api;
pub mod error;

use crate::cli::ServeArgs;
use crate::llm::chat::ChatClient;
use std::error::Error;
use std::sync::Arc;
use log::{ info, warn };

pub struct Server {
    provider: Option<Arc<dyn ChatClient>>,
    args: ServeArgs,
}

impl Server {
    pub fn new(provider: Option<Arc<dyn ChatClient>>, args: ServeArgs) -> Self {
        match &provider {
            Some(p) =>
                info!(
                    "Chat relay configured for model {} at {}",
                    p.get_model(),
                    p.get_base_url().as_deref().unwrap_or("provider default")
                ),
            None =>
                warn!(
                    "Server configured WITHOUT a provider API key. Every chat request will fail until OPENAI_API_KEY is set."
                ),
        }

        Self { provider, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let state = api::AppState::new(self.provider.clone());
        api::start_http_server(&self.args, state).await
    }
}
