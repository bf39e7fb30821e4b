use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::models::chat::{ ChatReply, ChatRequest, Message };

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid relay URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Relay error ({status}): {message}")]
    Relay {
        status: u16,
        message: String,
    },
    #[error("Unreadable relay response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends the whole conversation and returns the assistant reply.
    async fn send(&self, messages: &[Message]) -> Result<ChatReply, TransportError>;
}

#[derive(Deserialize)]
struct RelayBody {
    reply: Option<String>,
    error: Option<String>,
}

pub struct HttpChatTransport {
    http: HttpClient,
    endpoint: Url,
}

impl HttpChatTransport {
    pub fn new(relay_url: &str) -> Result<Self, TransportError> {
        let mut base = Url::parse(relay_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join("api/chat")?;

        Ok(Self { http: HttpClient::new(), endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(&self, messages: &[Message]) -> Result<ChatReply, TransportError> {
        debug!("POST {} with {} message(s)", self.endpoint, messages.len());
        let resp = self.http
            .post(self.endpoint.clone())
            .json(&ChatRequest { messages: messages.to_vec() })
            .send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        let body: RelayBody = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Relay { status: status.as_u16(), message: text });
            }
            Err(e) => {
                return Err(e.into());
            }
        };

        if let Some(message) = body.error {
            return Err(TransportError::Relay { status: status.as_u16(), message });
        }
        if !status.is_success() {
            return Err(TransportError::Relay { status: status.as_u16(), message: text });
        }

        Ok(ChatReply { reply: body.reply.unwrap_or_default() })
    }
}
