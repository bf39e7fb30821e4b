//! Maps conversation messages onto the chat-completions message shape.
//!
//! A message without images keeps its content as a plain string. A message
//! with images becomes an ordered list of parts: an optional leading text
//! part followed by one `image_url` part per image, in the order given.

use serde::{ Deserialize, Serialize };

use crate::models::chat::{ Message, Role };

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: Role,
    pub content: ProviderContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")] Text {
        text: String,
    },
    #[serde(rename = "image_url")] ImageUrl {
        image_url: ImageUrl,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl { image_url: ImageUrl { url: url.into() } }
    }
}

pub fn format_message(msg: &Message) -> ProviderMessage {
    let content = if msg.has_images() {
        let mut parts = Vec::with_capacity(msg.images.len() + 1);
        if !msg.content.trim().is_empty() {
            parts.push(ContentPart::Text { text: msg.content.clone() });
        }
        parts.extend(msg.images.iter().map(|img| ContentPart::image(img.as_str())));
        ProviderContent::Parts(parts)
    } else {
        ProviderContent::Text(msg.content.clone())
    };

    ProviderMessage { role: msg.role, content }
}

pub fn format_messages(messages: &[Message]) -> Vec<ProviderMessage> {
    messages.iter().map(format_message).collect()
}
