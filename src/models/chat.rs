use serde::{ Deserialize, Deserializer, Serialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a conversation. `images` holds data URIs and is omitted on
/// the wire when empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: i64,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where D: Deserializer<'de>
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Message {
    pub fn new(id: i64, role: Role, content: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            images,
        }
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_are_optional_on_input() {
        let msg: Message = serde_json::from_str(r#"{"role":"user","content":"hello"}"#).unwrap();
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");
        assert!(msg.images.is_empty());
    }

    #[test]
    fn null_images_mean_no_images() {
        let json = r#"{"role":"user","content":"hello","images":null}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert!(msg.images.is_empty());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let res = serde_json::from_str::<Message>(r#"{"role":"tool","content":"x"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn empty_images_are_not_serialized() {
        let msg = Message::new(7, Role::Assistant, "hi", Vec::new());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, serde_json::json!({ "id": 7, "role": "assistant", "content": "hi" }));
    }
}
