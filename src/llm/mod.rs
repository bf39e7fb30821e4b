pub mod chat;

/// Vision-capable model every chat request is sent to.
pub const VISION_MODEL: &str = "gpt-4o";
/// Output-token ceiling for a single reply.
pub const MAX_OUTPUT_TOKENS: u32 = 1000;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            completion_model: None,
            base_url: None,
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

impl LlmConfig {
    pub fn openai(api_key: Option<String>, base_url: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            completion_model: Some(VISION_MODEL.to_string()),
            base_url: base_url.filter(|u| !u.trim().is_empty()),
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_counts_as_missing() {
        let config = LlmConfig::openai(Some("   ".into()), None);
        assert!(config.api_key.is_none());
        assert_eq!(config.completion_model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.max_tokens, 1000);
    }
}
