use std::sync::{ Arc, Mutex };

use async_trait::async_trait;
use axum::body::{ to_bytes, Body };
use axum::http::{ Request, StatusCode };
use media_chat::llm::chat::format::{ ContentPart, ProviderContent, ProviderMessage };
use media_chat::llm::chat::{ ChatClient, CompletionResponse, ProviderError };
use media_chat::server::api::{ router, AppState };
use serde_json::{ json, Value };
use tower::ServiceExt;

const BODY_LIMIT: usize = 20 * 1024 * 1024;

struct MockProvider {
    reply: Result<String, (u16, String)>,
    seen: Mutex<Vec<Vec<ProviderMessage>>>,
}

impl MockProvider {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(reply.to_string()), seen: Mutex::new(Vec::new()) })
    }

    fn failing(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self { reply: Err((status, body.to_string())), seen: Mutex::new(Vec::new()) })
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClient for MockProvider {
    async fn complete(
        &self,
        messages: &[ProviderMessage]
    ) -> Result<CompletionResponse, ProviderError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        match &self.reply {
            Ok(reply) => Ok(CompletionResponse { response: reply.clone() }),
            Err((status, body)) => Err(ProviderError::Status { status: *status, body: body.clone() }),
        }
    }

    fn get_model(&self) -> String {
        "gpt-4o".to_string()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

async fn post_chat(state: AppState, body: impl Into<Body>) -> (StatusCode, Value) {
    post_chat_limited(state, BODY_LIMIT, body).await
}

async fn post_chat_limited(
    state: AppState,
    limit: usize,
    body: impl Into<Body>
) -> (StatusCode, Value) {
    let app = router(state, limit);
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(body.into())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}

fn with_provider(provider: &Arc<MockProvider>) -> AppState {
    let client: Arc<dyn ChatClient> = provider.clone();
    AppState::new(Some(client))
}

#[tokio::test]
async fn text_message_is_relayed() {
    let provider = MockProvider::replying("hi there");
    let (status, body) = post_chat(
        with_provider(&provider),
        json!({ "messages": [{ "role": "user", "content": "hello" }] }).to_string()
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reply": "hi there" }));

    let seen = provider.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0][0].content, ProviderContent::Text("hello".into()));
}

#[tokio::test]
async fn image_only_message_becomes_single_image_part() {
    let provider = MockProvider::replying("a red pixel");
    let (status, _) = post_chat(
        with_provider(&provider),
        json!({
            "messages": [{ "role": "user", "content": "", "images": ["data:image/png;base64,AAA"] }]
        }).to_string()
    ).await;

    assert_eq!(status, StatusCode::OK);
    let seen = provider.seen.lock().unwrap();
    assert_eq!(
        seen[0][0].content,
        ProviderContent::Parts(vec![ContentPart::image("data:image/png;base64,AAA")])
    );
}

#[tokio::test]
async fn empty_provider_reply_is_returned_as_empty_string() {
    let provider = MockProvider::replying("");
    let (status, body) = post_chat(
        with_provider(&provider),
        json!({ "messages": [{ "role": "user", "content": "hello" }] }).to_string()
    ).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reply": "" }));
}

#[tokio::test]
async fn missing_key_fails_before_any_provider_call() {
    let (status, body) = post_chat(
        AppState::new(None),
        json!({ "messages": [{ "role": "user", "content": "hello" }] }).to_string()
    ).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Missing OpenAI API key" }));
}

#[tokio::test]
async fn missing_key_wins_over_bad_payload() {
    let (status, body) = post_chat(AppState::new(None), "{}").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Missing OpenAI API key" }));
}

#[tokio::test]
async fn invalid_payloads_are_rejected_without_provider_calls() {
    let provider = MockProvider::replying("unused");
    for payload in [
        "{}".to_string(),
        "not json".to_string(),
        json!({ "messages": "hello" }).to_string(),
        json!({ "messages": null }).to_string(),
        json!({ "messages": [] }).to_string(),
        json!({ "messages": [{ "role": "wizard", "content": "x" }] }).to_string(),
    ] {
        let (status, body) = post_chat(with_provider(&provider), payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(body, json!({ "error": "Invalid payload" }));
    }
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn provider_failure_is_a_500_with_message() {
    let provider = MockProvider::failing(429, "Rate limit reached");
    let (status, body) = post_chat(
        with_provider(&provider),
        json!({ "messages": [{ "role": "user", "content": "hello" }] }).to_string()
    ).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Provider returned 429: Rate limit reached" }));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn history_is_formatted_in_order() {
    let provider = MockProvider::replying("ok");
    let (status, _) = post_chat(
        with_provider(&provider),
        json!({
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "what is this?", "images": ["data:a", "data:b"] },
                { "role": "assistant", "content": "two images" },
                { "role": "user", "content": "thanks" }
            ]
        }).to_string()
    ).await;

    assert_eq!(status, StatusCode::OK);
    let seen = provider.seen.lock().unwrap();
    let sent = serde_json::to_value(&seen[0]).unwrap();
    assert_eq!(
        sent,
        json!([
            { "role": "system", "content": "be brief" },
            { "role": "user", "content": [
                { "type": "text", "text": "what is this?" },
                { "type": "image_url", "image_url": { "url": "data:a" } },
                { "type": "image_url", "image_url": { "url": "data:b" } }
            ] },
            { "role": "assistant", "content": "two images" },
            { "role": "user", "content": "thanks" }
        ])
    );
}

#[tokio::test]
async fn health_reports_provider_configuration() {
    let app = router(AppState::new(None), BODY_LIMIT);
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap()).await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok", "provider_configured": false }));
}

#[tokio::test]
async fn oversized_body_is_a_json_400() {
    let provider = MockProvider::replying("unused");
    let payload = json!({
        "messages": [{ "role": "user", "content": "x".repeat(200) }]
    }).to_string();

    let (status, body) = post_chat_limited(with_provider(&provider), 64, payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Payload too large" }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn null_images_are_relayed_as_plain_text() {
    let provider = MockProvider::replying("hi");
    let (status, _) = post_chat(
        with_provider(&provider),
        json!({ "messages": [{ "role": "user", "content": "hello", "images": null }] }).to_string()
    ).await;

    assert_eq!(status, StatusCode::OK);
    let seen = provider.seen.lock().unwrap();
    assert_eq!(seen[0][0].content, ProviderContent::Text("hello".into()));
}
