use crate::cli::ServeArgs;
use crate::llm::chat::format::format_messages;
use crate::llm::chat::ChatClient;
use crate::models::chat::{ ChatReply, Message };
use crate::server::error::ApiError;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    body::Bytes,
    http::StatusCode,
    routing::{ get, post },
    Router,
    Json,
    extract::{ rejection::BytesRejection, DefaultBodyLimit, State },
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn, error, debug };

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    provider_configured: bool,
}

/// Shared handler state. `provider` is `None` when no credential was configured.
#[derive(Clone)]
pub struct AppState {
    pub provider: Option<Arc<dyn ChatClient>>,
}

impl AppState {
    pub fn new(provider: Option<Arc<dyn ChatClient>>) -> Self {
        Self { provider }
    }
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    args: &ServeArgs,
    state: AppState
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = args.server_addr.parse::<SocketAddr>()?;
    let app = router(state, args.max_body_bytes);

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => (cert, key),
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("Missing TLS certificate or key path".into());
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                return Err("TLS enabled without cert/key".into());
            }
        };
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("HTTPS server listening on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
            e
        })?;
        info!("HTTP server listening on: http://{}", addr);
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

fn parse_messages(body: &[u8]) -> Result<Vec<Message>, ApiError> {
    let mut payload: JsonValue = serde_json::from_slice(body).map_err(|e| {
        warn!("Rejected chat request: body is not JSON ({})", e);
        ApiError::invalid_payload()
    })?;

    let messages = match payload.get_mut("messages") {
        Some(value) if value.is_array() => value.take(),
        _ => {
            warn!("Rejected chat request: `messages` missing or not an array");
            return Err(ApiError::invalid_payload());
        }
    };

    let messages: Vec<Message> = serde_json::from_value(messages).map_err(|e| {
        warn!("Rejected chat request: malformed message ({})", e);
        ApiError::invalid_payload()
    })?;

    if messages.is_empty() {
        warn!("Rejected chat request: `messages` is empty");
        return Err(ApiError::invalid_payload());
    }

    Ok(messages)
}

async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>
) -> Result<Json<ChatReply>, ApiError> {
    let provider = match &state.provider {
        Some(p) => p,
        None => {
            error!("Chat request refused: no provider API key configured");
            return Err(ApiError::missing_api_key());
        }
    };

    let body = body.map_err(|e| {
        warn!("Rejected chat request: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large()
        } else {
            ApiError::invalid_payload()
        }
    })?;
    let messages = parse_messages(&body)?;
    let formatted = format_messages(&messages);
    debug!("Relaying {} message(s) to {}", formatted.len(), provider.get_model());

    match provider.complete(&formatted).await {
        Ok(completion) => Ok(Json(ChatReply { reply: completion.response })),
        Err(e) => {
            error!("Error in chat relay: {}", e);
            Err(e.into())
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider_configured: state.provider.is_some(),
    })
}
