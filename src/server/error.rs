use axum::{ http::StatusCode, response::{ IntoResponse, Response }, Json };
use thiserror::Error;

use crate::llm::chat::ProviderError;
use crate::models::chat::ErrorBody;

/// Every failure of a chat request. All of them end the request; none are retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Provider(String),
}

impl ApiError {
    pub fn invalid_payload() -> Self {
        ApiError::Validation("Invalid payload".to_string())
    }

    pub fn payload_too_large() -> Self {
        ApiError::Validation("Payload too large".to_string())
    }

    pub fn missing_api_key() -> Self {
        ApiError::Configuration("Missing OpenAI API key".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Configuration(_) | ApiError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError::Provider(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
