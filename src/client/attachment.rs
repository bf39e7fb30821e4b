//! Image attachments and their inline `data:` URI encoding.

use base64::{ engine::general_purpose::STANDARD, Engine };
use futures::future::try_join_all;
use std::path::{ Path, PathBuf };
use thiserror::Error;

/// Attachments kept per message; extra selections are dropped.
pub const MAX_ATTACHMENTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    File(PathBuf),
    Bytes {
        name: String,
        mime: String,
        data: Vec<u8>,
    },
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to read attachment '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Attachment {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Attachment::File(path.into())
    }

    pub fn from_bytes(name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Attachment::Bytes { name: name.into(), mime: mime.into(), data }
    }

    pub fn name(&self) -> String {
        match self {
            Attachment::File(path) => path.display().to_string(),
            Attachment::Bytes { name, .. } => name.clone(),
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            Attachment::File(path) => mime_for_path(path),
            Attachment::Bytes { mime, .. } => mime,
        }
    }

    pub async fn to_data_uri(&self) -> Result<String, EncodeError> {
        match self {
            Attachment::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| EncodeError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Ok(data_uri(mime_for_path(path), &bytes))
            }
            Attachment::Bytes { mime, data, .. } => Ok(data_uri(mime, data)),
        }
    }
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Encodes every attachment concurrently. The first failure fails the whole batch.
pub async fn encode_all(attachments: &[Attachment]) -> Result<Vec<String>, EncodeError> {
    try_join_all(attachments.iter().map(|a| a.to_data_uri())).await
}
