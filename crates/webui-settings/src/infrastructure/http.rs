//! reqwest-based implementation of [`RemoteApi`].
//!
//! One `GET` per call, no retries and no caching.  The response body is read
//! in full before the status is checked so that error bodies can be reported:
//!
//! | Outcome                          | Result                   |
//! |----------------------------------|--------------------------|
//! | send / connect / read failure    | `ApiError::Request`      |
//! | non-2xx status                   | `ApiError::Http`         |
//! | 2xx with a body that isn't JSON  | `ApiError::Decode`       |

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::application::remote::{ApiError, RemoteApi};

/// Error bodies longer than this are cut before being put into an error.
const MAX_ERROR_BODY_CHARS: usize = 256;

/// HTTP client for the download service's JSON API.
#[derive(Debug, Clone, Default)]
pub struct HttpApi {
    http: reqwest::Client,
}

impl HttpApi {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        decode_json_response(url, response).await
    }
}

async fn decode_json_response(url: &str, response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(|e| ApiError::Request {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if !status.is_success() {
        return Err(ApiError::Http {
            url: url.to_string(),
            status: status.as_u16(),
            body: truncate_body(&bytes),
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn truncate_body(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
