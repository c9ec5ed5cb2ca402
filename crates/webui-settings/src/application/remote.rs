//! Derived values that need a round trip to the download service.
//!
//! Each node issues exactly one `GET` against the current base URL and maps
//! the response to a plain value.  Failures of any kind (connection refused,
//! non-2xx status, malformed body) are logged and folded into the node's
//! fallback, so callers never see an error:
//!
//! | Node                    | Path                    | Fallback        |
//! |-------------------------|-------------------------|-----------------|
//! | `server_side_cookies`   | `/api/v1/cookies`       | `""`            |
//! | `session_cookies_flag`  | `/api/v1/cookies`       | `""`            |
//! | `saved_templates`       | `/api/v1/template/all`  | empty list      |
//!
//! There is no caching and no deduplication: two concurrent reads issue two
//! requests.  The `try_*` variants expose the error for the reactive runtime,
//! which records it as a failed node state.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use webui_settings_core::{cookies_flag, CookiesResponse, CustomTemplate};

use crate::application::context::SettingsContext;

/// Path of the server-side cookies endpoint.
pub const COOKIES_PATH: &str = "/api/v1/cookies";

/// Path of the saved templates endpoint.
pub const TEMPLATES_PATH: &str = "/api/v1/template/all";

/// Failure of a remote API request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request could not be sent or no response arrived.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("{url} answered HTTP {status}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// The body was not the JSON shape the node expects.
    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Minimal JSON-over-HTTP capability the async nodes need.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Performs a `GET` on `url` and returns the decoded JSON body.
    async fn get_json(&self, url: &str) -> Result<Value, ApiError>;
}

/// The async fetch-derived nodes, bound to a settings context and an API.
#[derive(Clone)]
pub struct RemoteSettings {
    context: Arc<SettingsContext>,
    api: Arc<dyn RemoteApi>,
}

impl RemoteSettings {
    pub fn new(context: Arc<SettingsContext>, api: Arc<dyn RemoteApi>) -> Self {
        Self { context, api }
    }

    pub fn context(&self) -> &Arc<SettingsContext> {
        &self.context
    }

    /// Joins the current base URL and `path` without doubling the separator
    /// when the base ends in `/` (sub-directory deployments).
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.context.base_url();
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    /// Cookies content held by the server for this session.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the request or from decoding `{ "cookies": .. }`.
    pub async fn try_server_side_cookies(&self) -> Result<String, ApiError> {
        let url = self.endpoint(COOKIES_PATH);
        let body = self.api.get_json(&url).await?;
        let resp: CookiesResponse =
            serde_json::from_value(body).map_err(|e| ApiError::Decode {
                url,
                message: e.to_string(),
            })?;
        Ok(resp.cookies)
    }

    /// Saved templates stored on the server.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the request or from decoding the template list.
    pub async fn try_saved_templates(&self) -> Result<Vec<CustomTemplate>, ApiError> {
        let url = self.endpoint(TEMPLATES_PATH);
        let body = self.api.get_json(&url).await?;
        serde_json::from_value(body).map_err(|e| ApiError::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// Cookies content, or `""` when the request fails.
    pub async fn server_side_cookies(&self) -> String {
        match self.try_server_side_cookies().await {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!(error = %e, "server-side cookies unavailable");
                String::new()
            }
        }
    }

    /// `--cookies=cookies.txt` when the server holds cookies, else `""`.
    pub async fn session_cookies_flag(&self) -> String {
        let cookies = self.server_side_cookies().await;
        let flag = cookies_flag(&cookies);
        debug!(enabled = !flag.is_empty(), "resolved session cookies flag");
        flag.to_string()
    }

    /// Saved templates, or an empty list when the request fails.
    pub async fn saved_templates(&self) -> Vec<CustomTemplate> {
        match self.try_saved_templates().await {
            Ok(templates) => templates,
            Err(e) => {
                warn!(error = %e, "saved templates unavailable");
                Vec::new()
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
