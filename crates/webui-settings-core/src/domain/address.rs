//! Server address composition and the endpoints derived from it.
//!
//! The UI reaches the download service through one *composed address* built
//! from up to four settings.  Three deployment shapes are supported, checked
//! in this order:
//!
//! ```text
//! 1. reverse proxy with sub-directory   {address}/{sub_dir}/      e.g. host/ytdl/
//! 2. reverse proxy, no sub-directory    {address}                 e.g. host
//! 3. direct connection                  {address}:{port}          e.g. host:3033
//! ```
//!
//! # Normalisation
//!
//! Every shape goes through the same two steps: all literal `"` characters are
//! dropped, then every run of consecutive `/` collapses to a single `/`.  The
//! collapse is applied to runs, not pairwise, so `host///ytdl` becomes
//! `host/ytdl` in one pass and no doubled separator can survive.  The direct
//! shape additionally loses one trailing `/`.

use serde::{Deserialize, Serialize};

use crate::domain::environment::Location;

/// Inputs to [`compose_server_address`], taken from the persisted settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddressParts {
    /// Host name or IP of the download service.
    pub address: String,
    /// Port used by the direct-connection shape.
    pub port: u16,
    /// The UI is served behind a reverse proxy that hides the port.
    pub reverse_proxy: bool,
    /// Proxy sub-directory; empty when the service is mounted at the root.
    pub sub_dir: String,
}

/// Builds the composed server address (no scheme).
///
/// # Example
///
/// ```rust
/// use webui_settings_core::{compose_server_address, ServerAddressParts};
///
/// let parts = ServerAddressParts {
///     address: "host".into(),
///     port: 8080,
///     reverse_proxy: false,
///     sub_dir: String::new(),
/// };
/// assert_eq!(compose_server_address(&parts), "host:8080");
/// ```
pub fn compose_server_address(parts: &ServerAddressParts) -> String {
    let sub_dir = parts.sub_dir.replace('"', "");

    if !sub_dir.is_empty() {
        return normalize(&format!("{}/{}/", parts.address, sub_dir));
    }

    if parts.reverse_proxy {
        return normalize(&parts.address);
    }

    let composed = normalize(&format!("{}:{}", parts.address, parts.port));
    match composed.strip_suffix('/') {
        Some(trimmed) => trimmed.to_string(),
        None => composed,
    }
}

/// `{protocol}//{composed}`, the base for every REST call.
pub fn base_url(location: &Location, composed: &str) -> String {
    format!("{}//{}", location.protocol, composed)
}

/// RPC-over-websocket endpoint: `wss:` on TLS pages, `ws:` otherwise.
pub fn rpc_websocket_endpoint(location: &Location, composed: &str) -> String {
    let proto = if location.is_secure() { "wss:" } else { "ws:" };
    format!("{proto}//{}/rpc/ws", without_trailing_slash(composed))
}

/// RPC-over-HTTP endpoint, using the page's own protocol.
pub fn rpc_http_endpoint(location: &Location, composed: &str) -> String {
    format!(
        "{}//{}/rpc/http",
        location.protocol,
        without_trailing_slash(composed)
    )
}

fn without_trailing_slash(value: &str) -> &str {
    value.strip_suffix('/').unwrap_or(value)
}

/// Drops `"` and collapses every run of `/` to a single `/`.
fn normalize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_slash = false;
    for ch in value.chars() {
        match ch {
            '"' => continue,
            '/' if previous_slash => continue,
            '/' => {
                previous_slash = true;
                out.push(ch);
            }
            _ => {
                previous_slash = false;
                out.push(ch);
            }
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
