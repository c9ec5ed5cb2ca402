//! # webui-settings-core
//!
//! Shared foundation for the yt-dlp Web UI settings layer: typed setting
//! descriptors with their storage codecs, the preference enums (theme,
//! language, accent), and the pure rules that turn persisted values into
//! server URLs and RPC endpoints.
//!
//! This crate performs no I/O.  It never touches storage, the network, or the
//! process environment; callers hand it plain values and get plain values back.
//!
//! # Architecture overview (for beginners)
//!
//! The web UI talks to a remote download service.  Where that service lives
//! is not a single setting but a *composition* of several: the server
//! address, its port, whether the UI is served behind a reverse proxy, and an
//! optional proxy sub-directory.  The UI also needs to know which protocol the
//! page itself was loaded over, so it can pick `ws:` or `wss:` for the RPC
//! websocket.
//!
//! - **`domain::setting`** – `Setting<T>`: a storage key, a default, and a
//!   codec that converts between `T` and the string stored in the backend.
//!
//! - **`domain::preferences`** – `Theme`, `EffectiveTheme`, `Language`,
//!   `Accent`, and the theme resolution rule.
//!
//! - **`domain::address`** – server address composition and the endpoints
//!   derived from it.
//!
//! - **`domain::environment`** – the read-only page location and OS
//!   color-scheme snapshot the derivations consume.
//!
//! - **`domain::template`** – the saved filename/argument templates returned
//!   by the remote API, and the cookies flag.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `webui_settings_core::Setting` instead of the full module path.
pub use domain::address::{
    base_url, compose_server_address, rpc_http_endpoint, rpc_websocket_endpoint, ServerAddressParts,
};
pub use domain::environment::{EnvironmentSnapshot, Location};
pub use domain::preferences::{resolve_theme, Accent, EffectiveTheme, Language, Theme};
pub use domain::setting::{CodecError, Setting, SettingCodec};
pub use domain::template::{cookies_flag, CookiesResponse, CustomTemplate, COOKIES_FLAG};
