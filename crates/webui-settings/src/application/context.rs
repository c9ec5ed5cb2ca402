//! The settings context: synchronous derivations and the aggregate snapshot.
//!
//! [`SettingsContext`] is constructed once at startup and passed (usually as
//! an `Arc`) to everything that needs settings.  It owns the catalogue, the
//! typed store, and the environment probe; every derived value is a method
//! that recomputes from the current upstream values on each call.  Nothing
//! derived is ever cached or persisted, so a read after a write always sees
//! the write.
//!
//! # Derivation graph (synchronous part)
//!
//! ```text
//! theme ─────────────────────────┐
//! OS color scheme ───────────────┴─► effective_theme
//!
//! server-addr ┐
//! server-port ├─► composed_server_address ─┬─► base_url
//! reverseProxy│                            ├─► rpc_websocket_endpoint
//! reverseProxySubDir                       └─► rpc_http_endpoint
//!                    page location ────────┘
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use webui_settings_core::domain::address;
use webui_settings_core::{
    resolve_theme, Accent, EffectiveTheme, EnvironmentSnapshot, Language, Location,
    ServerAddressParts,
};

use crate::application::catalog::SettingsCatalog;
use crate::application::store::{KeyValueStore, SettingStore};

/// Read-only access to the host's runtime context.
///
/// Implementations must not cache: each call reflects the environment at call
/// time.
pub trait EnvironmentProbe: Send + Sync {
    /// Protocol, host name and port of the page the UI was loaded from.
    fn current_location(&self) -> Location;

    /// Whether the OS asks for a dark color scheme.
    fn prefers_dark_color_scheme(&self) -> bool;

    /// Reads both inputs into one snapshot.
    fn snapshot(&self) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            location: self.current_location(),
            prefers_dark: self.prefers_dark_color_scheme(),
        }
    }
}

/// Every persisted and synchronously derived value, read in one pass.
///
/// Field names serialize in camelCase, matching the JSON shape the web UI
/// consumes.  Reads are independent, so a write racing the snapshot may be
/// observed for some fields and not for others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    pub server_addr: String,
    pub server_port: u16,
    pub language: Language,
    pub theme: EffectiveTheme,
    pub accent: Accent,
    pub cli_args: String,
    pub format_selection: bool,
    pub file_renaming: bool,
    pub auto_file_extension: bool,
    pub path_overriding: bool,
    pub enable_custom_args: bool,
    pub list_view: bool,
    pub served_from_reverse_proxy: bool,
    pub reverse_proxy_sub_dir: String,
    pub app_title: String,
    pub custom_args: String,
    pub filename_template: String,
    pub server_address: String,
    pub base_url: String,
    pub rpc_websocket_endpoint: String,
    pub rpc_http_endpoint: String,
}

/// Explicit settings context threaded through the application.
pub struct SettingsContext {
    catalog: SettingsCatalog,
    store: SettingStore,
    environment: Arc<dyn EnvironmentProbe>,
}

impl SettingsContext {
    /// Builds the context.  Location-dependent defaults are taken from the
    /// environment as it is at construction time.
    pub fn new(backend: Arc<dyn KeyValueStore>, environment: Arc<dyn EnvironmentProbe>) -> Self {
        let catalog = SettingsCatalog::new(&environment.current_location());
        Self {
            catalog,
            store: SettingStore::new(backend),
            environment,
        }
    }

    pub fn catalog(&self) -> &SettingsCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &SettingStore {
        &self.store
    }

    // ── Derived values ────────────────────────────────────────────────────────

    /// The theme to render: never `system`.
    pub fn effective_theme(&self) -> EffectiveTheme {
        let theme = self.store.get(&self.catalog.theme);
        resolve_theme(theme, self.environment.prefers_dark_color_scheme())
    }

    /// The four settings that determine where the download service lives.
    pub fn server_address_parts(&self) -> ServerAddressParts {
        ServerAddressParts {
            address: self.store.get(&self.catalog.server_address),
            port: self.store.get(&self.catalog.server_port),
            reverse_proxy: self.store.get(&self.catalog.reverse_proxy),
            sub_dir: self.store.get(&self.catalog.reverse_proxy_sub_dir),
        }
    }

    /// Server address without scheme, e.g. `host:3033` or `host/ytdl/`.
    pub fn composed_server_address(&self) -> String {
        address::compose_server_address(&self.server_address_parts())
    }

    /// `{page protocol}//{composed address}`.
    pub fn base_url(&self) -> String {
        let location = self.environment.current_location();
        address::base_url(&location, &self.composed_server_address())
    }

    /// `ws(s)://{address}/rpc/ws`.
    pub fn rpc_websocket_endpoint(&self) -> String {
        let location = self.environment.current_location();
        address::rpc_websocket_endpoint(&location, &self.composed_server_address())
    }

    /// `{page protocol}//{address}/rpc/http`.
    pub fn rpc_http_endpoint(&self) -> String {
        let location = self.environment.current_location();
        address::rpc_http_endpoint(&location, &self.composed_server_address())
    }

    /// Reads every setting and every synchronous derived value.
    ///
    /// The environment is probed once and the composed address computed once,
    /// so all URL fields of one snapshot agree with each other.
    pub fn settings_snapshot(&self) -> SettingsSnapshot {
        let c = &self.catalog;
        let s = &self.store;
        let env = self.environment.snapshot();
        let parts = self.server_address_parts();
        let composed = address::compose_server_address(&parts);

        SettingsSnapshot {
            server_addr: parts.address.clone(),
            server_port: parts.port,
            language: s.get(&c.language),
            theme: resolve_theme(s.get(&c.theme), env.prefers_dark),
            accent: s.get(&c.accent),
            cli_args: s.get(&c.cli_args),
            format_selection: s.get(&c.format_selection),
            file_renaming: s.get(&c.file_renaming),
            auto_file_extension: s.get(&c.auto_file_extension),
            path_overriding: s.get(&c.path_overriding),
            enable_custom_args: s.get(&c.enable_custom_args),
            list_view: s.get(&c.list_view),
            served_from_reverse_proxy: parts.reverse_proxy,
            reverse_proxy_sub_dir: parts.sub_dir.clone(),
            app_title: s.get(&c.app_title),
            custom_args: s.get(&c.custom_args),
            filename_template: s.get(&c.filename_template),
            base_url: address::base_url(&env.location, &composed),
            rpc_websocket_endpoint: address::rpc_websocket_endpoint(&env.location, &composed),
            rpc_http_endpoint: address::rpc_http_endpoint(&env.location, &composed),
            server_address: composed,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::environment::StaticEnvironment;
    use crate::infrastructure::storage::MemoryStore;
    use webui_settings_core::Theme;

    fn make_context(location: Location, prefers_dark: bool) -> (SettingsContext, Arc<StaticEnvironment>) {
        let env = Arc::new(StaticEnvironment::new(location, prefers_dark));
        let ctx = SettingsContext::new(
            Arc::new(MemoryStore::new()),
            Arc::clone(&env) as Arc<dyn EnvironmentProbe>,
        );
        (ctx, env)
    }

    fn direct() -> Location {
        Location::new("http:", "nas.local", "3033")
    }

    // ── effective_theme ───────────────────────────────────────────────────────

    #[test]
    fn test_effective_theme_follows_os_by_default() {
        let (ctx, env) = make_context(direct(), true);
        assert_eq!(ctx.effective_theme(), EffectiveTheme::Dark);

        env.set_prefers_dark(false);
        assert_eq!(ctx.effective_theme(), EffectiveTheme::Light);
    }

    #[test]
    fn test_effective_theme_persisted_dark_wins() {
        let (ctx, _env) = make_context(direct(), false);
        ctx.store().set(&ctx.catalog().theme, &Theme::Dark).unwrap();
        assert_eq!(ctx.effective_theme(), EffectiveTheme::Dark);
    }

    // ── Address derivations ───────────────────────────────────────────────────

    #[test]
    fn test_fresh_install_points_at_page_host_and_port() {
        // Arrange
        let (ctx, _env) = make_context(direct(), false);

        // Act / Assert
        assert_eq!(ctx.composed_server_address(), "nas.local:3033");
        assert_eq!(ctx.base_url(), "http://nas.local:3033");
        assert_eq!(ctx.rpc_websocket_endpoint(), "ws://nas.local:3033/rpc/ws");
        assert_eq!(ctx.rpc_http_endpoint(), "http://nas.local:3033/rpc/http");
    }

    #[test]
    fn test_write_is_visible_to_next_derivation() {
        // Arrange
        let (ctx, _env) = make_context(direct(), false);
        let c = ctx.catalog();

        // Act
        ctx.store().set(&c.server_address, &"10.0.0.2".to_string()).unwrap();
        ctx.store().set(&c.server_port, &8080).unwrap();

        // Assert
        assert_eq!(ctx.composed_server_address(), "10.0.0.2:8080");
    }

    #[test]
    fn test_sub_dir_stored_with_quotes_composes_cleanly() {
        // Arrange: raw write of a doubly-quoted value, as a buggy client would
        let (ctx, _env) = make_context(direct(), false);
        ctx.store().set_raw("server-addr", "\"host\"").unwrap();
        ctx.store().set_raw("reverseProxySubDir", "\"\\\"api\\\"\"").unwrap();

        // Act / Assert
        assert_eq!(ctx.composed_server_address(), "host/api/");
    }

    #[test]
    fn test_navigation_to_https_switches_websocket_scheme() {
        // Arrange
        let (ctx, env) = make_context(direct(), false);
        assert!(ctx.rpc_websocket_endpoint().starts_with("ws:"));

        // Act
        env.navigate(Location::new("https:", "nas.local", "3033"));

        // Assert
        assert!(ctx.rpc_websocket_endpoint().starts_with("wss:"));
        assert!(ctx.base_url().starts_with("https:"));
    }

    // ── settings_snapshot ─────────────────────────────────────────────────────

    #[test]
    fn test_snapshot_matches_individual_derivations() {
        // Arrange
        let (ctx, _env) = make_context(Location::new("https:", "media.example.org", ""), true);
        ctx.store()
            .set(&ctx.catalog().reverse_proxy_sub_dir, &"ytdl".to_string())
            .unwrap();
        ctx.store().set(&ctx.catalog().list_view, &true).unwrap();

        // Act
        let snap = ctx.settings_snapshot();

        // Assert
        assert_eq!(snap.server_address, ctx.composed_server_address());
        assert_eq!(snap.base_url, "https://media.example.org/ytdl/");
        assert_eq!(snap.rpc_websocket_endpoint, ctx.rpc_websocket_endpoint());
        assert_eq!(snap.rpc_http_endpoint, ctx.rpc_http_endpoint());
        assert_eq!(snap.theme, EffectiveTheme::Dark);
        assert!(snap.served_from_reverse_proxy);
        assert!(snap.list_view);
        assert_eq!(snap.app_title, "yt-dlp Web UI");
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let (ctx, _env) = make_context(direct(), false);
        let json = serde_json::to_value(ctx.settings_snapshot()).unwrap();
        assert_eq!(json["serverAddr"], "nas.local");
        assert_eq!(json["servedFromReverseProxy"], false);
        assert_eq!(json["rpcWebsocketEndpoint"], "ws://nas.local:3033/rpc/ws");
    }
}
