//! The catalogue of every persisted setting.
//!
//! [`SettingsCatalog`] is built once at startup.  A few defaults depend on the
//! page the UI was loaded from (the server address defaults to the page's
//! host name, and a page without an explicit port is assumed to sit behind a
//! reverse proxy), so construction takes the initial [`Location`].
//!
//! Besides the typed fields, the catalogue offers key-based access for tools
//! that only know a setting by its storage key (the CLI's `get` / `set`).

use serde_json::Value;
use thiserror::Error;

use webui_settings_core::{
    Accent, CodecError, Language, Location, Setting, SettingCodec, Theme,
};

use crate::application::store::SettingStore;

/// Default yt-dlp arguments for a fresh install.
pub const DEFAULT_CLI_ARGS: &str = "--no-mtime";

/// Default window / header title.
pub const DEFAULT_APP_TITLE: &str = "yt-dlp Web UI";

/// Error from key-based catalogue access.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No setting is stored under this key.
    #[error("unknown setting key {0:?}")]
    UnknownKey(String),

    /// The input is not a valid value for the setting.
    #[error("invalid value for {key:?}: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: CodecError,
    },

    /// The current value could not be rendered as JSON.
    #[error("failed to render {key:?} as JSON: {source}")]
    Render {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Every persisted setting of the UI.
#[derive(Debug, Clone)]
pub struct SettingsCatalog {
    pub language: Setting<Language>,
    pub theme: Setting<Theme>,
    pub server_address: Setting<String>,
    pub server_port: Setting<u16>,
    pub cli_args: Setting<String>,
    pub format_selection: Setting<bool>,
    pub file_renaming: Setting<bool>,
    pub auto_file_extension: Setting<bool>,
    pub path_overriding: Setting<bool>,
    pub enable_custom_args: Setting<bool>,
    pub list_view: Setting<bool>,
    pub reverse_proxy: Setting<bool>,
    pub reverse_proxy_sub_dir: Setting<String>,
    pub app_title: Setting<String>,
    pub accent: Setting<Accent>,
    pub custom_args: Setting<String>,
    pub filename_template: Setting<String>,
}

/// Borrowed view of one catalogue entry, erased to its value kind.
enum Entry<'a> {
    Text(&'a Setting<String>),
    Flag(&'a Setting<bool>),
    Port(&'a Setting<u16>),
    Theme(&'a Setting<Theme>),
    Language(&'a Setting<Language>),
    Accent(&'a Setting<Accent>),
}

impl SettingsCatalog {
    /// Builds the catalogue with defaults derived from `location`.
    pub fn new(location: &Location) -> Self {
        Self {
            language: Setting::new("language", Language::English, SettingCodec::json()),
            theme: Setting::new("theme", Theme::System, SettingCodec::json()),
            server_address: Setting::new(
                "server-addr",
                location.hostname.clone(),
                SettingCodec::bare_text(),
            ),
            server_port: Setting::new(
                "server-port",
                location.effective_port(),
                SettingCodec::port(),
            ),
            cli_args: Setting::new(
                "cli-args",
                DEFAULT_CLI_ARGS.to_string(),
                SettingCodec::text(),
            ),
            format_selection: Setting::new("format-selection", false, SettingCodec::flag()),
            file_renaming: Setting::new("file-renaming", false, SettingCodec::flag()),
            auto_file_extension: Setting::new("auto-file-extension", false, SettingCodec::flag()),
            path_overriding: Setting::new("path-overriding", false, SettingCodec::flag()),
            enable_custom_args: Setting::new("enable-custom-args", false, SettingCodec::flag()),
            list_view: Setting::new("listview", false, SettingCodec::flag()),
            reverse_proxy: Setting::new(
                "reverseProxy",
                location.has_implicit_port(),
                SettingCodec::flag(),
            ),
            reverse_proxy_sub_dir: Setting::new(
                "reverseProxySubDir",
                String::new(),
                SettingCodec::bare_text(),
            ),
            app_title: Setting::new(
                "appTitle",
                DEFAULT_APP_TITLE.to_string(),
                SettingCodec::text(),
            ),
            accent: Setting::new("accent-color", Accent::Default, SettingCodec::json()),
            custom_args: Setting::new("customArgs", String::new(), SettingCodec::text()),
            filename_template: Setting::new(
                "lastFilenameTemplate",
                String::new(),
                SettingCodec::text(),
            ),
        }
    }

    /// Storage keys of every setting, in catalogue order.
    pub fn keys(&self) -> Vec<&'static str> {
        vec![
            self.language.key(),
            self.theme.key(),
            self.server_address.key(),
            self.server_port.key(),
            self.cli_args.key(),
            self.format_selection.key(),
            self.file_renaming.key(),
            self.auto_file_extension.key(),
            self.path_overriding.key(),
            self.enable_custom_args.key(),
            self.list_view.key(),
            self.reverse_proxy.key(),
            self.reverse_proxy_sub_dir.key(),
            self.app_title.key(),
            self.accent.key(),
            self.custom_args.key(),
            self.filename_template.key(),
        ]
    }

    fn entry(&self, key: &str) -> Option<Entry<'_>> {
        let texts = [
            &self.server_address,
            &self.cli_args,
            &self.reverse_proxy_sub_dir,
            &self.app_title,
            &self.custom_args,
            &self.filename_template,
        ];
        if let Some(s) = texts.into_iter().find(|s| s.key() == key) {
            return Some(Entry::Text(s));
        }
        let flags = [
            &self.format_selection,
            &self.file_renaming,
            &self.auto_file_extension,
            &self.path_overriding,
            &self.enable_custom_args,
            &self.list_view,
            &self.reverse_proxy,
        ];
        if let Some(s) = flags.into_iter().find(|s| s.key() == key) {
            return Some(Entry::Flag(s));
        }
        match key {
            k if k == self.server_port.key() => Some(Entry::Port(&self.server_port)),
            k if k == self.theme.key() => Some(Entry::Theme(&self.theme)),
            k if k == self.language.key() => Some(Entry::Language(&self.language)),
            k if k == self.accent.key() => Some(Entry::Accent(&self.accent)),
            _ => None,
        }
    }

    /// Validates `input` for the setting stored under `key` and returns the
    /// canonical stored form.
    ///
    /// # Errors
    ///
    /// [`CatalogError::UnknownKey`] for keys outside the catalogue,
    /// [`CatalogError::InvalidValue`] when the codec rejects `input`.
    pub fn canonicalize(&self, key: &str, input: &str) -> Result<String, CatalogError> {
        let entry = self
            .entry(key)
            .ok_or_else(|| CatalogError::UnknownKey(key.to_string()))?;
        let result = match entry {
            Entry::Text(s) => s.canonicalize(input),
            Entry::Flag(s) => s.canonicalize(input),
            Entry::Port(s) => s.canonicalize(input),
            Entry::Theme(s) => s.canonicalize(input),
            Entry::Language(s) => s.canonicalize(input),
            Entry::Accent(s) => s.canonicalize(input),
        };
        result.map_err(|source| CatalogError::InvalidValue {
            key: key.to_string(),
            source,
        })
    }

    /// Reads the current value of the setting under `key` as JSON.
    ///
    /// # Errors
    ///
    /// [`CatalogError::UnknownKey`] for keys outside the catalogue.
    pub fn current_json(&self, store: &SettingStore, key: &str) -> Result<Value, CatalogError> {
        let entry = self
            .entry(key)
            .ok_or_else(|| CatalogError::UnknownKey(key.to_string()))?;
        let rendered = match entry {
            Entry::Text(s) => Ok(Value::from(store.get(s))),
            Entry::Flag(s) => Ok(Value::from(store.get(s))),
            Entry::Port(s) => Ok(Value::from(store.get(s))),
            Entry::Theme(s) => serde_json::to_value(store.get(s)),
            Entry::Language(s) => serde_json::to_value(store.get(s)),
            Entry::Accent(s) => serde_json::to_value(store.get(s)),
        };
        rendered.map_err(|source| CatalogError::Render {
            key: key.to_string(),
            source,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
