//! yt-dlp Web UI settings tool: entry point.
//!
//! Inspects and edits the persisted Web UI settings from a terminal and shows
//! the values the UI would derive from them: where the download service
//! lives, which RPC endpoints it would connect to, whether the session has
//! server-side cookies, and which templates are saved on the server.
//!
//! # Usage
//!
//! ```text
//! webui-settings [OPTIONS] <COMMAND>
//!
//! Commands:
//!   show        Print every setting and derived value as JSON
//!   get <KEY>   Print one setting as JSON
//!   set <KEY> <VALUE>
//!               Validate and store one setting
//!   endpoints   Print the base URL and RPC endpoints
//!   remote      Query the download service (cookies flag, saved templates)
//!   watch       Keep the async values up to date until Ctrl+C
//!
//! Options:
//!   --location <URL>   Page the UI is served from [default: http://localhost:3033]
//!   --prefers-dark     Treat the OS as preferring a dark color scheme
//!   --store <PATH>     Settings file [default: platform config directory]
//!   --ephemeral        Keep settings in memory only
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable               | Default                  | Description              |
//! |------------------------|--------------------------|--------------------------|
//! | `WEBUI_LOCATION`       | `http://localhost:3033`  | Page location            |
//! | `WEBUI_PREFERS_DARK`   | `false`                  | OS dark-mode preference  |
//! | `WEBUI_SETTINGS_FILE`  | platform config dir      | Settings TOML file       |
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr so the
//! JSON on stdout stays pipeable.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use webui_settings::application::{
    EnvironmentProbe, KeyValueStore, ReactiveSettings, RemoteSettings, SettingsContext,
};
use webui_settings::infrastructure::environment::StaticEnvironment;
use webui_settings::infrastructure::http::HttpApi;
use webui_settings::infrastructure::storage::{default_store_path, FileStore, MemoryStore};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Inspect and edit yt-dlp Web UI settings.
#[derive(Debug, Parser)]
#[command(
    name = "webui-settings",
    about = "Persisted settings and derived configuration for the yt-dlp Web UI",
    version
)]
struct Cli {
    /// URL of the page the UI is served from.
    ///
    /// Its scheme picks `ws:` or `wss:` for the RPC socket, and its host and
    /// port are the defaults for the server address settings.
    #[arg(
        long,
        global = true,
        default_value = "http://localhost:3033",
        env = "WEBUI_LOCATION"
    )]
    location: String,

    /// Treat the OS as preferring a dark color scheme.
    #[arg(long, global = true, env = "WEBUI_PREFERS_DARK")]
    prefers_dark: bool,

    /// Settings file to use instead of the platform default.
    #[arg(long, global = true, env = "WEBUI_SETTINGS_FILE")]
    store: Option<PathBuf>,

    /// Keep settings in memory only; nothing is read from or written to disk.
    #[arg(long, global = true, conflicts_with = "store")]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Print every setting and derived value as JSON.
    Show,
    /// Print the current value of one setting as JSON.
    Get {
        /// Storage key, e.g. `server-port` or `reverseProxySubDir`.
        key: String,
    },
    /// Validate and store one setting.
    Set {
        key: String,
        /// New value, either JSON (`"dark"`, `8080`, `true`) or bare text.
        value: String,
    },
    /// Print the base URL and RPC endpoints.
    Endpoints,
    /// Query the download service for the async values.
    Remote,
    /// Keep the async values up to date until Ctrl+C.
    Watch,
}

impl Cli {
    /// Opens the configured key-value backend.
    ///
    /// # Errors
    ///
    /// Returns an error when no `--store` was given and the platform config
    /// directory cannot be determined.
    fn open_backend(&self) -> anyhow::Result<Arc<dyn KeyValueStore>> {
        if self.ephemeral {
            return Ok(Arc::new(MemoryStore::new()));
        }
        let path = match &self.store {
            Some(path) => path.clone(),
            None => default_store_path().context("cannot locate the settings file")?,
        };
        let store = FileStore::new(path);
        info!(path = %store.path().display(), "using settings file");
        Ok(Arc::new(store))
    }

    /// Builds the settings context from the global options.
    ///
    /// # Errors
    ///
    /// Returns an error if `--location` is not an http(s) URL or the backend
    /// cannot be opened.
    fn build_context(&self) -> anyhow::Result<Arc<SettingsContext>> {
        let environment = StaticEnvironment::from_url(&self.location, self.prefers_dark)
            .with_context(|| format!("invalid --location '{}'", self.location))?;
        let backend = self.open_backend()?;
        Ok(Arc::new(SettingsContext::new(
            backend,
            Arc::new(environment) as Arc<dyn EnvironmentProbe>,
        )))
    }
}

// ── Command execution ─────────────────────────────────────────────────────────

/// Runs the commands that need no network access and returns their output.
///
/// Returns `Ok(None)` for the commands that do (`remote`, `watch`).
///
/// # Errors
///
/// `get` / `set` fail on an unknown key, `set` on a value the setting's codec
/// rejects or on a backend write failure.
fn execute_local(command: &Command, ctx: &SettingsContext) -> anyhow::Result<Option<String>> {
    let output = match command {
        Command::Show => serde_json::to_string_pretty(&ctx.settings_snapshot())?,
        Command::Get { key } => {
            let value = ctx.catalog().current_json(ctx.store(), key)?;
            serde_json::to_string(&value)?
        }
        Command::Set { key, value } => {
            let encoded = ctx.catalog().canonicalize(key, value)?;
            ctx.store()
                .set_raw(key, &encoded)
                .with_context(|| format!("failed to store '{key}'"))?;
            let current = ctx.catalog().current_json(ctx.store(), key)?;
            format!("{key} = {current}")
        }
        Command::Endpoints => serde_json::to_string_pretty(&json!({
            "serverAddress": ctx.composed_server_address(),
            "baseUrl": ctx.base_url(),
            "rpcWebsocketEndpoint": ctx.rpc_websocket_endpoint(),
            "rpcHttpEndpoint": ctx.rpc_http_endpoint(),
        }))?,
        Command::Remote | Command::Watch => return Ok(None),
    };
    Ok(Some(output))
}

/// Resolves both async nodes concurrently and renders them as JSON.
async fn query_remote(remote: &RemoteSettings) -> anyhow::Result<String> {
    let (flag, templates) = tokio::join!(remote.session_cookies_flag(), remote.saved_templates());
    Ok(serde_json::to_string_pretty(&json!({
        "baseUrl": remote.context().base_url(),
        "sessionCookiesFlag": flag,
        "savedTemplates": templates,
    }))?)
}

/// Runs the reactive runtime and logs every async state change until
/// `running` is cleared.
async fn watch(reactive: Arc<ReactiveSettings>, running: Arc<AtomicBool>) {
    let mut cookies = reactive.cookies().subscribe();
    let mut templates = reactive.templates().subscribe();
    let observer_running = Arc::clone(&running);
    let observer_reactive = Arc::clone(&reactive);

    let observer = tokio::spawn(async move {
        while observer_running.load(Ordering::Relaxed) {
            tokio::select! {
                Ok(()) = cookies.changed() => {
                    let flag = observer_reactive.session_cookies_flag();
                    info!(state = ?flag, "session cookies flag");
                }
                Ok(()) = templates.changed() => {
                    let state = templates.borrow_and_update().clone();
                    info!(state = ?state, "saved templates");
                }
                () = tokio::time::sleep(std::time::Duration::from_millis(200)) => {}
            }
        }
    });

    reactive.run(running).await;
    let _ = observer.await;
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised, writing to stderr.  The log level
///    is controlled by `RUST_LOG` (e.g. `RUST_LOG=debug`).
/// 2. CLI arguments are parsed with `clap`.
/// 3. The settings context is built from `--location`, `--prefers-dark` and
///    the chosen backend.
/// 4. The command runs; `watch` additionally installs a Ctrl+C handler that
///    clears a shared `AtomicBool`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = cli.build_context()?;

    if let Some(output) = execute_local(&cli.command, &ctx)? {
        println!("{output}");
        return Ok(());
    }

    let remote = RemoteSettings::new(Arc::clone(&ctx), Arc::new(HttpApi::new()));
    match cli.command {
        Command::Remote => println!("{}", query_remote(&remote).await?),
        Command::Watch => {
            let running = Arc::new(AtomicBool::new(true));
            let running_clone = Arc::clone(&running);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("received Ctrl+C, shutting down");
                        running_clone.store(false, Ordering::Relaxed);
                    }
                    Err(e) => {
                        tracing::error!("failed to listen for Ctrl+C signal: {e}");
                    }
                }
            });

            info!(base_url = %ctx.base_url(), "watching settings");
            watch(ReactiveSettings::new(remote), running).await;
        }
        _ => {}
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
