//! webui-settings library crate.
//!
//! Client-side settings layer for the yt-dlp Web UI: persisted user
//! preferences plus the values derived from them (server URLs, RPC endpoints,
//! effective theme, cookies flag, saved templates).
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! UI / CLI
//!    ↕
//! [webui-settings]
//!   ├── application/
//!   │     ├── catalog      Every persisted Setting, defaults from the environment
//!   │     ├── store        Typed get/set over the key-value backend
//!   │     ├── context      Synchronous derivations + aggregate snapshot
//!   │     ├── remote       Async derivations against the remote API
//!   │     └── reactive     Dependency graph, async node state, refresh loop
//!   └── infrastructure/
//!         ├── storage/     In-memory and TOML-file key-value backends
//!         ├── environment  Page location / color-scheme probes
//!         └── http         reqwest-based remote API client
//! ```
//!
//! # Layer rules
//!
//! - `application` depends on `webui-settings-core` and on the traits it
//!   declares (`KeyValueStore`, `EnvironmentProbe`, `RemoteApi`), never on
//!   concrete infrastructure types.
//! - `infrastructure` implements those traits with real I/O.

/// Application layer: settings store, derivations, reactive runtime.
pub mod application;

/// Infrastructure layer: storage backends, environment probes, HTTP client.
pub mod infrastructure;
