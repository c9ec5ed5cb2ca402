//! Application layer for the settings client.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure rules, here `webui-settings-core`) and the infrastructure (storage
//! files, HTTP, the host environment).  It depends on abstractions
//! (traits) rather than on concrete implementations, so the infrastructure
//! can be swapped without touching this code.
//!
//! # Sub-modules
//!
//! - **`store`**    – `KeyValueStore` trait and the typed `SettingStore`.
//! - **`catalog`**  – every persisted `Setting` with its key and default.
//! - **`context`**  – `SettingsContext`: synchronous derivations and the
//!   aggregate `SettingsSnapshot`; declares the `EnvironmentProbe` trait.
//! - **`remote`**   – `RemoteApi` trait and the async nodes (cookies flag,
//!   saved templates) with their fallbacks.
//! - **`reactive`** – dependency graph, `AsyncNode` state, and the refresh
//!   loop that keeps async nodes in step with store writes.

pub mod catalog;
pub mod context;
pub mod reactive;
pub mod remote;
pub mod store;

pub use catalog::{CatalogError, SettingsCatalog};
pub use context::{EnvironmentProbe, SettingsContext, SettingsSnapshot};
pub use reactive::{AsyncNode, AsyncState, NodeId, ReactiveSettings};
pub use remote::{ApiError, RemoteApi, RemoteSettings};
pub use store::{KeyValueStore, SettingChange, SettingStore, StoreError};
