//! Storage infrastructure: key-value backends for persisted settings.
//!
//! - `memory` keeps values in a process-local map (tests, `--ephemeral`).
//! - `file` persists values to a TOML file in the platform config directory,
//!   so settings survive restarts.
//!
//! Both store the already-encoded strings produced by the setting codecs; the
//! backends never interpret values.

pub mod file;
pub mod memory;

pub use file::{default_store_path, FileStore};
pub use memory::MemoryStore;
