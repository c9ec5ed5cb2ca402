//! Infrastructure layer for the settings client.
//!
//! Contains the adapters that perform real I/O behind the application
//! layer's traits: key-value storage, the environment probe, and the HTTP
//! client for the remote API.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `webui_settings_core`, but MUST NOT be imported by the `application` layer
//! outside of tests.

pub mod environment;
pub mod http;
pub mod storage;
