//! Domain layer for the settings core.
//!
//! Pure types and functions with no dependencies on I/O, async runtimes, or
//! the host environment.
//!
//! # What belongs in the domain layer?
//!
//! - Setting descriptors and their codecs
//! - Preference enums and theme resolution
//! - URL composition rules
//!
//! # What does NOT belong here?
//!
//! - Reading or writing the key-value backend
//! - HTTP requests against the remote API
//! - Probing the current page location

pub mod address;
pub mod environment;
pub mod preferences;
pub mod setting;
pub mod template;
