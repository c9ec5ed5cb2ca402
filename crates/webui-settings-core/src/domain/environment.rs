//! Read-only snapshot of the runtime context the derivations depend on.
//!
//! The values mirror what a browser exposes for the page that hosts the UI:
//! `protocol` keeps its trailing colon (`"https:"`) and `port` is the empty
//! string when the page was served on the scheme's default port.

use serde::{Deserialize, Serialize};

/// Protocol / hostname / port of the page the UI was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Scheme including the trailing colon, e.g. `"http:"`.
    pub protocol: String,
    pub hostname: String,
    /// Explicit port, or `""` when the scheme's default port is in use.
    pub port: String,
}

impl Location {
    pub fn new(
        protocol: impl Into<String>,
        hostname: impl Into<String>,
        port: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            hostname: hostname.into(),
            port: port.into(),
        }
    }

    /// `true` when the page was served over TLS.
    pub fn is_secure(&self) -> bool {
        self.protocol == "https:"
    }

    /// `true` when the location has no explicit port, which is how a UI
    /// served from behind a reverse proxy usually looks.
    pub fn has_implicit_port(&self) -> bool {
        self.port.is_empty()
    }

    /// The explicit port, or the scheme's default port when none is set.
    pub fn effective_port(&self) -> u16 {
        match self.port.parse::<u16>() {
            Ok(port) => port,
            Err(_) if self.is_secure() => 443,
            Err(_) => 80,
        }
    }
}

impl Default for Location {
    /// `http://localhost:3033`, the download service's stock listen address.
    fn default() -> Self {
        Self::new("http:", "localhost", "3033")
    }
}

/// Location plus OS color-scheme preference, read once per derivation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub location: Location,
    pub prefers_dark: bool,
}
