//! Environment probes: where the UI was "loaded from" and which color scheme
//! the OS prefers.
//!
//! Outside a browser there is no page location, so the CLI describes it with a
//! URL (`--location https://media.example.org`) and [`parse_location`] turns
//! that into the browser-style [`Location`] the derivations expect.
//!
//! [`StaticEnvironment`] holds both inputs behind a lock.  They can be changed
//! at runtime (`navigate`, `set_prefers_dark`), and every probe call returns
//! the values as they are at that moment.

use std::sync::RwLock;

use reqwest::Url;
use thiserror::Error;
use tracing::debug;

use webui_settings_core::Location;

use crate::application::context::EnvironmentProbe;

/// Error produced when a location URL cannot be used as a page location.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    /// The text is not a valid absolute URL.
    #[error("invalid location URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Only pages served over HTTP(S) can host the UI.
    #[error("unsupported location scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),

    /// The URL has no host name.
    #[error("location URL {0:?} has no host")]
    MissingHost(String),
}

/// Converts an absolute `http(s)://host[:port]` URL into a [`Location`].
///
/// The port is left empty when the URL uses the scheme's default port, which
/// is how a browser reports it (`https://host:443` has `port == ""`).
///
/// # Errors
///
/// See [`LocationError`].
pub fn parse_location(url: &str) -> Result<Location, LocationError> {
    let parsed = Url::parse(url).map_err(|e| LocationError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(LocationError::UnsupportedScheme(scheme.to_string()));
    }

    let hostname = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| LocationError::MissingHost(url.to_string()))?;

    // `Url::port` is `None` for the scheme's default port.
    let port = parsed.port().map(|p| p.to_string()).unwrap_or_default();

    Ok(Location::new(format!("{scheme}:"), hostname, port))
}

#[derive(Debug)]
struct EnvironmentState {
    location: Location,
    prefers_dark: bool,
}

/// Environment probe backed by explicitly provided values.
#[derive(Debug)]
pub struct StaticEnvironment {
    state: RwLock<EnvironmentState>,
}

impl StaticEnvironment {
    pub fn new(location: Location, prefers_dark: bool) -> Self {
        Self {
            state: RwLock::new(EnvironmentState {
                location,
                prefers_dark,
            }),
        }
    }

    /// Parses `url` with [`parse_location`] and builds the probe.
    ///
    /// # Errors
    ///
    /// Returns the [`LocationError`] from parsing.
    pub fn from_url(url: &str, prefers_dark: bool) -> Result<Self, LocationError> {
        Ok(Self::new(parse_location(url)?, prefers_dark))
    }

    /// Simulates a page navigation.
    pub fn navigate(&self, location: Location) {
        debug!(?location, "page location changed");
        if let Ok(mut state) = self.state.write() {
            state.location = location;
        }
    }

    /// Simulates the OS switching color scheme.
    pub fn set_prefers_dark(&self, prefers_dark: bool) {
        if let Ok(mut state) = self.state.write() {
            state.prefers_dark = prefers_dark;
        }
    }
}

impl Default for StaticEnvironment {
    fn default() -> Self {
        Self::new(Location::default(), false)
    }
}

impl EnvironmentProbe for StaticEnvironment {
    fn current_location(&self) -> Location {
        self.state
            .read()
            .map(|s| s.location.clone())
            .unwrap_or_default()
    }

    fn prefers_dark_color_scheme(&self) -> bool {
        self.state.read().map(|s| s.prefers_dark).unwrap_or(false)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_location ────────────────────────────────────────────────────────

    #[test]
    fn test_parse_location_with_explicit_port() {
        let loc = parse_location("http://nas.local:3033").unwrap();
        assert_eq!(loc, Location::new("http:", "nas.local", "3033"));
    }

    #[test]
    fn test_parse_location_default_port_is_empty() {
        // Arrange / Act
        let implicit = parse_location("https://media.example.org/").unwrap();
        let explicit_default = parse_location("https://media.example.org:443").unwrap();

        // Assert
        assert_eq!(implicit.port, "");
        assert_eq!(explicit_default.port, "");
        assert!(implicit.is_secure());
    }

    #[test]
    fn test_parse_location_ignores_path() {
        let loc = parse_location("http://10.0.0.2:8080/ytdl/?q=1").unwrap();
        assert_eq!(loc.hostname, "10.0.0.2");
        assert_eq!(loc.port, "8080");
    }

    #[test]
    fn test_parse_location_rejects_non_http_scheme() {
        assert_eq!(
            parse_location("ftp://nas.local"),
            Err(LocationError::UnsupportedScheme("ftp".to_string()))
        );
    }

    #[test]
    fn test_parse_location_rejects_garbage() {
        assert!(matches!(
            parse_location("not a url"),
            Err(LocationError::InvalidUrl { .. })
        ));
    }

    // ── StaticEnvironment ─────────────────────────────────────────────────────

    #[test]
    fn test_probe_reflects_changes_immediately() {
        // Arrange
        let env = StaticEnvironment::default();
        assert!(!env.prefers_dark_color_scheme());

        // Act
        env.set_prefers_dark(true);
        env.navigate(Location::new("https:", "media.example.org", ""));

        // Assert
        let snap = env.snapshot();
        assert!(snap.prefers_dark);
        assert_eq!(snap.location.hostname, "media.example.org");
    }

    #[test]
    fn test_from_url_builds_probe() {
        let env = StaticEnvironment::from_url("http://localhost:3033", true).unwrap();
        assert_eq!(env.current_location(), Location::default());
        assert!(env.prefers_dark_color_scheme());
    }
}
