//! User preference enums and theme resolution.

use serde::{Deserialize, Serialize};

/// The persisted theme choice.
///
/// `System` is a placeholder meaning "follow the OS color scheme"; it is never
/// handed to the renderer.  Use [`resolve_theme`] to get a concrete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

/// A theme that can actually be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveTheme {
    Light,
    Dark,
}

/// Resolves the persisted theme against the OS color-scheme preference.
///
/// A persisted `Dark` wins regardless of the OS preference; `System` follows
/// the OS; `Light` is always light.
///
/// ```rust
/// use webui_settings_core::{resolve_theme, EffectiveTheme, Theme};
///
/// assert_eq!(resolve_theme(Theme::System, true), EffectiveTheme::Dark);
/// assert_eq!(resolve_theme(Theme::Light, true), EffectiveTheme::Light);
/// ```
pub fn resolve_theme(theme: Theme, prefers_dark: bool) -> EffectiveTheme {
    match theme {
        Theme::Dark => EffectiveTheme::Dark,
        Theme::System if prefers_dark => EffectiveTheme::Dark,
        Theme::System | Theme::Light => EffectiveTheme::Light,
    }
}

/// UI translation selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    Catalan,
    Chinese,
    English,
    French,
    German,
    Italian,
    Japanese,
    Korean,
    Polish,
    PortugueseBr,
    Russian,
    Spanish,
    Swedish,
    Ukrainian,
    Hungarian,
}

/// Accent color applied on top of the effective theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Default,
    Red,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_theme_truth_table() {
        // dark iff (theme == dark) or (theme == system and OS prefers dark)
        for theme in [Theme::Light, Theme::Dark, Theme::System] {
            for prefers_dark in [false, true] {
                let expected_dark =
                    theme == Theme::Dark || (theme == Theme::System && prefers_dark);
                let expected = if expected_dark {
                    EffectiveTheme::Dark
                } else {
                    EffectiveTheme::Light
                };
                assert_eq!(
                    resolve_theme(theme, prefers_dark),
                    expected,
                    "theme={theme:?} prefers_dark={prefers_dark}"
                );
            }
        }
    }

    #[test]
    fn test_persisted_dark_ignores_light_os_preference() {
        assert_eq!(resolve_theme(Theme::Dark, false), EffectiveTheme::Dark);
    }

    #[test]
    fn test_language_stored_names_are_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Language::PortugueseBr).unwrap(),
            "\"portuguese-br\""
        );
        assert_eq!(serde_json::to_string(&Language::English).unwrap(), "\"english\"");
    }

    #[test]
    fn test_language_rejects_unknown_name() {
        assert!(serde_json::from_str::<Language>("\"klingon\"").is_err());
    }

    #[test]
    fn test_accent_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Accent::Red).unwrap(), "\"red\"");
    }
}
