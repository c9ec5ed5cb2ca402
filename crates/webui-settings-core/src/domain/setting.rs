//! Typed setting descriptors and their storage codecs.
//!
//! The key-value backend only stores strings.  A [`Setting<T>`] pairs a
//! storage key with a default value and a [`SettingCodec<T>`] that converts
//! between `T` and its canonical stored string.
//!
//! # Stored representation
//!
//! Values are stored JSON-encoded: strings carry their surrounding quotes
//! (`"host"`), booleans are `true`/`false`, enums are their lowercase name in
//! quotes (`"dark"`).  This matches what the browser storage layer of the web
//! UI has always written, so stores created by older front-ends load as-is.
//!
//! Decoders are lenient towards two artifacts found in real stores:
//!
//! - values written *without* JSON quoting (`host` instead of `"host"`);
//! - values written *twice* JSON-quoted (`"\"host\""`), which the
//!   [`SettingCodec::bare_text`] codec cleans up by dropping every literal `"`.
//!
//! Keeping that cleanup inside the codec means every consumer of a decoded
//! setting sees a clean value; URL composition never has to guess.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Error produced when a stored string cannot be converted to or from a
/// setting's value type.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The stored string is not valid JSON for the expected type.
    #[error("invalid JSON value: {0}")]
    Json(#[from] serde_json::Error),

    /// A boolean setting held something other than `true` or `false`.
    #[error("expected `true` or `false`, got {0:?}")]
    InvalidFlag(String),

    /// A port setting held something that is not a number in `1..=65535`.
    #[error("invalid port number {0:?}")]
    InvalidPort(String),
}

type EncodeFn<T> = fn(&T) -> Result<String, CodecError>;
type DecodeFn<T> = fn(&str) -> Result<T, CodecError>;

/// Conversion between a setting value and its stored string.
pub struct SettingCodec<T> {
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
}

// Manual impls: `fn` pointers are `Copy` regardless of `T`, so no `T: Clone`
// bound is needed.
impl<T> Clone for SettingCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SettingCodec<T> {}

impl<T> std::fmt::Debug for SettingCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingCodec").finish_non_exhaustive()
    }
}

impl<T> SettingCodec<T> {
    /// Builds a codec from a pair of conversion functions.
    pub fn new(encode: EncodeFn<T>, decode: DecodeFn<T>) -> Self {
        Self { encode, decode }
    }

    /// Encodes `value` to its canonical stored string.
    ///
    /// # Errors
    ///
    /// Propagates the encoder's [`CodecError`].
    pub fn encode(&self, value: &T) -> Result<String, CodecError> {
        (self.encode)(value)
    }

    /// Decodes a stored string.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when `raw` does not represent a valid `T`.
    pub fn decode(&self, raw: &str) -> Result<T, CodecError> {
        (self.decode)(raw)
    }
}

impl<T: Serialize + DeserializeOwned> SettingCodec<T> {
    /// JSON codec for any serde type.
    ///
    /// Also accepts an unquoted string for types that deserialize from a JSON
    /// string (plain strings and unit-variant enums).
    pub fn json() -> Self {
        Self::new(encode_json::<T>, decode_json::<T>)
    }
}

impl SettingCodec<String> {
    /// Free-form text, stored JSON-quoted.
    pub fn text() -> Self {
        Self::new(encode_json::<String>, decode_json::<String>)
    }

    /// Text that can never legitimately contain `"` (host names, path
    /// segments).  Every literal quote is dropped on decode and encode.
    pub fn bare_text() -> Self {
        Self::new(encode_bare_text, decode_bare_text)
    }
}

impl SettingCodec<bool> {
    /// Boolean toggle stored as `true` / `false`.
    pub fn flag() -> Self {
        Self::new(encode_flag, decode_flag)
    }
}

impl SettingCodec<u16> {
    /// TCP port stored as a JSON number; a quoted number is accepted too.
    /// Port `0` is rejected, so a stored `0` falls back to the default.
    pub fn port() -> Self {
        Self::new(encode_port, decode_port)
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(value)?)
}

fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, CodecError> {
    match serde_json::from_str::<T>(raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            // Fall back to treating the raw text as an unquoted JSON string.
            serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(|_| err.into())
        }
    }
}

fn encode_bare_text(value: &String) -> Result<String, CodecError> {
    encode_json(&strip_quotes(value))
}

fn decode_bare_text(raw: &str) -> Result<String, CodecError> {
    let decoded: String = decode_json(raw.trim())?;
    Ok(strip_quotes(&decoded))
}

fn encode_flag(value: &bool) -> Result<String, CodecError> {
    Ok(value.to_string())
}

fn decode_flag(raw: &str) -> Result<bool, CodecError> {
    match strip_quotes(raw).trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(CodecError::InvalidFlag(other.to_string())),
    }
}

fn encode_port(value: &u16) -> Result<String, CodecError> {
    Ok(value.to_string())
}

fn decode_port(raw: &str) -> Result<u16, CodecError> {
    let cleaned = strip_quotes(raw);
    cleaned
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| CodecError::InvalidPort(raw.to_string()))
}

fn strip_quotes(value: &str) -> String {
    value.replace('"', "")
}

// ── Setting descriptor ────────────────────────────────────────────────────────

/// A named, persisted, user-configurable value with a default.
///
/// Identity is the storage key.  Descriptors are created once at startup by
/// the settings catalogue and never change afterwards; only the stored value
/// does.
#[derive(Debug, Clone)]
pub struct Setting<T> {
    key: &'static str,
    default: T,
    codec: SettingCodec<T>,
}

impl<T> Setting<T> {
    pub fn new(key: &'static str, default: T, codec: SettingCodec<T>) -> Self {
        Self {
            key,
            default,
            codec,
        }
    }

    /// The key this setting is stored under.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// The value used when the key is absent or undecodable.
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Encodes `value` for storage.
    ///
    /// # Errors
    ///
    /// Propagates the codec's [`CodecError`].
    pub fn encode(&self, value: &T) -> Result<String, CodecError> {
        self.codec.encode(value)
    }

    /// Decodes a stored string.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when `raw` is not a valid value.
    pub fn decode(&self, raw: &str) -> Result<T, CodecError> {
        self.codec.decode(raw)
    }
}

impl<T: Clone> Setting<T> {
    /// Decodes a stored value, substituting the default when the value is
    /// absent or malformed.
    ///
    /// Absence is an expected state (first run); a malformed value is logged
    /// at `debug` and otherwise treated exactly like absence.
    pub fn decode_or_default(&self, raw: Option<&str>) -> T {
        let Some(raw) = raw else {
            return self.default.clone();
        };
        match self.decode(raw) {
            Ok(value) => value,
            Err(e) => {
                debug!(key = self.key, error = %e, "stored value not decodable, using default");
                self.default.clone()
            }
        }
    }

    /// Parses user input with this setting's codec and returns the canonical
    /// stored form.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when `input` is not a valid value.
    pub fn canonicalize(&self, input: &str) -> Result<String, CodecError> {
        let value = self.decode(input)?;
        self.encode(&value)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
