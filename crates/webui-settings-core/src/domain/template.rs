//! Remote API payloads consumed by the settings layer.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Flag appended to the yt-dlp command line when the server holds a cookies
/// file for the session.
pub const COOKIES_FLAG: &str = "--cookies=cookies.txt";

/// Maps the server-side cookies content to the CLI flag that enables it.
///
/// Any non-empty cookies content yields [`COOKIES_FLAG`]; empty content
/// yields the empty string.
pub fn cookies_flag(server_cookies: &str) -> &'static str {
    if server_cookies.is_empty() {
        ""
    } else {
        COOKIES_FLAG
    }
}

/// Body of `GET /api/v1/cookies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookiesResponse {
    #[serde(default)]
    pub cookies: String,
}

/// A saved command-line template from `GET /api/v1/template/all`.
///
/// Only `id`, `name` and `content` are interpreted by the UI; any other field
/// the server sends is carried through untouched in `extra`.
///
/// Decoding never rejects an element: a non-string `id`, `name` or `content`
/// is kept as its JSON text, a missing one is empty.  One odd element must
/// not cost the user the whole list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomTemplate {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CustomTemplate {
    /// Builds a template from one element of the server's list.
    pub fn from_json(value: Value) -> Self {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                debug!(element = %other, "template element is not an object");
                serde_json::Map::new()
            }
        };
        let mut take = |key: &str| match fields.remove(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
        };
        let id = take("id");
        let name = take("name");
        let content = take("content");
        Self {
            id,
            name,
            content,
            extra: fields,
        }
    }
}

impl<'de> Deserialize<'de> for CustomTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}
