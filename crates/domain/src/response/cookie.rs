//! Response cookie types.

use serde::{Deserialize, Serialize};

/// A cookie received in a `Set-Cookie` response header.
///
/// Only the name/value pair and the path attribute are retained; the
/// full attribute set is not modeled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Path the cookie applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Cookie {
    /// Creates a new cookie.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
        }
    }

    /// Parses a single `Set-Cookie` header value.
    ///
    /// Returns `None` when the header carries no name=value pair.
    #[must_use]
    pub fn parse(header_value: &str) -> Option<Self> {
        let mut parts = header_value.split(';');

        let name_value = parts.next()?;
        let (name, value) = name_value.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Self::new(name, value.trim());
        for attribute in parts {
            if let Some((key, val)) = attribute.split_once('=')
                && key.trim().eq_ignore_ascii_case("path")
            {
                cookie.path = Some(val.trim().to_string());
            }
        }

        Some(cookie)
    }
}
