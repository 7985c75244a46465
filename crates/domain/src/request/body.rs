//! HTTP Request body types

use serde::{Deserialize, Serialize};

/// A single field in a form-encoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// The field key
    pub key: String,
    /// The field value
    pub value: String,
    /// Whether this field is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl FormField {
    /// Creates a new enabled form field.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Creates a disabled form field.
    #[must_use]
    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: false,
        }
    }
}

/// HTTP request body.
///
/// Raw and JSON payloads are sent verbatim; form bodies are serialized
/// as `application/x-www-form-urlencoded` from their enabled fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBody {
    /// No body
    #[default]
    None,
    /// JSON body, kept as the raw string typed by the user
    Json {
        /// The JSON payload
        #[serde(default)]
        raw: String,
    },
    /// Raw text body
    Raw {
        /// The payload
        #[serde(default)]
        raw: String,
        /// The content type (e.g., "text/plain")
        content_type: String,
    },
    /// Form URL encoded body
    Form {
        /// The form fields
        #[serde(default)]
        fields: Vec<FormField>,
    },
}

impl RequestBody {
    /// Creates an empty body.
    #[must_use]
    pub const fn none() -> Self {
        Self::None
    }

    /// Creates a JSON body.
    #[must_use]
    pub fn json(raw: impl Into<String>) -> Self {
        Self::Json { raw: raw.into() }
    }

    /// Creates a plain text body.
    #[must_use]
    pub fn text(raw: impl Into<String>) -> Self {
        Self::Raw {
            raw: raw.into(),
            content_type: "text/plain".to_string(),
        }
    }

    /// Creates a form body from fields.
    #[must_use]
    pub const fn form(fields: Vec<FormField>) -> Self {
        Self::Form { fields }
    }

    /// Returns whether the body is none or carries no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Json { raw } | Self::Raw { raw, .. } => raw.is_empty(),
            Self::Form { fields } => fields.iter().all(|f| !f.enabled || f.key.is_empty()),
        }
    }

    /// Returns the content type if applicable.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Json { .. } => Some("application/json"),
            Self::Raw { content_type, .. } => Some(content_type),
            Self::Form { .. } => Some("application/x-www-form-urlencoded"),
        }
    }
}
