//! Environment variable types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::generate_id;

/// A single named variable within a tier.
///
/// Keys are unique within their tier; the same key may appear in several
/// tiers, with the environment tier shadowing the global tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// The variable name referenced by placeholders.
    pub key: String,

    /// The substituted value.
    pub value: String,

    /// Whether this variable participates in resolution.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl Variable {
    /// Creates a new enabled variable.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Creates a disabled variable.
    #[must_use]
    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: false,
        }
    }

    /// Returns the value if the variable is enabled.
    #[must_use]
    pub fn enabled_value(&self) -> Option<&str> {
        if self.enabled {
            Some(&self.value)
        } else {
            None
        }
    }
}

/// Defines the tier a variable was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableScope {
    /// Global tier - lowest precedence.
    Global = 0,
    /// Active environment tier - shadows the global tier.
    Environment = 1,
}

impl VariableScope {
    /// Returns the precedence level (higher wins).
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        *self as u8
    }

    /// Returns a human-readable name for the scope.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Environment => "Environment",
        }
    }
}

/// A resolved variable with its value and origin tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariable {
    /// The variable name (without placeholder delimiters).
    pub name: String,
    /// The resolved value.
    pub value: String,
    /// The tier from which this value was resolved.
    pub scope: VariableScope,
}

impl ResolvedVariable {
    /// Creates a new resolved variable.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, scope: VariableScope) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            scope,
        }
    }
}

/// An environment containing a set of variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Unique identifier.
    pub id: String,
    /// Environment name (e.g., "Development", "Production").
    pub name: String,
    /// Variables in this environment. Keys are unique.
    #[serde(default)]
    pub variables: Vec<Variable>,
    /// Whether this is the currently active environment.
    /// At most one environment is active at a time.
    #[serde(default)]
    pub is_active: bool,
    /// When the environment was created.
    pub created_at: DateTime<Utc>,
    /// When the environment was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Environment {
    /// Creates a new inactive environment with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            name: name.into(),
            variables: Vec::new(),
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds or replaces a variable, keyed by name.
    pub fn set_variable(&mut self, variable: Variable) {
        if let Some(existing) = self.variables.iter_mut().find(|v| v.key == variable.key) {
            *existing = variable;
        } else {
            self.variables.push(variable);
        }
        self.updated_at = Utc::now();
    }

    /// Adds a variable with name and value.
    pub fn add_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set_variable(Variable::new(key, value));
    }

    /// Gets a variable by name.
    #[must_use]
    pub fn get_variable(&self, key: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.key == key)
    }

    /// Removes a variable by name.
    pub fn remove_variable(&mut self, key: &str) -> Option<Variable> {
        let index = self.variables.iter().position(|v| v.key == key)?;
        self.updated_at = Utc::now();
        Some(self.variables.remove(index))
    }

    /// Returns the number of variables in this environment.
    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Returns names of all enabled variables.
    #[must_use]
    pub fn enabled_variable_keys(&self) -> Vec<&str> {
        self.variables
            .iter()
            .filter(|v| v.enabled)
            .map(|v| v.key.as_str())
            .collect()
    }

    /// Resolves a placeholder name (returns the value only if enabled).
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.get_variable(key).and_then(Variable::enabled_value)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new("New Environment")
    }
}
