//! Environment templates
//!
//! Templates capture a reusable variable list that can be instantiated
//! into fresh environments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::variable::{Environment, Variable};
use crate::id::generate_id;

/// A reusable blueprint for creating environments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentTemplate {
    /// Unique identifier.
    pub id: String,
    /// Template name.
    pub name: String,
    /// Variables copied into each instantiated environment.
    #[serde(default)]
    pub variables: Vec<Variable>,
    /// When the template was created.
    pub created_at: DateTime<Utc>,
}

impl EnvironmentTemplate {
    /// Creates a new template with the given name and variables.
    #[must_use]
    pub fn new(name: impl Into<String>, variables: Vec<Variable>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            variables,
            created_at: Utc::now(),
        }
    }

    /// Instantiates a fresh environment from this template.
    ///
    /// The new environment gets its own identifier and a deep copy of the
    /// template's variables. It starts inactive.
    #[must_use]
    pub fn instantiate(&self, name: impl Into<String>) -> Environment {
        let mut environment = Environment::new(name);
        environment.variables = self.variables.clone();
        environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiate_copies_variables() {
        let template = EnvironmentTemplate::new(
            "REST defaults",
            vec![
                Variable::new("base_url", "http://localhost:3000"),
                Variable::new("api_key", "dev-key"),
            ],
        );

        let env = template.instantiate("Development");
        assert_eq!(env.name, "Development");
        assert_eq!(env.variable_count(), 2);
        assert_eq!(env.resolve("base_url"), Some("http://localhost:3000"));
        assert!(!env.is_active);
    }

    #[test]
    fn test_instantiate_fresh_identifiers() {
        let template = EnvironmentTemplate::new("Empty", vec![]);

        let first = template.instantiate("A");
        let second = template.instantiate("B");
        assert_ne!(first.id, second.id);
        assert_ne!(first.id, template.id);
    }

    #[test]
    fn test_instantiated_copy_is_independent() {
        let template =
            EnvironmentTemplate::new("Defaults", vec![Variable::new("host", "localhost")]);

        let mut env = template.instantiate("Dev");
        env.add_variable("host", "changed");

        assert_eq!(template.variables[0].value, "localhost");
    }
}
