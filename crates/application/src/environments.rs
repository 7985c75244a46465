//! Environment manager
//!
//! The single owner of the variable tiers and the active-environment
//! pointer. Callers share one manager by reference; there is no ambient
//! global state. Every mutation is persisted immediately through the
//! storage port.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use apiary_domain::environment::{Environment, EnvironmentTemplate, Variable};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::storage::keys;
use crate::ports::KeyValueStore;
use crate::resolver::{ResolutionContext, ResolutionResult, VariableResolver};

/// Persisted shape of the environment list plus the active pointer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredEnvironments {
    #[serde(default)]
    environments: Vec<Environment>,
    #[serde(default)]
    active_id: Option<String>,
}

#[derive(Debug, Default)]
struct EnvironmentState {
    environments: Vec<Environment>,
    globals: Vec<Variable>,
    templates: Vec<EnvironmentTemplate>,
    active_id: Option<String>,
}

impl EnvironmentState {
    fn active_environment(&self) -> Option<&Environment> {
        let id = self.active_id.as_deref()?;
        self.environments.iter().find(|e| e.id == id)
    }
}

/// Owns the variable tiers and the active-environment pointer.
///
/// Reads take a snapshot under a short lock; the resolver performs a
/// last-write-wins read of the current state on each call, so a variable
/// changed mid-batch affects subsequently resolved templates only.
pub struct EnvironmentManager<S> {
    store: S,
    state: RwLock<EnvironmentState>,
}

impl<S: KeyValueStore> EnvironmentManager<S> {
    /// Creates a manager with no environments or globals.
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: RwLock::new(EnvironmentState::default()),
        }
    }

    /// Creates a manager and loads persisted state from the store.
    ///
    /// Missing records yield empty state; an unknown persisted active id
    /// is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if a persisted record exists but cannot be read.
    pub async fn load(store: S) -> ApplicationResult<Self> {
        let stored: StoredEnvironments = match store.get(keys::ENVIRONMENTS).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| ApplicationError::Validation(format!("corrupt environments: {e}")))?,
            None => StoredEnvironments::default(),
        };

        let globals: Vec<Variable> = match store.get(keys::GLOBAL_VARIABLES).await? {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                ApplicationError::Validation(format!("corrupt global variables: {e}"))
            })?,
            None => Vec::new(),
        };

        let templates: Vec<EnvironmentTemplate> =
            match store.get(keys::ENVIRONMENT_TEMPLATES).await? {
                Some(value) => serde_json::from_value(value).map_err(|e| {
                    ApplicationError::Validation(format!("corrupt templates: {e}"))
                })?,
                None => Vec::new(),
            };

        let active_id = stored
            .active_id
            .filter(|id| stored.environments.iter().any(|e| &e.id == id));

        Ok(Self {
            store,
            state: RwLock::new(EnvironmentState {
                environments: stored.environments,
                globals,
                templates,
                active_id,
            }),
        })
    }

    // -- queries ---------------------------------------------------------

    /// Returns a snapshot of all environments.
    pub fn environments(&self) -> Vec<Environment> {
        self.read(|state| state.environments.clone())
    }

    /// Returns a snapshot of the active environment, if any.
    pub fn active_environment(&self) -> Option<Environment> {
        self.read(|state| state.active_environment().cloned())
    }

    /// Returns a snapshot of the global-tier variables.
    pub fn global_variables(&self) -> Vec<Variable> {
        self.read(|state| state.globals.clone())
    }

    /// Returns a snapshot of the environment templates.
    pub fn templates(&self) -> Vec<EnvironmentTemplate> {
        self.read(|state| state.templates.clone())
    }

    /// Builds a resolution context from the current tiers.
    pub fn resolution_context(&self) -> ResolutionContext {
        self.read(|state| {
            ResolutionContext::from_tiers(&state.globals, state.active_environment())
        })
    }

    /// Resolves placeholders in `text` against the current context.
    pub fn resolve(&self, text: &str) -> ResolutionResult {
        VariableResolver::new(self.resolution_context()).resolve(text)
    }

    /// Resolves placeholders against an explicit environment instead of
    /// the active one. Globals still apply.
    pub fn resolve_with(&self, text: &str, environment: &Environment) -> ResolutionResult {
        let context = self.read(|state| {
            ResolutionContext::from_tiers(&state.globals, Some(environment))
        });
        VariableResolver::new(context).resolve(text)
    }

    // -- environment CRUD ------------------------------------------------

    /// Creates a new environment. The first environment created becomes
    /// active automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub async fn create_environment(
        &self,
        name: impl Into<String>,
        variables: Vec<Variable>,
    ) -> ApplicationResult<Environment> {
        let mut environment = Environment::new(name);
        environment.variables = variables;

        let created = self.write(|state| {
            if state.environments.is_empty() {
                environment.is_active = true;
                state.active_id = Some(environment.id.clone());
            }
            state.environments.push(environment.clone());
            environment
        });

        self.persist_environments().await?;
        Ok(created)
    }

    /// Deletes an environment by id. Deleting the active environment
    /// clears the active pointer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub async fn delete_environment(&self, id: &str) -> ApplicationResult<()> {
        let found = self.write(|state| {
            let Some(index) = state.environments.iter().position(|e| e.id == id) else {
                return false;
            };
            state.environments.remove(index);
            if state.active_id.as_deref() == Some(id) {
                state.active_id = None;
            }
            true
        });

        if !found {
            return Err(ApplicationError::NotFound(format!("environment {id}")));
        }

        self.persist_environments().await
    }

    /// Duplicates an environment under a derived name. The copy starts
    /// inactive.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids.
    pub async fn duplicate_environment(&self, id: &str) -> ApplicationResult<Environment> {
        let duplicated = self.write(|state| {
            let original = state.environments.iter().find(|e| e.id == id)?;
            let mut copy = Environment::new(format!("{} (copy)", original.name));
            copy.variables = original.variables.clone();
            state.environments.push(copy.clone());
            Some(copy)
        });

        let Some(environment) = duplicated else {
            return Err(ApplicationError::NotFound(format!("environment {id}")));
        };

        self.persist_environments().await?;
        Ok(environment)
    }

    /// Sets the active environment.
    ///
    /// `Some(id)` activates that environment and deactivates all others;
    /// `None` deactivates everything. Returns `false` (leaving state
    /// untouched) when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub async fn switch_environment(&self, id: Option<&str>) -> ApplicationResult<bool> {
        let applied = self.write(|state| {
            if let Some(id) = id
                && !state.environments.iter().any(|e| e.id == id)
            {
                return false;
            }

            state.active_id = id.map(ToString::to_string);
            for env in &mut state.environments {
                env.is_active = Some(env.id.as_str()) == id;
            }
            true
        });

        if !applied {
            warn!(environment_id = ?id, "switch to unknown environment rejected");
            return Ok(false);
        }

        self.persist_environments().await?;
        Ok(true)
    }

    // -- variable operations ---------------------------------------------

    /// Adds or replaces a variable in an environment.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown environment ids.
    pub async fn set_variable(
        &self,
        environment_id: &str,
        variable: Variable,
    ) -> ApplicationResult<()> {
        let found = self.write(|state| {
            let Some(env) = state
                .environments
                .iter_mut()
                .find(|e| e.id == environment_id)
            else {
                return false;
            };
            env.set_variable(variable);
            true
        });

        if !found {
            return Err(ApplicationError::NotFound(format!(
                "environment {environment_id}"
            )));
        }

        self.persist_environments().await
    }

    /// Removes a variable from an environment by key.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the environment or the variable is unknown.
    pub async fn remove_variable(
        &self,
        environment_id: &str,
        key: &str,
    ) -> ApplicationResult<()> {
        enum Outcome {
            Removed,
            NoVariable,
            NoEnvironment,
        }

        let outcome = self.write(|state| {
            let Some(env) = state
                .environments
                .iter_mut()
                .find(|e| e.id == environment_id)
            else {
                return Outcome::NoEnvironment;
            };
            if env.remove_variable(key).is_some() {
                Outcome::Removed
            } else {
                Outcome::NoVariable
            }
        });

        match outcome {
            Outcome::Removed => self.persist_environments().await,
            Outcome::NoVariable => Err(ApplicationError::NotFound(format!("variable {key}"))),
            Outcome::NoEnvironment => Err(ApplicationError::NotFound(format!(
                "environment {environment_id}"
            ))),
        }
    }

    /// Adds or replaces a global-tier variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub async fn set_global_variable(&self, variable: Variable) -> ApplicationResult<()> {
        self.write(|state| {
            if let Some(existing) = state.globals.iter_mut().find(|v| v.key == variable.key) {
                *existing = variable;
            } else {
                state.globals.push(variable);
            }
        });

        self.persist_globals().await
    }

    /// Removes a global-tier variable by key.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown keys.
    pub async fn remove_global_variable(&self, key: &str) -> ApplicationResult<()> {
        let found = self.write(|state| {
            let Some(index) = state.globals.iter().position(|v| v.key == key) else {
                return false;
            };
            state.globals.remove(index);
            true
        });

        if !found {
            return Err(ApplicationError::NotFound(format!("global variable {key}")));
        }

        self.persist_globals().await
    }

    // -- templates -------------------------------------------------------

    /// Creates a reusable environment template.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    pub async fn create_template(
        &self,
        name: impl Into<String>,
        variables: Vec<Variable>,
    ) -> ApplicationResult<EnvironmentTemplate> {
        let template = EnvironmentTemplate::new(name, variables);

        self.write(|state| state.templates.push(template.clone()));
        self.persist_templates().await?;
        Ok(template)
    }

    /// Instantiates a fresh environment from a stored template.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown template ids.
    pub async fn apply_template(
        &self,
        template_id: &str,
        name: impl Into<String>,
    ) -> ApplicationResult<Environment> {
        let instantiated = self.write(|state| {
            let template = state.templates.iter().find(|t| t.id == template_id)?;
            let environment = template.instantiate(name);
            state.environments.push(environment.clone());
            Some(environment)
        });

        let Some(environment) = instantiated else {
            return Err(ApplicationError::NotFound(format!(
                "template {template_id}"
            )));
        };

        self.persist_environments().await?;
        Ok(environment)
    }

    // -- export / import -------------------------------------------------

    /// Exports all environments and the active pointer as a JSON value.
    pub fn export_environments(&self) -> serde_json::Value {
        let stored = self.read(|state| StoredEnvironments {
            environments: state.environments.clone(),
            active_id: state.active_id.clone(),
        });
        serde_json::to_value(stored).unwrap_or(serde_json::Value::Null)
    }

    /// Imports environments from a previously exported JSON value.
    ///
    /// With `merge` set, imported environments are appended (same-name
    /// environments are replaced); otherwise the existing list is
    /// discarded. Returns the number of imported environments.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed payloads.
    pub async fn import_environments(
        &self,
        value: serde_json::Value,
        merge: bool,
    ) -> ApplicationResult<usize> {
        let imported: StoredEnvironments = serde_json::from_value(value)
            .map_err(|e| ApplicationError::Validation(format!("invalid import payload: {e}")))?;

        let count = imported.environments.len();
        self.write(|state| {
            if merge {
                for incoming in imported.environments {
                    if let Some(existing) = state
                        .environments
                        .iter_mut()
                        .find(|e| e.name == incoming.name)
                    {
                        // Keep the existing id so references stay valid
                        let id = existing.id.clone();
                        *existing = incoming;
                        existing.id = id;
                    } else {
                        state.environments.push(incoming);
                    }
                }
            } else {
                state.environments = imported.environments;
                state.active_id = None;
            }

            // Drop a stale active pointer and re-align flags
            let active = state.active_id.clone().filter(|id| {
                state.environments.iter().any(|e| &e.id == id)
            });
            state.active_id = active;
            for env in &mut state.environments {
                env.is_active = state.active_id.as_deref() == Some(env.id.as_str());
            }
        });

        self.persist_environments().await?;
        Ok(count)
    }

    // -- persistence -----------------------------------------------------

    fn read<T>(&self, f: impl FnOnce(&EnvironmentState) -> T) -> T {
        #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
        let state = self.state.read().unwrap();
        f(&state)
    }

    fn write<T>(&self, f: impl FnOnce(&mut EnvironmentState) -> T) -> T {
        #[allow(clippy::unwrap_used)] // poisoned only if a writer panicked
        let mut state = self.state.write().unwrap();
        f(&mut state)
    }

    async fn persist_environments(&self) -> ApplicationResult<()> {
        let value = self.export_environments();
        self.store.set(keys::ENVIRONMENTS, value).await?;
        Ok(())
    }

    async fn persist_globals(&self) -> ApplicationResult<()> {
        let globals = self.read(|state| state.globals.clone());
        let value = serde_json::to_value(globals).unwrap_or(serde_json::Value::Null);
        self.store.set(keys::GLOBAL_VARIABLES, value).await?;
        Ok(())
    }

    async fn persist_templates(&self) -> ApplicationResult<()> {
        let templates = self.read(|state| state.templates.clone());
        let value = serde_json::to_value(templates).unwrap_or(serde_json::Value::Null);
        self.store.set(keys::ENVIRONMENT_TEMPLATES, value).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::ports::StorageError;

    #[derive(Default)]
    struct MockStore {
        records: Mutex<HashMap<String, serde_json::Value>>,
    }

    impl MockStore {
        fn get_sync(&self, key: &str) -> Option<serde_json::Value> {
            self.records.lock().expect("lock poisoned").get(key).cloned()
        }
    }

    #[async_trait]
    impl KeyValueStore for MockStore {
        async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
            Ok(self.get_sync(key))
        }

        async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
            self.records
                .lock()
                .expect("lock poisoned")
                .insert(key.to_string(), value);
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.records.lock().expect("lock poisoned").remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_first_environment_becomes_active() {
        let manager = EnvironmentManager::new(MockStore::default());

        let env = manager
            .create_environment("Development", vec![])
            .await
            .unwrap();

        let active = manager.active_environment().expect("should be active");
        assert_eq!(active.id, env.id);
        assert!(active.is_active);
    }

    #[tokio::test]
    async fn test_switch_environment_deactivates_others() {
        let manager = EnvironmentManager::new(MockStore::default());
        let first = manager.create_environment("First", vec![]).await.unwrap();
        let second = manager.create_environment("Second", vec![]).await.unwrap();

        let switched = manager.switch_environment(Some(&second.id)).await.unwrap();
        assert!(switched);

        let environments = manager.environments();
        let actives: Vec<_> = environments.iter().filter(|e| e.is_active).collect();
        assert_eq!(actives.len(), 1);
        assert_eq!(actives[0].id, second.id);

        // Switch back and verify the pointer moves
        assert!(manager.switch_environment(Some(&first.id)).await.unwrap());
        assert_eq!(manager.active_environment().map(|e| e.id), Some(first.id));
    }

    #[tokio::test]
    async fn test_switch_to_unknown_id_is_explicit_false() {
        let manager = EnvironmentManager::new(MockStore::default());
        let env = manager.create_environment("Only", vec![]).await.unwrap();

        let switched = manager.switch_environment(Some("missing-id")).await.unwrap();
        assert!(!switched);
        // The active pointer is untouched
        assert_eq!(manager.active_environment().map(|e| e.id), Some(env.id));
    }

    #[tokio::test]
    async fn test_switch_to_none_deactivates() {
        let manager = EnvironmentManager::new(MockStore::default());
        manager.create_environment("Dev", vec![]).await.unwrap();

        assert!(manager.switch_environment(None).await.unwrap());
        assert!(manager.active_environment().is_none());
        assert!(manager.environments().iter().all(|e| !e.is_active));
    }

    #[tokio::test]
    async fn test_delete_active_clears_pointer() {
        let manager = EnvironmentManager::new(MockStore::default());
        let env = manager.create_environment("Dev", vec![]).await.unwrap();

        manager.delete_environment(&env.id).await.unwrap();
        assert!(manager.active_environment().is_none());
        assert!(manager.environments().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let manager = EnvironmentManager::new(MockStore::default());
        let result = manager.delete_environment("missing").await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_variable_mutations_persist() {
        let store = MockStore::default();
        let manager = EnvironmentManager::new(store);
        let env = manager.create_environment("Dev", vec![]).await.unwrap();

        manager
            .set_variable(&env.id, Variable::new("host", "localhost"))
            .await
            .unwrap();

        let stored = manager.store.get_sync(keys::ENVIRONMENTS).expect("persisted");
        let parsed: StoredEnvironments = serde_json::from_value(stored).unwrap();
        assert_eq!(parsed.environments[0].variables[0].key, "host");

        manager.remove_variable(&env.id, "host").await.unwrap();
        let result = manager.remove_variable(&env.id, "host").await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_uses_active_environment_over_globals() {
        let manager = EnvironmentManager::new(MockStore::default());
        manager
            .set_global_variable(Variable::new("host", "https://x.com"))
            .await
            .unwrap();
        manager
            .set_global_variable(Variable::new("id", "global-id"))
            .await
            .unwrap();

        let env = manager
            .create_environment("Dev", vec![Variable::new("id", "42")])
            .await
            .unwrap();
        manager.switch_environment(Some(&env.id)).await.unwrap();

        let result = manager.resolve("{{host}}/api/{{id}}");
        assert_eq!(result.resolved, "https://x.com/api/42");
    }

    #[tokio::test]
    async fn test_apply_template_creates_fresh_environment() {
        let manager = EnvironmentManager::new(MockStore::default());
        let template = manager
            .create_template("Defaults", vec![Variable::new("host", "localhost")])
            .await
            .unwrap();

        let env = manager
            .apply_template(&template.id, "Staging")
            .await
            .unwrap();
        assert_eq!(env.name, "Staging");
        assert_eq!(env.resolve("host"), Some("localhost"));
        assert_ne!(env.id, template.id);

        let result = manager.apply_template("missing", "X").await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_load_restores_persisted_state() {
        let store = MockStore::default();
        {
            let manager = EnvironmentManager::new(store);
            let env = manager
                .create_environment("Dev", vec![Variable::new("host", "localhost")])
                .await
                .unwrap();
            manager.switch_environment(Some(&env.id)).await.unwrap();

            // Reload from the same backing records
            let records = manager.store.records.lock().unwrap().clone();
            let reloaded_store = MockStore {
                records: Mutex::new(records),
            };
            let reloaded = EnvironmentManager::load(reloaded_store).await.unwrap();
            assert_eq!(reloaded.environments().len(), 1);
            assert_eq!(
                reloaded.active_environment().map(|e| e.name),
                Some("Dev".to_string())
            );
        }
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let manager = EnvironmentManager::new(MockStore::default());
        manager
            .create_environment("Dev", vec![Variable::new("host", "localhost")])
            .await
            .unwrap();

        let exported = manager.export_environments();

        let fresh = EnvironmentManager::new(MockStore::default());
        let count = fresh.import_environments(exported, false).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(fresh.environments()[0].name, "Dev");
    }

    #[tokio::test]
    async fn test_import_merge_replaces_same_name() {
        let manager = EnvironmentManager::new(MockStore::default());
        let original = manager
            .create_environment("Dev", vec![Variable::new("host", "old")])
            .await
            .unwrap();

        let incoming = EnvironmentManager::new(MockStore::default());
        incoming
            .create_environment("Dev", vec![Variable::new("host", "new")])
            .await
            .unwrap();

        let count = manager
            .import_environments(incoming.export_environments(), true)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let environments = manager.environments();
        assert_eq!(environments.len(), 1);
        // Same name keeps the original id but takes the imported variables
        assert_eq!(environments[0].id, original.id);
        assert_eq!(environments[0].resolve("host"), Some("new"));
    }
}
