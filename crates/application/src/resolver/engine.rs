//! Variable resolution engine
//!
//! Resolves placeholder references according to tier precedence rules.

use std::collections::HashMap;

use apiary_domain::environment::{Environment, ResolvedVariable, Variable, VariableScope};

use super::parser::parse_placeholders;

/// Result of variable resolution for a string.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// The resolved string with all known placeholders substituted.
    pub resolved: String,

    /// Variables that were successfully substituted, one per occurrence.
    pub substitutions: Vec<ResolvedVariable>,

    /// Placeholder names that could not be resolved, one per occurrence.
    pub unresolved: Vec<String>,

    /// Whether every placeholder was substituted.
    pub is_complete: bool,
}

impl ResolutionResult {
    /// Creates a result for input with no placeholders.
    #[must_use]
    pub fn no_placeholders(input: &str) -> Self {
        Self {
            resolved: input.to_string(),
            substitutions: Vec::new(),
            unresolved: Vec::new(),
            is_complete: true,
        }
    }

    /// Returns the count of substituted occurrences.
    #[must_use]
    pub fn substitution_count(&self) -> usize {
        self.substitutions.len()
    }

    /// Returns the count of unresolved occurrences.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }
}

/// Outcome of checking a string's references against the known variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceValidation {
    /// True iff no referenced variable is missing.
    pub valid: bool,
    /// Distinct names with no enabled definition, in first-occurrence order.
    pub missing: Vec<String>,
}

/// Holds the variable tiers used for resolution.
///
/// Resolution order (highest wins): active environment, then globals.
/// Disabled variables never resolve.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    globals: HashMap<String, Variable>,
    environment: HashMap<String, Variable>,
    environment_name: Option<String>,
}

impl ResolutionContext {
    /// Creates a new empty resolution context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolution context from both tiers.
    #[must_use]
    pub fn from_tiers(globals: &[Variable], environment: Option<&Environment>) -> Self {
        let mut context = Self::new().with_globals(globals);
        if let Some(env) = environment {
            context = context.with_environment(env);
        }
        context
    }

    /// Sets the global tier (builder style).
    #[must_use]
    pub fn with_globals(mut self, globals: &[Variable]) -> Self {
        self.globals = globals
            .iter()
            .map(|v| (v.key.clone(), v.clone()))
            .collect();
        self
    }

    /// Sets the environment tier (builder style).
    #[must_use]
    pub fn with_environment(mut self, environment: &Environment) -> Self {
        self.environment = environment
            .variables
            .iter()
            .map(|v| (v.key.clone(), v.clone()))
            .collect();
        self.environment_name = Some(environment.name.clone());
        self
    }

    /// Returns the active environment name, if any.
    #[must_use]
    pub fn environment_name(&self) -> Option<&str> {
        self.environment_name.as_deref()
    }

    /// Resolves a variable name to its value and tier.
    /// Returns None if no enabled variable defines the name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ResolvedVariable> {
        // Environment tier shadows globals
        if let Some(var) = self.environment.get(name)
            && var.enabled
        {
            return Some(ResolvedVariable {
                name: name.to_string(),
                value: var.value.clone(),
                scope: VariableScope::Environment,
            });
        }

        if let Some(var) = self.globals.get(name)
            && var.enabled
        {
            return Some(ResolvedVariable {
                name: name.to_string(),
                value: var.value.clone(),
                scope: VariableScope::Global,
            });
        }

        None
    }

    /// Resolves a variable name to just its value.
    #[must_use]
    pub fn resolve_value(&self, name: &str) -> Option<String> {
        self.resolve(name).map(|r| r.value)
    }

    /// Returns all variable names across both tiers, sorted.
    #[must_use]
    pub fn all_variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .globals
            .keys()
            .chain(self.environment.keys())
            .cloned()
            .collect();

        names.sort();
        names.dedup();
        names
    }
}

/// The variable resolution engine.
///
/// Substitution is a single pass over the input and one level deep: a
/// substituted value that itself contains placeholder syntax is never
/// re-resolved, so expansion cannot recurse.
#[derive(Debug, Clone, Default)]
pub struct VariableResolver {
    context: ResolutionContext,
}

impl VariableResolver {
    /// Creates a new resolver with the given context.
    #[must_use]
    pub const fn new(context: ResolutionContext) -> Self {
        Self { context }
    }

    /// Creates a new resolver with an empty context.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(ResolutionContext::new())
    }

    /// Returns a reference to the current context.
    #[must_use]
    pub const fn context(&self) -> &ResolutionContext {
        &self.context
    }

    /// Updates the resolution context.
    pub fn set_context(&mut self, context: ResolutionContext) {
        self.context = context;
    }

    /// Resolves all placeholders in the input string.
    ///
    /// Every occurrence of a known enabled variable is replaced; unknown
    /// placeholders are left verbatim. This never fails.
    #[must_use]
    pub fn resolve(&self, input: &str) -> ResolutionResult {
        let references = parse_placeholders(input);

        if references.is_empty() {
            return ResolutionResult::no_placeholders(input);
        }

        let mut substitutions = Vec::new();
        let mut unresolved = Vec::new();
        let mut result = String::with_capacity(input.len());
        let mut last_end = 0;

        for var_ref in &references {
            // Append text before this placeholder
            result.push_str(&input[last_end..var_ref.span.start]);

            if let Some(resolved) = self.context.resolve(&var_ref.name) {
                result.push_str(&resolved.value);
                substitutions.push(resolved);
            } else {
                // Keep the original placeholder text for unresolved names
                result.push_str(&input[var_ref.span.clone()]);
                unresolved.push(var_ref.name.clone());
            }

            last_end = var_ref.span.end;
        }

        // Append remaining text after the last placeholder
        result.push_str(&input[last_end..]);

        let is_complete = unresolved.is_empty();
        ResolutionResult {
            resolved: result,
            substitutions,
            unresolved,
            is_complete,
        }
    }

    /// Extracts the distinct placeholder names referenced in the input,
    /// in first-occurrence order, without resolving them.
    #[must_use]
    pub fn variable_references(input: &str) -> Vec<String> {
        let mut names = Vec::new();
        for var_ref in parse_placeholders(input) {
            if !names.contains(&var_ref.name) {
                names.push(var_ref.name);
            }
        }
        names
    }

    /// Checks which referenced names have no enabled definition.
    ///
    /// Useful for validation before sending a request.
    #[must_use]
    pub fn validate_references(&self, input: &str) -> ReferenceValidation {
        let missing: Vec<String> = Self::variable_references(input)
            .into_iter()
            .filter(|name| self.context.resolve(name).is_none())
            .collect();

        ReferenceValidation {
            valid: missing.is_empty(),
            missing,
        }
    }
}
