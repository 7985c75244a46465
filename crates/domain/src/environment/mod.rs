//! Environment and variable domain types

mod template;
mod variable;

pub use template::EnvironmentTemplate;
pub use variable::{Environment, ResolvedVariable, Variable, VariableScope};
