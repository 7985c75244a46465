//! Variable resolution module
//!
//! Provides parsing and resolution of `{{variable}}` and `${variable}`
//! placeholders in strings.
//!
//! # Usage
//!
//! ```
//! use apiary_application::resolver::{ResolutionContext, VariableResolver};
//! use apiary_domain::environment::{Environment, Variable};
//!
//! let mut env = Environment::new("development");
//! env.add_variable("host", "localhost");
//!
//! let ctx = ResolutionContext::new().with_environment(&env);
//! let resolver = VariableResolver::new(ctx);
//!
//! let result = resolver.resolve("http://{{host}}/api");
//! assert_eq!(result.resolved, "http://localhost/api");
//! ```

mod engine;
mod parser;
mod template;

pub use engine::{ReferenceValidation, ResolutionContext, ResolutionResult, VariableResolver};
pub use parser::{
    has_placeholders, is_valid_variable_name, parse_placeholders, PlaceholderRef,
    PlaceholderSyntax,
};
pub use template::RequestResolution;
