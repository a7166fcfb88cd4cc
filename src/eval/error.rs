//! Error taxonomy for evaluation. Registry-build failures live in
//! [`crate::registry::RegistryError`]; everything here is scoped to the
//! failing `get` call and leaves other contexts' caches intact.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("no variable answers to alias '{0}'")]
    UnknownAlias(String),

    #[error("bad configuration for '{variable}': '{raw}': {reason}")]
    BadConfig {
        variable: String,
        raw: String,
        reason: String,
    },

    #[error("dependency cycle: {}", path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    #[error("aggregate '{0}' was read before its fold pass completed")]
    IncompleteAggregate(String),

    #[error("aggregate '{0}' has not been folded in this context")]
    AggregateNotComputed(String),

    #[error("'{0}' is not an aggregate")]
    NotAggregate(String),

    #[error("aggregate '{0}' was already folded in this context")]
    AlreadyFolded(String),

    #[error("'{variable}': expected {expected}, found {found}")]
    TypeMismatch {
        variable: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{variable}' read undeclared dependency '{dependency}'")]
    UndeclaredDependency {
        variable: String,
        dependency: String,
    },
}
