//! Demand-driven evaluation: per-context stores and the aggregation engine.

mod aggregate;
mod error;
mod store;

pub use aggregate::{fold_children, fold_children_parallel};
pub use error::EvalError;
pub use store::VariableStore;
