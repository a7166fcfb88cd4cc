//! Static catalog of variable definitions: identity, presentation metadata,
//! and the behavior rule (leaf, derived, or aggregate) for each kind.

use serde::{Deserialize, Serialize};

use crate::eval::{EvalError, VariableStore};

pub use self::builder::{Registry, RegistryBuilder, RegistryError};

mod builder;

/// A unique, stable identity tag for a variable kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VarKey(pub &'static str);

impl std::fmt::Display for VarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Dense index of a variable within a built registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub(crate) u32);

impl VariableId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The electrification option chosen for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemKind {
    Unelectrified,
    Grid,
    MiniGrid,
    OffGrid,
}

impl SystemKind {
    pub fn label(self) -> &'static str {
        match self {
            SystemKind::Unelectrified => "unelectrified",
            SystemKind::Grid => "grid",
            SystemKind::MiniGrid => "mini-grid",
            SystemKind::OffGrid => "off-grid",
        }
    }
}

/// A resolved variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Float(f64),
    System(SystemKind),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::System(_) => None,
        }
    }

    pub fn as_system(&self) -> Option<SystemKind> {
        match self {
            Value::System(s) => Some(*s),
            Value::Float(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::System(s) => f.write_str(s.label()),
        }
    }
}

/// Converts a raw configuration string into a value.
pub type ParseFn = fn(&str) -> Result<Value, String>;
/// Validates a leaf value after parsing.
pub type CheckFn = fn(&Value) -> Result<(), String>;
/// Rule body for a derived variable. Receives the resolving store and reads
/// its declared dependencies through `get`.
pub type ComputeFn = for<'s, 't> fn(&'s mut VariableStore<'t>) -> Result<Value, EvalError>;
/// Membership predicate for an aggregate, evaluated against a child's store.
pub type AppliesFn = for<'s, 't> fn(&'s mut VariableStore<'t>) -> Result<bool, EvalError>;
/// Fold step for an aggregate: combines one child's values into the
/// accumulator. Invoked only when the membership predicate holds.
pub type FoldFn = for<'s, 't> fn(&mut f64, &'s mut VariableStore<'t>) -> Result<(), EvalError>;

/// What a variable does when resolved.
pub enum Behavior {
    /// Directly configured value; falls back to the declared default.
    Leaf {
        default: Value,
        parse: ParseFn,
        check: Option<CheckFn>,
    },
    /// Computed from other variables resolved in the same context.
    Derived {
        dependencies: &'static [VarKey],
        compute: ComputeFn,
    },
    /// Folded across a node's children by the aggregation engine. The
    /// declared dependencies are the kinds the fold step reads from each
    /// child's own store.
    Aggregate {
        default: f64,
        dependencies: &'static [VarKey],
        applies: AppliesFn,
        fold: FoldFn,
    },
}

/// One variable kind: identity, presentation metadata, and behavior.
pub struct VariableDef {
    pub key: VarKey,
    /// Report grouping.
    pub section: &'static str,
    /// Display label.
    pub option: &'static str,
    /// Short names used by external configuration and reporting.
    pub aliases: &'static [&'static str],
    /// Documentation only; the engine imposes no dimensional analysis.
    pub units: &'static str,
    pub behavior: Behavior,
}

impl VariableDef {
    pub fn leaf(
        key: VarKey,
        section: &'static str,
        option: &'static str,
        aliases: &'static [&'static str],
        units: &'static str,
        default: f64,
    ) -> Self {
        Self {
            key,
            section,
            option,
            aliases,
            units,
            behavior: Behavior::Leaf {
                default: Value::Float(default),
                parse: parse_float,
                check: None,
            },
        }
    }

    pub fn leaf_checked(
        key: VarKey,
        section: &'static str,
        option: &'static str,
        aliases: &'static [&'static str],
        units: &'static str,
        default: f64,
        check: CheckFn,
    ) -> Self {
        Self {
            key,
            section,
            option,
            aliases,
            units,
            behavior: Behavior::Leaf {
                default: Value::Float(default),
                parse: parse_float,
                check: Some(check),
            },
        }
    }

    pub fn derived(
        key: VarKey,
        section: &'static str,
        option: &'static str,
        aliases: &'static [&'static str],
        units: &'static str,
        dependencies: &'static [VarKey],
        compute: ComputeFn,
    ) -> Self {
        Self {
            key,
            section,
            option,
            aliases,
            units,
            behavior: Behavior::Derived {
                dependencies,
                compute,
            },
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn aggregate(
        key: VarKey,
        section: &'static str,
        option: &'static str,
        aliases: &'static [&'static str],
        units: &'static str,
        default: f64,
        dependencies: &'static [VarKey],
        applies: AppliesFn,
        fold: FoldFn,
    ) -> Self {
        Self {
            key,
            section,
            option,
            aliases,
            units,
            behavior: Behavior::Aggregate {
                default,
                dependencies,
                applies,
                fold,
            },
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.behavior, Behavior::Aggregate { .. })
    }

    /// Declared dependency kinds, empty for leaves.
    pub fn dependencies(&self) -> &'static [VarKey] {
        match self.behavior {
            Behavior::Leaf { .. } => &[],
            Behavior::Derived { dependencies, .. } => dependencies,
            Behavior::Aggregate { dependencies, .. } => dependencies,
        }
    }
}

/// Default parser for numeric leaves.
pub fn parse_float(raw: &str) -> Result<Value, String> {
    raw.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|e| e.to_string())
}

/// Validator for leaves that must be strictly positive (lifetimes, horizons).
pub fn assert_positive(value: &Value) -> Result<(), String> {
    match value {
        Value::Float(v) if *v > 0.0 => Ok(()),
        Value::Float(v) => Err(format!("must be positive, got {v}")),
        Value::System(_) => Err("must be a number".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_trims_and_reports() {
        assert_eq!(parse_float(" 2.5 "), Ok(Value::Float(2.5)));
        assert!(parse_float("two").is_err());
    }

    #[test]
    fn assert_positive_rejects_zero() {
        assert!(assert_positive(&Value::Float(0.0)).is_err());
        assert!(assert_positive(&Value::Float(0.001)).is_ok());
    }

    #[test]
    fn system_labels_match_report_vocabulary() {
        assert_eq!(SystemKind::MiniGrid.label(), "mini-grid");
        assert_eq!(Value::System(SystemKind::OffGrid).to_string(), "off-grid");
    }
}
