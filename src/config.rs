//! Raw configuration input: alias-addressed string values, either global or
//! scoped to one node. Parsing and validation happen per leaf kind when the
//! value is first resolved.

use std::collections::HashMap;

use crate::eval::EvalError;
use crate::registry::Registry;
use crate::topology::NodeId;

#[derive(Debug, Clone, Default)]
pub struct Config {
    global: HashMap<String, String>,
    nodal: HashMap<NodeId, HashMap<String, String>>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value for every node.
    pub fn set(&mut self, alias: impl Into<String>, raw: impl Into<String>) {
        self.global.insert(alias.into(), raw.into());
    }

    /// Sets a value for one node; wins over the global value.
    pub fn set_nodal(&mut self, node: NodeId, alias: impl Into<String>, raw: impl Into<String>) {
        self.nodal
            .entry(node)
            .or_default()
            .insert(alias.into(), raw.into());
    }

    /// Reads a flat JSON object of alias to scalar, e.g.
    /// `{"fi_t": 10, "di_ll_cm": "12.5"}`.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        use serde::de::Error as _;

        let fields: HashMap<String, serde_json::Value> = serde_json::from_str(text)?;
        let mut config = Self::new();
        for (alias, value) in fields {
            let raw = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(serde_json::Error::custom(format!(
                        "unsupported value for '{alias}': {other}"
                    )))
                }
            };
            config.global.insert(alias, raw);
        }
        Ok(config)
    }

    /// Looks up a raw value for a leaf. Aliases are tried in declared order;
    /// a nodal entry under any alias beats every global entry.
    pub(crate) fn lookup(&self, node: NodeId, aliases: &[&str]) -> Option<&str> {
        if let Some(overrides) = self.nodal.get(&node) {
            for &alias in aliases {
                if let Some(raw) = overrides.get(alias) {
                    return Some(raw.as_str());
                }
            }
        }
        for &alias in aliases {
            if let Some(raw) = self.global.get(alias) {
                return Some(raw.as_str());
            }
        }
        None
    }

    /// Rejects aliases that no registered variable answers to, so typos fail
    /// before an evaluation run silently ignores them.
    pub fn check_aliases(&self, registry: &Registry) -> Result<(), EvalError> {
        let all = self
            .global
            .keys()
            .chain(self.nodal.values().flat_map(|m| m.keys()));
        for alias in all {
            if registry.by_alias(alias).is_none() {
                return Err(EvalError::UnknownAlias(alias.clone()));
            }
        }
        Ok(())
    }
}
