//! Dependency-driven evaluation of electrification economics.
//!
//! Every quantity in the model is a named variable: a `leaf` read from
//! configuration, a `derived` value computed from other variables, or an
//! `aggregate` folded over a node's children in the network. The
//! [`registry::Registry`] catalogs the definitions once; a
//! [`eval::VariableStore`] resolves them lazily for one node, caching each
//! value so nothing is computed twice; [`eval::fold_children`] reduces child
//! stores into a parent's system-wide totals.
//!
//! The headline output is `mvmax`, the maximum length of medium voltage line
//! for which grid extension beats the cheapest standalone option:
//!
//! ```
//! use mvmax_core::config::Config;
//! use mvmax_core::eval::VariableStore;
//! use mvmax_core::model::{self, metric};
//! use mvmax_core::topology::{GridStatus, Network, NodeId};
//!
//! let registry = model::standard().unwrap();
//! let config = Config::new();
//! let mut network = Network::new();
//! network.add_node(GridStatus::Off);
//!
//! let mut store = VariableStore::new(&registry, &config, &network, NodeId(0));
//! let meters = store.get_f64(metric::METRIC).unwrap();
//! assert!(meters >= 0.0);
//! ```

pub mod config;
pub mod display;
pub mod eval;
pub mod model;
pub mod registry;
pub mod topology;

pub use config::Config;
pub use eval::{fold_children, fold_children_parallel, EvalError, VariableStore};
pub use registry::{Registry, RegistryBuilder, RegistryError, SystemKind, Value, VarKey};
pub use topology::{GridStatus, Network, NodeId, Topology};
