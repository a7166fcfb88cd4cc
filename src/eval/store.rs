//! Per-context variable store: resolves values on demand, computing each
//! kind at most once per binding context.

use smallvec::SmallVec;

use crate::config::Config;
use crate::registry::{Behavior, CheckFn, ParseFn, Registry, SystemKind, Value, VarKey, VariableId};
use crate::topology::{NodeId, Topology};

use super::EvalError;

/// Cache slot lifecycle. `Visiting` marks a resolution in flight and doubles
/// as the cycle sentinel; `Folding` holds an aggregate accumulator that has
/// not been finalized.
#[derive(Debug, Clone)]
enum Slot {
    Empty,
    Visiting,
    Folding(f64),
    Done(Value),
}

/// Resolves and caches variable values for one binding context: a topology
/// handle plus the node being evaluated. Two stores never share cached
/// values; the only cross-context flow is the aggregation pass, which folds
/// child stores into a parent's accumulators.
pub struct VariableStore<'a> {
    registry: &'a Registry,
    config: &'a Config,
    topology: &'a dyn Topology,
    node: NodeId,
    slots: Vec<Slot>,
    path: SmallVec<[VariableId; 16]>,
    strict: bool,
}

impl<'a> VariableStore<'a> {
    pub fn new(
        registry: &'a Registry,
        config: &'a Config,
        topology: &'a dyn Topology,
        node: NodeId,
    ) -> Self {
        Self {
            registry,
            config,
            topology,
            node,
            slots: vec![Slot::Empty; registry.len()],
            path: SmallVec::new(),
            strict: false,
        }
    }

    /// Enables the undeclared-dependency guard: a derived rule reading a
    /// kind it did not declare fails instead of resolving it. Intended for
    /// tests; fold steps run against a fresh child path and are not checked.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn topology(&self) -> &'a dyn Topology {
        self.topology
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Resolves a variable, computing it and its dependencies as needed.
    pub fn get(&mut self, key: VarKey) -> Result<Value, EvalError> {
        let id = self
            .registry
            .id_of(key)
            .ok_or_else(|| EvalError::UnknownVariable(key.to_string()))?;
        if self.strict {
            if let Some(&current) = self.path.last() {
                if !self.registry.dependencies(current).contains(&id) {
                    return Err(EvalError::UndeclaredDependency {
                        variable: self.name(current),
                        dependency: key.to_string(),
                    });
                }
            }
        }
        self.resolve(id)
    }

    pub fn get_f64(&mut self, key: VarKey) -> Result<f64, EvalError> {
        match self.get(key)? {
            Value::Float(v) => Ok(v),
            Value::System(_) => Err(EvalError::TypeMismatch {
                variable: key.to_string(),
                expected: "number",
                found: "system",
            }),
        }
    }

    pub fn get_system(&mut self, key: VarKey) -> Result<SystemKind, EvalError> {
        match self.get(key)? {
            Value::System(s) => Ok(s),
            Value::Float(_) => Err(EvalError::TypeMismatch {
                variable: key.to_string(),
                expected: "system",
                found: "number",
            }),
        }
    }

    /// Returns the cached value without resolving anything.
    pub fn peek(&self, key: VarKey) -> Option<&Value> {
        let id = self.registry.id_of(key)?;
        match &self.slots[id.index()] {
            Slot::Done(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn resolve(&mut self, id: VariableId) -> Result<Value, EvalError> {
        match &self.slots[id.index()] {
            Slot::Done(v) => return Ok(v.clone()),
            Slot::Visiting => return Err(self.cycle_error(id)),
            Slot::Folding(_) => return Err(EvalError::IncompleteAggregate(self.name(id))),
            Slot::Empty => {}
        }
        let registry = self.registry;
        let def = registry.def(id);
        // Aggregates are produced by the aggregation pass, never on demand;
        // an empty slot here means the caller skipped the fold.
        if def.is_aggregate() {
            return Err(EvalError::AggregateNotComputed(self.name(id)));
        }

        self.slots[id.index()] = Slot::Visiting;
        self.path.push(id);
        let outcome = match &def.behavior {
            Behavior::Leaf {
                default,
                parse,
                check,
            } => self.resolve_leaf(id, default, *parse, *check),
            Behavior::Derived { compute, .. } => compute(self),
            Behavior::Aggregate { .. } => unreachable!(),
        };
        self.path.pop();

        match outcome {
            Ok(value) => {
                self.slots[id.index()] = Slot::Done(value.clone());
                Ok(value)
            }
            Err(err) => {
                // A failed resolution must not leave a poisoned sentinel.
                self.slots[id.index()] = Slot::Empty;
                Err(err)
            }
        }
    }

    fn resolve_leaf(
        &mut self,
        id: VariableId,
        default: &Value,
        parse: ParseFn,
        check: Option<CheckFn>,
    ) -> Result<Value, EvalError> {
        let def = self.registry.def(id);
        let (value, shown) = match self.config.lookup(self.node, def.aliases) {
            Some(raw) => {
                let parsed = parse(raw).map_err(|reason| EvalError::BadConfig {
                    variable: def.key.to_string(),
                    raw: raw.to_string(),
                    reason,
                })?;
                (parsed, raw.to_string())
            }
            None => (default.clone(), default.to_string()),
        };
        if let Some(check) = check {
            check(&value).map_err(|reason| EvalError::BadConfig {
                variable: def.key.to_string(),
                raw: shown,
                reason,
            })?;
        }
        Ok(value)
    }

    fn cycle_error(&self, id: VariableId) -> EvalError {
        let start = self.path.iter().position(|&p| p == id).unwrap_or(0);
        let mut path: Vec<String> = self.path[start..].iter().map(|&p| self.name(p)).collect();
        path.push(self.name(id));
        EvalError::DependencyCycle { path }
    }

    fn name(&self, id: VariableId) -> String {
        self.registry.def(id).key.to_string()
    }

    // --- Aggregation hooks (driven by eval::aggregate) ---

    /// Seeds an aggregate's accumulator from its declared default.
    pub(crate) fn begin_fold(&mut self, id: VariableId) -> Result<(), EvalError> {
        let def = self.registry.def(id);
        let Behavior::Aggregate { default, .. } = def.behavior else {
            return Err(EvalError::NotAggregate(self.name(id)));
        };
        match self.slots[id.index()] {
            Slot::Empty => {
                self.slots[id.index()] = Slot::Folding(default);
                Ok(())
            }
            _ => Err(EvalError::AlreadyFolded(self.name(id))),
        }
    }

    /// Takes the in-flight accumulator; the slot reads as in-flight until
    /// [`Self::store_accumulator`] puts it back.
    pub(crate) fn accumulator(&mut self, id: VariableId) -> Result<f64, EvalError> {
        match std::mem::replace(&mut self.slots[id.index()], Slot::Visiting) {
            Slot::Folding(acc) => Ok(acc),
            Slot::Done(v) => {
                self.slots[id.index()] = Slot::Done(v);
                Err(EvalError::AlreadyFolded(self.name(id)))
            }
            other => {
                self.slots[id.index()] = other;
                Err(EvalError::AggregateNotComputed(self.name(id)))
            }
        }
    }

    pub(crate) fn store_accumulator(&mut self, id: VariableId, acc: f64) {
        self.slots[id.index()] = Slot::Folding(acc);
    }

    /// Marks the accumulator complete; subsequent `get` calls return it
    /// without re-folding, and re-seeding it is an error.
    pub(crate) fn finalize_fold(&mut self, id: VariableId) -> Result<(), EvalError> {
        match std::mem::replace(&mut self.slots[id.index()], Slot::Empty) {
            Slot::Folding(acc) => {
                self.slots[id.index()] = Slot::Done(Value::Float(acc));
                Ok(())
            }
            Slot::Done(v) => {
                self.slots[id.index()] = Slot::Done(v);
                Err(EvalError::AlreadyFolded(self.name(id)))
            }
            other => {
                self.slots[id.index()] = other;
                Err(EvalError::AggregateNotComputed(self.name(id)))
            }
        }
    }

    /// Resolves a variable by id, discarding the value. Used to warm child
    /// caches before a parallel fold.
    pub(crate) fn warm(&mut self, id: VariableId) -> Result<(), EvalError> {
        self.resolve(id).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::registry::{RegistryBuilder, VariableDef};
    use crate::topology::{GridStatus, Network};

    const LEAF: VarKey = VarKey("Leaf");
    const TWICE: VarKey = VarKey("Twice");
    const LOOP_A: VarKey = VarKey("LoopA");
    const LOOP_B: VarKey = VarKey("LoopB");

    static TWICE_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn compute_twice(vs: &mut VariableStore) -> Result<Value, EvalError> {
        TWICE_CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Float(vs.get_f64(LEAF)? * 2.0))
    }

    fn compute_loop_a(vs: &mut VariableStore) -> Result<Value, EvalError> {
        vs.get(LOOP_B)
    }

    fn compute_loop_b(vs: &mut VariableStore) -> Result<Value, EvalError> {
        vs.get(LOOP_A)
    }

    fn small_registry() -> Registry {
        let mut b = RegistryBuilder::new();
        b.define(VariableDef::leaf(LEAF, "t", "leaf", &["leaf"], "", 3.0));
        b.define(VariableDef::derived(
            TWICE,
            "t",
            "twice",
            &["twice"],
            "",
            &[LEAF],
            compute_twice,
        ));
        // The loop pair declares no dependencies, so the static analysis
        // cannot see the cycle; resolution has to catch it at runtime.
        b.define(VariableDef::derived(
            LOOP_A,
            "t",
            "loop a",
            &[],
            "",
            &[],
            compute_loop_a,
        ));
        b.define(VariableDef::derived(
            LOOP_B,
            "t",
            "loop b",
            &[],
            "",
            &[],
            compute_loop_b,
        ));
        b.build().unwrap()
    }

    fn one_node() -> Network {
        let mut net = Network::new();
        net.add_node(GridStatus::Off);
        net
    }

    #[test]
    fn memoization_computes_each_kind_once() {
        let registry = small_registry();
        let config = Config::new();
        let net = one_node();
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));

        TWICE_CALLS.store(0, Ordering::SeqCst);
        let first = store.get(TWICE).unwrap();
        let second = store.get(TWICE).unwrap();
        assert_eq!(first, Value::Float(6.0));
        assert_eq!(first, second);
        assert_eq!(TWICE_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn contexts_are_isolated() {
        let registry = small_registry();
        let mut config = Config::new();
        config.set_nodal(NodeId(1), "leaf", "10");
        let mut net = Network::new();
        net.add_node(GridStatus::Off);
        net.add_node(GridStatus::Off);

        let mut first = VariableStore::new(&registry, &config, &net, NodeId(0));
        let mut second = VariableStore::new(&registry, &config, &net, NodeId(1));

        assert_eq!(first.get(TWICE).unwrap(), Value::Float(6.0));
        // Resolving in one context never populates the other.
        assert!(second.peek(TWICE).is_none());
        assert_eq!(second.get(TWICE).unwrap(), Value::Float(20.0));
        assert_eq!(first.peek(TWICE), Some(&Value::Float(6.0)));
    }

    #[test]
    fn runtime_cycle_is_reported_with_its_path() {
        let registry = small_registry();
        let config = Config::new();
        let net = one_node();
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));

        let err = store.get(LOOP_A).unwrap_err();
        assert_eq!(
            err,
            EvalError::DependencyCycle {
                path: vec!["LoopA".into(), "LoopB".into(), "LoopA".into()],
            }
        );
        // The failed call must not poison the cache.
        assert!(store.peek(LOOP_A).is_none());
        assert_eq!(store.get(TWICE).unwrap(), Value::Float(6.0));
    }

    #[test]
    fn leaf_parse_failure_names_kind_and_raw_value() {
        let registry = small_registry();
        let mut config = Config::new();
        config.set("leaf", "not a number");
        let net = one_node();
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));

        match store.get(LEAF).unwrap_err() {
            EvalError::BadConfig { variable, raw, .. } => {
                assert_eq!(variable, "Leaf");
                assert_eq!(raw, "not a number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn leaf_check_failure_surfaces_as_config_error() {
        use crate::registry::assert_positive;

        const POS: VarKey = VarKey("Positive");
        let mut b = RegistryBuilder::new();
        b.define(VariableDef::leaf_checked(
            POS,
            "t",
            "positive",
            &["pos"],
            "",
            1.0,
            assert_positive,
        ));
        let registry = b.build().unwrap();

        let mut config = Config::new();
        config.set("pos", "-4");
        let net = one_node();
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));
        match store.get(POS).unwrap_err() {
            EvalError::BadConfig { variable, raw, reason } => {
                assert_eq!(variable, "Positive");
                assert_eq!(raw, "-4");
                assert!(reason.contains("positive"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let registry = small_registry();
        let config = Config::new();
        let net = one_node();
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));
        assert_eq!(
            store.get(VarKey("Nowhere")).unwrap_err(),
            EvalError::UnknownVariable("Nowhere".to_string())
        );
    }

    #[test]
    fn strict_mode_rejects_undeclared_reads() {
        const SNEAKY: VarKey = VarKey("Sneaky");

        fn compute_sneaky(vs: &mut VariableStore) -> Result<Value, EvalError> {
            // Reads LEAF without declaring it.
            vs.get(LEAF)
        }

        let mut b = RegistryBuilder::new();
        b.define(VariableDef::leaf(LEAF, "t", "leaf", &["leaf"], "", 3.0));
        b.define(VariableDef::derived(
            SNEAKY,
            "t",
            "sneaky",
            &[],
            "",
            &[],
            compute_sneaky,
        ));
        let registry = b.build().unwrap();
        let config = Config::new();
        let net = one_node();

        let mut lax = VariableStore::new(&registry, &config, &net, NodeId(0));
        assert_eq!(lax.get(SNEAKY).unwrap(), Value::Float(3.0));

        let mut strict = VariableStore::new(&registry, &config, &net, NodeId(0)).strict();
        assert_eq!(
            strict.get(SNEAKY).unwrap_err(),
            EvalError::UndeclaredDependency {
                variable: "Sneaky".to_string(),
                dependency: "Leaf".to_string(),
            }
        );
    }
}
