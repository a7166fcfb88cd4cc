//! Explicit registry construction: duplicate checks and static cycle
//! analysis happen here, before any evaluation is possible.

use std::collections::HashMap;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::DiGraph;
use smallvec::SmallVec;
use thiserror::Error;

use super::{VarKey, VariableDef, VariableId};

/// Fatal configuration errors reported at registry-build time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate variable '{0}'")]
    DuplicateKey(String),
    #[error("alias '{alias}' is claimed by both '{first}' and '{second}'")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },
    #[error("'{variable}' depends on unknown variable '{dependency}'")]
    UnknownDependency {
        variable: String,
        dependency: String,
    },
    #[error("dependency cycle among: {}", members.join(", "))]
    DependencyCycle { members: Vec<String> },
}

/// Collects variable definitions and produces an immutable [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    defs: Vec<VariableDef>,
    sections: Vec<&'static str>,
    roots: Vec<VarKey>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, def: VariableDef) -> &mut Self {
        self.defs.push(def);
        self
    }

    /// Registers a whole formula module's definitions.
    pub fn module(mut self, register: fn(&mut RegistryBuilder)) -> Self {
        register(&mut self);
        self
    }

    /// Section order used by the reporting layer.
    pub fn sections(mut self, sections: &[&'static str]) -> Self {
        self.sections = sections.to_vec();
        self
    }

    /// Primary output kinds, in report order.
    pub fn roots(mut self, roots: &[VarKey]) -> Self {
        self.roots = roots.to_vec();
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        let count = self.defs.len();

        // 1. Identity and alias uniqueness
        let mut by_key: HashMap<&'static str, VariableId> = HashMap::with_capacity(count);
        let mut by_alias: HashMap<&'static str, VariableId> = HashMap::new();
        for (i, def) in self.defs.iter().enumerate() {
            let id = VariableId(i as u32);
            if by_key.insert(def.key.0, id).is_some() {
                return Err(RegistryError::DuplicateKey(def.key.to_string()));
            }
            for &alias in def.aliases {
                if let Some(first) = by_alias.insert(alias, id) {
                    return Err(RegistryError::DuplicateAlias {
                        alias: alias.to_string(),
                        first: self.defs[first.index()].key.to_string(),
                        second: def.key.to_string(),
                    });
                }
            }
        }

        // 2. Resolve declared dependencies to dense ids
        let mut dep_ids: Vec<SmallVec<[VariableId; 8]>> = Vec::with_capacity(count);
        for def in &self.defs {
            let mut ids = SmallVec::new();
            for dep in def.dependencies() {
                let id = by_key
                    .get(dep.0)
                    .copied()
                    .ok_or_else(|| RegistryError::UnknownDependency {
                        variable: def.key.to_string(),
                        dependency: dep.to_string(),
                    })?;
                ids.push(id);
            }
            dep_ids.push(ids);
        }

        // 3. Static cycle analysis over the declared dependency graph.
        //    Edges run dependency -> dependent, so a topological order lists
        //    every variable after the variables it reads.
        let mut graph: DiGraph<VariableId, ()> = DiGraph::with_capacity(count, count * 2);
        let nodes: Vec<_> = (0..count)
            .map(|i| graph.add_node(VariableId(i as u32)))
            .collect();
        for (i, deps) in dep_ids.iter().enumerate() {
            for dep in deps {
                graph.add_edge(nodes[dep.index()], nodes[i], ());
            }
        }
        let order = match toposort(&graph, None) {
            Ok(order) => order,
            Err(_) => {
                for scc in tarjan_scc(&graph) {
                    let cyclic = scc.len() > 1 || scc.iter().any(|&n| graph.contains_edge(n, n));
                    if cyclic {
                        let mut members: Vec<String> = scc
                            .iter()
                            .map(|&n| self.defs[graph[n].index()].key.to_string())
                            .collect();
                        members.sort();
                        return Err(RegistryError::DependencyCycle { members });
                    }
                }
                unreachable!("toposort failed without a strongly connected component");
            }
        };

        // 4. Aggregate index and "reads an aggregate" reachability, used by
        //    the reporting layer to separate nodal from system variables.
        let aggregates: Vec<VariableId> = self
            .defs
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_aggregate())
            .map(|(i, _)| VariableId(i as u32))
            .collect();
        let mut reads_aggregates = vec![false; count];
        for node in order {
            let i = graph[node].index();
            for dep in &dep_ids[i] {
                let d = dep.index();
                if self.defs[d].is_aggregate() || reads_aggregates[d] {
                    reads_aggregates[i] = true;
                }
            }
        }

        Ok(Registry {
            defs: self.defs,
            dep_ids,
            by_key,
            by_alias,
            aggregates,
            reads_aggregates,
            sections: self.sections,
            roots: self.roots,
        })
    }
}

/// Immutable catalog of variable kinds. Built once, shared by every context.
pub struct Registry {
    defs: Vec<VariableDef>,
    dep_ids: Vec<SmallVec<[VariableId; 8]>>,
    by_key: HashMap<&'static str, VariableId>,
    by_alias: HashMap<&'static str, VariableId>,
    aggregates: Vec<VariableId>,
    reads_aggregates: Vec<bool>,
    sections: Vec<&'static str>,
    roots: Vec<VarKey>,
}

// Behavior holds plain fn pointers, so Debug cannot be derived; a summary
// is enough for assertion failures.
impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("variables", &self.defs.len())
            .field("aggregates", &self.aggregates.len())
            .field("sections", &self.sections)
            .finish()
    }
}

impl Registry {
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn def(&self, id: VariableId) -> &VariableDef {
        &self.defs[id.index()]
    }

    pub fn id_of(&self, key: VarKey) -> Option<VariableId> {
        self.by_key.get(key.0).copied()
    }

    /// Lookup by short alias, the addressing scheme of external configuration.
    pub fn by_alias(&self, alias: &str) -> Option<VariableId> {
        self.by_alias.get(alias).copied()
    }

    /// Declared dependencies, resolved to dense ids.
    pub fn dependencies(&self, id: VariableId) -> &[VariableId] {
        &self.dep_ids[id.index()]
    }

    pub fn aggregates(&self) -> &[VariableId] {
        &self.aggregates
    }

    /// Whether the variable transitively depends on any aggregate.
    pub fn reads_aggregates(&self, id: VariableId) -> bool {
        self.reads_aggregates[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        (0..self.defs.len()).map(|i| VariableId(i as u32))
    }

    pub fn sections(&self) -> &[&'static str] {
        &self.sections
    }

    /// Position of a section in the declared order; unknown sections sort last.
    pub fn section_rank(&self, section: &str) -> usize {
        self.sections
            .iter()
            .position(|s| *s == section)
            .unwrap_or(self.sections.len())
    }

    pub fn roots(&self) -> &[VarKey] {
        &self.roots
    }
}
