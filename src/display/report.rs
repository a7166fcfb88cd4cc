//! Report rows: per-node variables and system-wide totals, grouped by the
//! registry's declared section order.

use serde::Serialize;

use crate::eval::{EvalError, VariableStore};
use crate::registry::{Value, VariableId};

/// One line of a report. `value` is whatever the store has cached; rows for
/// unresolved variables carry `None` rather than forcing a resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub variable: &'static str,
    pub section: &'static str,
    pub option: &'static str,
    pub alias: Option<&'static str>,
    pub units: &'static str,
    pub value: Option<Value>,
}

fn row(store: &VariableStore, id: VariableId) -> ReportRow {
    let def = store.registry().def(id);
    ReportRow {
        variable: def.key.0,
        section: def.section,
        option: def.option,
        alias: def.aliases.last().copied(),
        units: def.units,
        value: store.peek(def.key).cloned(),
    }
}

fn sorted_by_section(store: &VariableStore, mut ids: Vec<VariableId>) -> Vec<ReportRow> {
    let registry = store.registry();
    ids.sort_by_key(|&id| (registry.section_rank(registry.def(id).section), id));
    ids.into_iter().map(|id| row(store, id)).collect()
}

/// Variables evaluated per node: everything that neither is an aggregate nor
/// reads one.
pub fn node_rows(store: &VariableStore) -> Vec<ReportRow> {
    let registry = store.registry();
    let ids = registry
        .ids()
        .filter(|&id| !registry.def(id).is_aggregate() && !registry.reads_aggregates(id))
        .collect();
    sorted_by_section(store, ids)
}

/// System-wide totals and their summaries, meaningful only after a fold pass.
pub fn system_rows(store: &VariableStore) -> Vec<ReportRow> {
    let registry = store.registry();
    let ids = registry
        .ids()
        .filter(|&id| registry.def(id).is_aggregate() || registry.reads_aggregates(id))
        .collect();
    sorted_by_section(store, ids)
}

/// The registry's primary outputs, in their declared order.
pub fn root_rows(store: &VariableStore) -> Vec<ReportRow> {
    store
        .registry()
        .roots()
        .iter()
        .filter_map(|&key| store.registry().id_of(key))
        .map(|id| row(store, id))
        .collect()
}

/// Resolves every per-node variable so [`node_rows`] reports values instead
/// of blanks.
pub fn resolve_nodal(store: &mut VariableStore) -> Result<(), EvalError> {
    let registry = store.registry();
    let ids: Vec<VariableId> = registry
        .ids()
        .filter(|&id| !registry.def(id).is_aggregate() && !registry.reads_aggregates(id))
        .collect();
    for id in ids {
        store.resolve(id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::eval::fold_children;
    use crate::model;
    use crate::topology::{GridStatus, Network, NodeId};

    #[test]
    fn node_rows_follow_the_section_order_and_carry_values() {
        let registry = model::standard().unwrap();
        let config = Config::new();
        let mut net = Network::new();
        net.add_node(GridStatus::Off);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));
        resolve_nodal(&mut store).unwrap();

        let rows = node_rows(&store);
        assert!(rows.iter().all(|r| r.value.is_some()));
        let ranks: Vec<usize> = rows
            .iter()
            .map(|r| registry.section_rank(r.section))
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
        // Totals never show up on the nodal side.
        assert!(rows.iter().all(|r| !r.variable.contains("Total")));
    }

    #[test]
    fn system_rows_cover_totals_and_their_summaries() {
        let registry = model::standard().unwrap();
        let config = Config::new();
        let mut net = Network::new();
        net.add_node(GridStatus::Off);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));

        let before = system_rows(&store);
        assert!(before.iter().all(|r| r.value.is_none()));

        fold_children(&mut store, &mut []).unwrap();
        let rows = system_rows(&store);
        assert!(rows
            .iter()
            .any(|r| r.variable == "OffGridSystemTotalDiscountedCost"));
        assert!(rows
            .iter()
            .filter(|r| r.alias == Some("og_tot_d"))
            .all(|r| r.value == Some(Value::Float(0.0))));
    }

    #[test]
    fn root_rows_keep_the_declared_order() {
        let registry = model::standard().unwrap();
        let config = Config::new();
        let mut net = Network::new();
        net.add_node(GridStatus::Off);
        let store = VariableStore::new(&registry, &config, &net, NodeId(0));

        let names: Vec<&str> = root_rows(&store).iter().map(|r| r.variable).collect();
        assert_eq!(names.first(), Some(&"Metric"));
        assert_eq!(names.last(), Some(&"GridSystemTotalRecurringCost"));
        assert_eq!(names.len(), model::ROOTS.len());
    }
}
