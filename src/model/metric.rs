//! The headline metric: the maximum length of medium voltage line for which
//! grid extension is cheaper than the cheapest standalone option, plus the
//! per-node system choice and the system-wide totals folded over children.

use crate::eval::{EvalError, VariableStore};
use crate::registry::{RegistryBuilder, SystemKind, Value, VarKey, VariableDef};

use super::{cost_grid, cost_mini_grid, cost_off_grid, demand, finance};

pub const METRIC: VarKey = VarKey("Metric");
pub const SYSTEM: VarKey = VarKey("System");
pub const OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND: VarKey =
    VarKey("OffGridSystemTotalDiscountedDemand");
pub const OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_COST: VarKey =
    VarKey("OffGridSystemTotalDiscountedCost");
pub const OFF_GRID_SYSTEM_TOTAL_LEVELIZED_COST: VarKey = VarKey("OffGridSystemTotalLevelizedCost");
pub const MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND: VarKey =
    VarKey("MiniGridSystemTotalDiscountedDemand");
pub const MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_COST: VarKey =
    VarKey("MiniGridSystemTotalDiscountedCost");
pub const MINI_GRID_SYSTEM_TOTAL_LEVELIZED_COST: VarKey =
    VarKey("MiniGridSystemTotalLevelizedCost");
pub const GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND: VarKey = VarKey("GridSystemTotalDiscountedDemand");
pub const GRID_SYSTEM_TOTAL_DISCOUNTED_COST: VarKey = VarKey("GridSystemTotalDiscountedCost");
pub const GRID_SYSTEM_TOTAL_LEVELIZED_COST: VarKey = VarKey("GridSystemTotalLevelizedCost");
pub const GRID_SYSTEM_TOTAL_INTERNAL_INITIAL_COST: VarKey =
    VarKey("GridSystemTotalInternalInitialCost");
pub const GRID_SYSTEM_TOTAL_INTERNAL_RECURRING_COST_PER_YEAR: VarKey =
    VarKey("GridSystemTotalInternalRecurringCostPerYear");
pub const GRID_SYSTEM_TOTAL_INITIAL_COST: VarKey = VarKey("GridSystemTotalInitialCost");
pub const GRID_SYSTEM_TOTAL_RECURRING_COST: VarKey = VarKey("GridSystemTotalRecurringCost");

const METRIC_DEPENDENCIES: &[VarKey] = &[
    cost_off_grid::OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
    cost_off_grid::OFF_GRID_SYSTEM_NODAL_LEVELIZED_COST,
    cost_mini_grid::MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
    cost_mini_grid::MINI_GRID_SYSTEM_NODAL_LEVELIZED_COST,
    cost_grid::GRID_INTERNAL_SYSTEM_NODAL_DISCOUNTED_COST,
    cost_grid::GRID_INTERNAL_SYSTEM_NODAL_LEVELIZED_COST,
    cost_grid::GRID_EXTERNAL_SYSTEM_NODAL_DISCOUNTED_COST_PER_METER,
];

const SYSTEM_DEPENDENCIES: &[VarKey] = &[
    demand::PROJECTED_NODAL_DEMAND_PER_YEAR,
    cost_mini_grid::MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
    cost_off_grid::OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
];

pub fn register(b: &mut RegistryBuilder) {
    b.define(VariableDef::derived(
        METRIC,
        "metric",
        "maximum length of medium voltage line extension",
        &["mvmax"],
        "meters",
        METRIC_DEPENDENCIES,
        compute_metric,
    ));
    b.define(VariableDef::derived(
        SYSTEM,
        "metric",
        "system",
        &["system"],
        "",
        SYSTEM_DEPENDENCIES,
        compute_system,
    ));
    b.define(VariableDef::aggregate(
        OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND,
        "system (off-grid)",
        "system total discounted demand",
        &["og_dem_d"],
        "kilowatt-hours",
        0.0,
        &[SYSTEM, demand::PROJECTED_NODAL_DISCOUNTED_DEMAND],
        applies_off_grid,
        fold_discounted_demand,
    ));
    b.define(VariableDef::aggregate(
        OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
        "system (off-grid)",
        "system total discounted cost",
        &["og_tot_d"],
        "dollars",
        0.0,
        &[SYSTEM, cost_off_grid::OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST],
        applies_off_grid,
        fold_off_grid_discounted_cost,
    ));
    b.define(VariableDef::derived(
        OFF_GRID_SYSTEM_TOTAL_LEVELIZED_COST,
        "system (off-grid)",
        "system total levelized cost",
        &["og_tot_lev"],
        "dollars per kilowatt-hour",
        &[
            OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND,
            OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
        ],
        compute_off_grid_total_levelized_cost,
    ));
    b.define(VariableDef::aggregate(
        MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND,
        "system (mini-grid)",
        "system total discounted demand",
        &["mg_dem_d"],
        "kilowatt-hours",
        0.0,
        &[SYSTEM, demand::PROJECTED_NODAL_DISCOUNTED_DEMAND],
        applies_mini_grid,
        fold_discounted_demand,
    ));
    b.define(VariableDef::aggregate(
        MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
        "system (mini-grid)",
        "system total discounted cost",
        &["mg_tot_d"],
        "dollars",
        0.0,
        &[SYSTEM, cost_mini_grid::MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST],
        applies_mini_grid,
        fold_mini_grid_discounted_cost,
    ));
    b.define(VariableDef::derived(
        MINI_GRID_SYSTEM_TOTAL_LEVELIZED_COST,
        "system (mini-grid)",
        "system total levelized cost",
        &["mg_tot_lev"],
        "dollars per kilowatt-hour",
        &[
            MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND,
            MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
        ],
        compute_mini_grid_total_levelized_cost,
    ));
    b.define(VariableDef::aggregate(
        GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND,
        "system (grid)",
        "system total discounted demand",
        &["gr_dem_d"],
        "kilowatt-hours",
        0.0,
        &[SYSTEM, demand::PROJECTED_NODAL_DISCOUNTED_DEMAND],
        applies_newly_connected_grid,
        fold_discounted_demand,
    ));
    b.define(VariableDef::aggregate(
        GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
        "system (grid)",
        "system total discounted cost",
        &["gr_tot_d"],
        "dollars",
        0.0,
        &[
            SYSTEM,
            cost_grid::GRID_INTERNAL_SYSTEM_NODAL_DISCOUNTED_COST,
            cost_grid::GRID_EXTERNAL_SYSTEM_NODAL_DISCOUNTED_COST_PER_METER,
        ],
        applies_newly_connected_grid,
        fold_grid_discounted_cost,
    ));
    b.define(VariableDef::derived(
        GRID_SYSTEM_TOTAL_LEVELIZED_COST,
        "system (grid)",
        "system total levelized cost",
        &["gr_tot_lev"],
        "dollars per kilowatt-hour",
        &[
            GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND,
            GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
        ],
        compute_grid_total_levelized_cost,
    ));
    b.define(VariableDef::aggregate(
        GRID_SYSTEM_TOTAL_INTERNAL_INITIAL_COST,
        "system (grid)",
        "system total internal initial cost",
        &["gr_tot_int_init"],
        "dollars",
        0.0,
        &[SYSTEM, cost_grid::GRID_INTERNAL_SYSTEM_INITIAL_COST],
        applies_newly_connected_grid,
        fold_grid_internal_initial_cost,
    ));
    b.define(VariableDef::aggregate(
        GRID_SYSTEM_TOTAL_INTERNAL_RECURRING_COST_PER_YEAR,
        "system (grid)",
        "system total internal recurring cost per year",
        &["gr_tot_int_recur"],
        "dollars per year",
        0.0,
        &[SYSTEM, cost_grid::GRID_INTERNAL_SYSTEM_RECURRING_COST_PER_YEAR],
        applies_newly_connected_grid,
        fold_grid_internal_recurring_cost,
    ));
    b.define(VariableDef::derived(
        GRID_SYSTEM_TOTAL_INITIAL_COST,
        "system (grid)",
        "system total initial cost",
        &["gr_tot_init"],
        "dollars",
        &[
            GRID_SYSTEM_TOTAL_INTERNAL_INITIAL_COST,
            cost_grid::GRID_EXTERNAL_SYSTEM_INITIAL_COST_PER_METER,
        ],
        compute_grid_total_initial_cost,
    ));
    b.define(VariableDef::derived(
        GRID_SYSTEM_TOTAL_RECURRING_COST,
        "system (grid)",
        "system total recurring cost",
        &["gr_tot_recur"],
        "dollars",
        &[
            GRID_SYSTEM_TOTAL_INTERNAL_RECURRING_COST_PER_YEAR,
            cost_grid::GRID_EXTERNAL_SYSTEM_RECURRING_COST_PER_METER_PER_YEAR,
            finance::DISCOUNTED_CASH_FLOW_FACTOR,
        ],
        compute_grid_total_recurring_cost,
    ));
}

fn compute_metric(vs: &mut VariableStore) -> Result<Value, EvalError> {
    // Resolved for reporting; the formula only needs the discounted figures.
    vs.get_f64(cost_off_grid::OFF_GRID_SYSTEM_NODAL_LEVELIZED_COST)?;
    vs.get_f64(cost_mini_grid::MINI_GRID_SYSTEM_NODAL_LEVELIZED_COST)?;
    vs.get_f64(cost_grid::GRID_INTERNAL_SYSTEM_NODAL_LEVELIZED_COST)?;
    let standalone_cost = vs
        .get_f64(cost_off_grid::OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST)?
        .min(vs.get_f64(cost_mini_grid::MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST)?);
    let internal_cost = vs.get_f64(cost_grid::GRID_INTERNAL_SYSTEM_NODAL_DISCOUNTED_COST)?;
    // Whatever the cheapest standalone option leaves over is the budget for
    // extending the medium voltage line; never negative.
    let external_budget = (standalone_cost - internal_cost).max(0.0);
    let cost_per_meter =
        vs.get_f64(cost_grid::GRID_EXTERNAL_SYSTEM_NODAL_DISCOUNTED_COST_PER_METER)?;
    if cost_per_meter == 0.0 {
        return Ok(Value::Float(0.0));
    }
    Ok(Value::Float(external_budget / cost_per_meter))
}

fn compute_system(vs: &mut VariableStore) -> Result<Value, EvalError> {
    if vs.get_f64(demand::PROJECTED_NODAL_DEMAND_PER_YEAR)? == 0.0 {
        return Ok(Value::System(SystemKind::Unelectrified));
    }
    if vs.topology().is_node_connected(vs.node()) {
        return Ok(Value::System(SystemKind::Grid));
    }
    let mini_grid = vs.get_f64(cost_mini_grid::MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST)?;
    let off_grid = vs.get_f64(cost_off_grid::OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST)?;
    // Strict comparison: a tie goes to off-grid.
    if mini_grid < off_grid {
        Ok(Value::System(SystemKind::MiniGrid))
    } else {
        Ok(Value::System(SystemKind::OffGrid))
    }
}

fn applies_off_grid(child: &mut VariableStore) -> Result<bool, EvalError> {
    Ok(child.get_system(SYSTEM)? == SystemKind::OffGrid)
}

fn applies_mini_grid(child: &mut VariableStore) -> Result<bool, EvalError> {
    Ok(child.get_system(SYSTEM)? == SystemKind::MiniGrid)
}

/// Grid totals price the extension, so nodes that were grid-connected before
/// the scenario ran contribute nothing.
fn applies_newly_connected_grid(child: &mut VariableStore) -> Result<bool, EvalError> {
    Ok(child.get_system(SYSTEM)? == SystemKind::Grid
        && !child.topology().was_node_already_connected(child.node()))
}

fn fold_discounted_demand(acc: &mut f64, child: &mut VariableStore) -> Result<(), EvalError> {
    *acc += child.get_f64(demand::PROJECTED_NODAL_DISCOUNTED_DEMAND)?;
    Ok(())
}

fn fold_off_grid_discounted_cost(acc: &mut f64, child: &mut VariableStore) -> Result<(), EvalError> {
    *acc += child.get_f64(cost_off_grid::OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST)?;
    Ok(())
}

fn fold_mini_grid_discounted_cost(
    acc: &mut f64,
    child: &mut VariableStore,
) -> Result<(), EvalError> {
    *acc += child.get_f64(cost_mini_grid::MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST)?;
    Ok(())
}

fn fold_grid_discounted_cost(acc: &mut f64, child: &mut VariableStore) -> Result<(), EvalError> {
    let internal_cost = child.get_f64(cost_grid::GRID_INTERNAL_SYSTEM_NODAL_DISCOUNTED_COST)?;
    // A new connection is shared with the node at its other end, so this
    // node carries half its length.
    let new_connections = child.topology().connections(child.node(), false);
    let half_new_length = new_connections.iter().map(|e| e.weight).sum::<f64>() / 2.0;
    let cost_per_meter =
        child.get_f64(cost_grid::GRID_EXTERNAL_SYSTEM_NODAL_DISCOUNTED_COST_PER_METER)?;
    *acc += internal_cost + cost_per_meter * half_new_length;
    Ok(())
}

fn fold_grid_internal_initial_cost(
    acc: &mut f64,
    child: &mut VariableStore,
) -> Result<(), EvalError> {
    *acc += child.get_f64(cost_grid::GRID_INTERNAL_SYSTEM_INITIAL_COST)?;
    Ok(())
}

fn fold_grid_internal_recurring_cost(
    acc: &mut f64,
    child: &mut VariableStore,
) -> Result<(), EvalError> {
    *acc += child.get_f64(cost_grid::GRID_INTERNAL_SYSTEM_RECURRING_COST_PER_YEAR)?;
    Ok(())
}

fn compute_off_grid_total_levelized_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let demand = vs.get_f64(OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND)?;
    if demand == 0.0 {
        return Ok(Value::Float(0.0));
    }
    Ok(Value::Float(
        vs.get_f64(OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_COST)? / demand,
    ))
}

fn compute_mini_grid_total_levelized_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let demand = vs.get_f64(MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND)?;
    if demand == 0.0 {
        return Ok(Value::Float(0.0));
    }
    Ok(Value::Float(
        vs.get_f64(MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_COST)? / demand,
    ))
}

fn compute_grid_total_levelized_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let demand = vs.get_f64(GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND)?;
    if demand == 0.0 {
        return Ok(Value::Float(0.0));
    }
    Ok(Value::Float(
        vs.get_f64(GRID_SYSTEM_TOTAL_DISCOUNTED_COST)? / demand,
    ))
}

/// Assumes the external cost per meter is uniform across the network.
fn compute_grid_total_initial_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let new_network_meters = vs.topology().sum_network_weight(false);
    Ok(Value::Float(
        vs.get_f64(GRID_SYSTEM_TOTAL_INTERNAL_INITIAL_COST)?
            + vs.get_f64(cost_grid::GRID_EXTERNAL_SYSTEM_INITIAL_COST_PER_METER)?
                * new_network_meters,
    ))
}

/// Assumes the external recurring cost per meter and the discount factor are
/// uniform across the network.
fn compute_grid_total_recurring_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let new_network_meters = vs.topology().sum_network_weight(false);
    let discount_factor = vs.get_f64(finance::DISCOUNTED_CASH_FLOW_FACTOR)?;
    let internal_per_year = vs.get_f64(GRID_SYSTEM_TOTAL_INTERNAL_RECURRING_COST_PER_YEAR)?;
    let external_per_year = new_network_meters
        * vs.get_f64(cost_grid::GRID_EXTERNAL_SYSTEM_RECURRING_COST_PER_METER_PER_YEAR)?;
    Ok(Value::Float(
        discount_factor * (internal_per_year + external_per_year),
    ))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::config::Config;
    use crate::eval::{fold_children, fold_children_parallel};
    use crate::model;
    use crate::registry::Registry;
    use crate::topology::{GridStatus, Network, NodeId, Topology};

    /// Leaf stand-ins for the seven metric inputs so the formula can be
    /// pinned to exact figures.
    fn metric_fixture_registry() -> Registry {
        let mut b = RegistryBuilder::new();
        b.define(VariableDef::leaf(
            cost_off_grid::OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
            "t",
            "off-grid discounted",
            &["off_d"],
            "",
            1000.0,
        ));
        b.define(VariableDef::leaf(
            cost_off_grid::OFF_GRID_SYSTEM_NODAL_LEVELIZED_COST,
            "t",
            "off-grid levelized",
            &["off_lev"],
            "",
            0.0,
        ));
        b.define(VariableDef::leaf(
            cost_mini_grid::MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
            "t",
            "mini-grid discounted",
            &["mini_d"],
            "",
            1200.0,
        ));
        b.define(VariableDef::leaf(
            cost_mini_grid::MINI_GRID_SYSTEM_NODAL_LEVELIZED_COST,
            "t",
            "mini-grid levelized",
            &["mini_lev"],
            "",
            0.0,
        ));
        b.define(VariableDef::leaf(
            cost_grid::GRID_INTERNAL_SYSTEM_NODAL_DISCOUNTED_COST,
            "t",
            "grid internal discounted",
            &["int_d"],
            "",
            400.0,
        ));
        b.define(VariableDef::leaf(
            cost_grid::GRID_INTERNAL_SYSTEM_NODAL_LEVELIZED_COST,
            "t",
            "grid internal levelized",
            &["int_lev"],
            "",
            0.0,
        ));
        b.define(VariableDef::leaf(
            cost_grid::GRID_EXTERNAL_SYSTEM_NODAL_DISCOUNTED_COST_PER_METER,
            "t",
            "grid external per meter",
            &["ext_dm"],
            "",
            2.0,
        ));
        b.define(VariableDef::derived(
            METRIC,
            "t",
            "metric",
            &["mvmax"],
            "meters",
            METRIC_DEPENDENCIES,
            compute_metric,
        ));
        b.build().unwrap()
    }

    fn system_fixture_registry() -> Registry {
        let mut b = RegistryBuilder::new();
        b.define(VariableDef::leaf(
            demand::PROJECTED_NODAL_DEMAND_PER_YEAR,
            "t",
            "annual demand",
            &["dmd"],
            "",
            1.0,
        ));
        b.define(VariableDef::leaf(
            cost_mini_grid::MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
            "t",
            "mini-grid discounted",
            &["mini_d"],
            "",
            1000.0,
        ));
        b.define(VariableDef::leaf(
            cost_off_grid::OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
            "t",
            "off-grid discounted",
            &["off_d"],
            "",
            1000.0,
        ));
        b.define(VariableDef::derived(
            SYSTEM,
            "t",
            "system",
            &["system"],
            "",
            SYSTEM_DEPENDENCIES,
            compute_system,
        ));
        b.build().unwrap()
    }

    fn one_node(status: GridStatus) -> Network {
        let mut net = Network::new();
        net.add_node(status);
        net
    }

    #[test]
    fn extension_budget_buys_three_hundred_meters() {
        let registry = metric_fixture_registry();
        let config = Config::new();
        let net = one_node(GridStatus::Off);
        // Cheapest standalone is off-grid at 1000; 600 left over at $2/m.
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0)).strict();
        assert_eq!(store.get_f64(METRIC).unwrap(), 300.0);
    }

    #[test]
    fn extension_budget_never_goes_negative() {
        let registry = metric_fixture_registry();
        let mut config = Config::new();
        config.set("int_d", "2000");
        let net = one_node(GridStatus::Off);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0)).strict();
        assert_eq!(store.get_f64(METRIC).unwrap(), 0.0);
    }

    #[rstest]
    #[case("900", "1000", SystemKind::MiniGrid)]
    #[case("1000", "1000", SystemKind::OffGrid)]
    #[case("1100", "1000", SystemKind::OffGrid)]
    fn cheaper_standalone_option_wins_and_ties_go_off_grid(
        #[case] mini_grid: &str,
        #[case] off_grid: &str,
        #[case] expected: SystemKind,
    ) {
        let registry = system_fixture_registry();
        let mut config = Config::new();
        config.set("mini_d", mini_grid);
        config.set("off_d", off_grid);
        let net = one_node(GridStatus::Off);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0)).strict();
        assert_eq!(store.get_system(SYSTEM).unwrap(), expected);
    }

    #[test]
    fn zero_demand_is_unelectrified_even_when_connected() {
        let registry = system_fixture_registry();
        let mut config = Config::new();
        config.set("dmd", "0");
        let net = one_node(GridStatus::Existing);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0)).strict();
        assert_eq!(
            store.get_system(SYSTEM).unwrap(),
            SystemKind::Unelectrified
        );
    }

    #[test]
    fn connected_node_chooses_grid() {
        let registry = system_fixture_registry();
        let config = Config::new();
        let net = one_node(GridStatus::New);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0)).strict();
        assert_eq!(store.get_system(SYSTEM).unwrap(), SystemKind::Grid);
    }

    const ALL_AGGREGATES: &[VarKey] = &[
        OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND,
        OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
        MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND,
        MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
        GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND,
        GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
        GRID_SYSTEM_TOTAL_INTERNAL_INITIAL_COST,
        GRID_SYSTEM_TOTAL_INTERNAL_RECURRING_COST_PER_YEAR,
    ];

    #[test]
    fn zero_demand_node_contributes_to_no_totals() {
        let registry = model::standard().unwrap();
        let mut config = Config::new();
        config.set_nodal(NodeId(1), "de_pop", "0");
        let mut net = Network::new();
        let root = net.add_node(GridStatus::Existing);
        let child = net.add_node(GridStatus::Off);
        net.add_child(root, child);

        let mut parent = VariableStore::new(&registry, &config, &net, root);
        let mut children = vec![VariableStore::new(&registry, &config, &net, child)];
        fold_children(&mut parent, &mut children).unwrap();

        assert_eq!(
            children[0].get_system(SYSTEM).unwrap(),
            SystemKind::Unelectrified
        );
        for &key in ALL_AGGREGATES {
            assert_eq!(parent.get_f64(key).unwrap(), 0.0, "{key}");
        }
        assert_eq!(
            parent.get_f64(OFF_GRID_SYSTEM_TOTAL_LEVELIZED_COST).unwrap(),
            0.0
        );
    }

    #[test]
    fn already_connected_nodes_are_excluded_from_grid_totals() {
        let registry = model::standard().unwrap();
        let config = Config::new();
        let mut net = Network::new();
        let root = net.add_node(GridStatus::Existing);
        let old = net.add_node(GridStatus::Existing);
        let new = net.add_node(GridStatus::New);
        net.add_child(root, old);
        net.add_child(root, new);
        net.connect(root, new, 100.0, false);

        let mut parent = VariableStore::new(&registry, &config, &net, root);
        let mut children = vec![
            VariableStore::new(&registry, &config, &net, old),
            VariableStore::new(&registry, &config, &net, new),
        ];
        fold_children(&mut parent, &mut children).unwrap();

        // Both are grid nodes, but only the newly connected one is priced.
        assert_eq!(children[0].get_system(SYSTEM).unwrap(), SystemKind::Grid);
        assert_eq!(children[1].get_system(SYSTEM).unwrap(), SystemKind::Grid);

        let internal = children[1]
            .get_f64(cost_grid::GRID_INTERNAL_SYSTEM_NODAL_DISCOUNTED_COST)
            .unwrap();
        let per_meter = children[1]
            .get_f64(cost_grid::GRID_EXTERNAL_SYSTEM_NODAL_DISCOUNTED_COST_PER_METER)
            .unwrap();
        let total = parent.get_f64(GRID_SYSTEM_TOTAL_DISCOUNTED_COST).unwrap();
        // Half of the 100 m connection is apportioned to the new node.
        assert!((total - (internal + per_meter * 50.0)).abs() < 1e-9);

        let demand = children[1]
            .get_f64(demand::PROJECTED_NODAL_DISCOUNTED_DEMAND)
            .unwrap();
        assert!(
            (parent.get_f64(GRID_SYSTEM_TOTAL_DISCOUNTED_DEMAND).unwrap() - demand).abs() < 1e-9
        );
    }

    fn mixed_scenario() -> (Config, Network) {
        let mut config = Config::new();
        // Expensive fuel pushes the first child to off-grid; expensive
        // panels push the second to mini-grid; the third is connected.
        config.set_nodal(NodeId(1), "mg_fl_cl", "1000");
        config.set_nodal(NodeId(2), "og_pv_ckw", "1000000");
        let mut net = Network::new();
        let root = net.add_node(GridStatus::Existing);
        let solar = net.add_node(GridStatus::Off);
        let diesel = net.add_node(GridStatus::Off);
        let wired = net.add_node(GridStatus::New);
        net.add_child(root, solar);
        net.add_child(root, diesel);
        net.add_child(root, wired);
        net.connect(root, wired, 80.0, false);
        (config, net)
    }

    #[test]
    fn each_total_counts_only_its_own_system() {
        let registry = model::standard().unwrap();
        let (config, net) = mixed_scenario();

        let mut parent = VariableStore::new(&registry, &config, &net, NodeId(0));
        let mut children: Vec<VariableStore> = (1..4)
            .map(|i| VariableStore::new(&registry, &config, &net, NodeId(i)))
            .collect();
        fold_children(&mut parent, &mut children).unwrap();

        assert_eq!(children[0].get_system(SYSTEM).unwrap(), SystemKind::OffGrid);
        assert_eq!(
            children[1].get_system(SYSTEM).unwrap(),
            SystemKind::MiniGrid
        );
        assert_eq!(children[2].get_system(SYSTEM).unwrap(), SystemKind::Grid);

        let off_nodal = children[0]
            .get_f64(cost_off_grid::OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST)
            .unwrap();
        assert!(
            (parent.get_f64(OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_COST).unwrap() - off_nodal).abs()
                < 1e-9
        );
        let mini_nodal = children[1]
            .get_f64(cost_mini_grid::MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST)
            .unwrap();
        assert!(
            (parent
                .get_f64(MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_COST)
                .unwrap()
                - mini_nodal)
                .abs()
                < 1e-9
        );

        // Levelized totals divide cost by demand for the same membership.
        let off_demand = children[0]
            .get_f64(demand::PROJECTED_NODAL_DISCOUNTED_DEMAND)
            .unwrap();
        let off_levelized = parent.get_f64(OFF_GRID_SYSTEM_TOTAL_LEVELIZED_COST).unwrap();
        assert!((off_levelized - off_nodal / off_demand).abs() < 1e-9);
    }

    #[test]
    fn grid_network_totals_price_the_whole_new_network() {
        let registry = model::standard().unwrap();
        let config = Config::new();
        let mut net = Network::new();
        let root = net.add_node(GridStatus::Existing);
        let new = net.add_node(GridStatus::New);
        net.add_child(root, new);
        net.connect(root, new, 100.0, false);
        // Pre-existing line must not count toward the extension totals.
        net.connect(root, new, 300.0, true);

        let mut parent = VariableStore::new(&registry, &config, &net, root);
        let mut children = vec![VariableStore::new(&registry, &config, &net, new)];
        fold_children(&mut parent, &mut children).unwrap();

        assert_eq!(net.sum_network_weight(false), 100.0);
        let internal_initial = parent
            .get_f64(GRID_SYSTEM_TOTAL_INTERNAL_INITIAL_COST)
            .unwrap();
        let per_meter_initial = parent
            .get_f64(cost_grid::GRID_EXTERNAL_SYSTEM_INITIAL_COST_PER_METER)
            .unwrap();
        let total_initial = parent.get_f64(GRID_SYSTEM_TOTAL_INITIAL_COST).unwrap();
        assert!((total_initial - (internal_initial + per_meter_initial * 100.0)).abs() < 1e-9);

        let discount_factor = parent.get_f64(finance::DISCOUNTED_CASH_FLOW_FACTOR).unwrap();
        let internal_recurring = parent
            .get_f64(GRID_SYSTEM_TOTAL_INTERNAL_RECURRING_COST_PER_YEAR)
            .unwrap();
        let per_meter_recurring = parent
            .get_f64(cost_grid::GRID_EXTERNAL_SYSTEM_RECURRING_COST_PER_METER_PER_YEAR)
            .unwrap();
        let total_recurring = parent.get_f64(GRID_SYSTEM_TOTAL_RECURRING_COST).unwrap();
        let expected = discount_factor * (internal_recurring + 100.0 * per_meter_recurring);
        assert!((total_recurring - expected).abs() < 1e-9);
    }

    #[test]
    fn parallel_prefetch_matches_serial_totals_on_the_full_model() {
        let registry = model::standard().unwrap();
        let (config, net) = mixed_scenario();

        let run = |parallel: bool| -> Vec<f64> {
            let mut parent = VariableStore::new(&registry, &config, &net, NodeId(0));
            let mut children: Vec<VariableStore> = (1..4)
                .map(|i| VariableStore::new(&registry, &config, &net, NodeId(i)))
                .collect();
            if parallel {
                fold_children_parallel(&mut parent, &mut children).unwrap();
            } else {
                fold_children(&mut parent, &mut children).unwrap();
            }
            ALL_AGGREGATES
                .iter()
                .map(|&key| parent.get_f64(key).unwrap())
                .collect()
        };

        assert_eq!(run(false), run(true));
    }
}
