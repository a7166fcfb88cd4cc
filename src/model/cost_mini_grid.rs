//! Cost of a diesel mini-grid serving one node: generator plus low voltage
//! distribution.

use crate::eval::{EvalError, VariableStore};
use crate::registry::{assert_positive, RegistryBuilder, Value, VarKey, VariableDef};

use super::{cost_distribution, demand, finance};

pub const DIESEL_GENERATOR_COST_PER_KILOWATT: VarKey = VarKey("DieselGeneratorCostPerKilowatt");
pub const DIESEL_GENERATOR_LIFETIME: VarKey = VarKey("DieselGeneratorLifetime");
pub const DIESEL_GENERATOR_OAND_M_COST_FRACTION: VarKey =
    VarKey("DieselGeneratorOperationsAndMaintenanceCostPerYearAsFractionOfGeneratorCost");
pub const DIESEL_FUEL_COST_PER_LITER: VarKey = VarKey("DieselFuelCostPerLiter");
pub const DIESEL_FUEL_LITERS_CONSUMED_PER_KILOWATT_HOUR: VarKey =
    VarKey("DieselFuelLitersConsumedPerKilowattHour");
pub const DIESEL_GENERATOR_COST: VarKey = VarKey("DieselGeneratorCost");
pub const DIESEL_GENERATOR_REPLACEMENT_COST_PER_YEAR: VarKey =
    VarKey("DieselGeneratorReplacementCostPerYear");
pub const DIESEL_GENERATOR_OAND_M_COST_PER_YEAR: VarKey =
    VarKey("DieselGeneratorOperationsAndMaintenanceCostPerYear");
pub const MINI_GRID_SYSTEM_FUEL_COST_PER_YEAR: VarKey = VarKey("MiniGridSystemFuelCostPerYear");
pub const MINI_GRID_SYSTEM_INITIAL_COST: VarKey = VarKey("MiniGridSystemInitialCost");
pub const MINI_GRID_SYSTEM_RECURRING_COST_PER_YEAR: VarKey =
    VarKey("MiniGridSystemRecurringCostPerYear");
pub const MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST: VarKey =
    VarKey("MiniGridSystemNodalDiscountedCost");
pub const MINI_GRID_SYSTEM_NODAL_LEVELIZED_COST: VarKey =
    VarKey("MiniGridSystemNodalLevelizedCost");

pub fn register(b: &mut RegistryBuilder) {
    b.define(VariableDef::leaf(
        DIESEL_GENERATOR_COST_PER_KILOWATT,
        "system (mini-grid)",
        "diesel generator cost per kilowatt",
        &["MinGrid_DslGnrtrCstPrKw", "mg_dg_ckw"],
        "dollars per kilowatt",
        300.0,
    ));
    b.define(VariableDef::leaf_checked(
        DIESEL_GENERATOR_LIFETIME,
        "system (mini-grid)",
        "diesel generator lifetime",
        &["MinGrid_DslGnrtrLife", "mg_dg_life"],
        "years",
        5.0,
        assert_positive,
    ));
    b.define(VariableDef::leaf(
        DIESEL_GENERATOR_OAND_M_COST_FRACTION,
        "system (mini-grid)",
        "diesel generator operations and maintenance cost per year as fraction of generator cost",
        &["MinGrid_DslGnrtrOandMCstPrYrAsFctnOfGnrtrCst", "mg_dg_omf"],
        "",
        0.05,
    ));
    b.define(VariableDef::leaf(
        DIESEL_FUEL_COST_PER_LITER,
        "system (mini-grid)",
        "diesel fuel cost per liter",
        &["MinGrid_DslFuelCstPrLtr", "mg_fl_cl"],
        "dollars per liter",
        1.08,
    ));
    b.define(VariableDef::leaf(
        DIESEL_FUEL_LITERS_CONSUMED_PER_KILOWATT_HOUR,
        "system (mini-grid)",
        "diesel fuel liters consumed per kilowatt-hour",
        &["MinGrid_DslFuelLtrsCnsmdPrKwHr", "mg_fl_lkwh"],
        "liters per kilowatt-hour",
        0.5,
    ));
    b.define(VariableDef::derived(
        DIESEL_GENERATOR_COST,
        "system (mini-grid)",
        "diesel generator cost",
        &["MinGrid_DslGnrtrCst", "mg_dg_cst"],
        "dollars",
        &[
            demand::PROJECTED_NODAL_PEAK_DEMAND,
            DIESEL_GENERATOR_COST_PER_KILOWATT,
        ],
        compute_generator_cost,
    ));
    b.define(VariableDef::derived(
        DIESEL_GENERATOR_REPLACEMENT_COST_PER_YEAR,
        "system (mini-grid)",
        "diesel generator replacement cost per year",
        &["MinGrid_DslGnrtrRpmtCstPrYr", "mg_dg_rep"],
        "dollars per year",
        &[DIESEL_GENERATOR_COST, DIESEL_GENERATOR_LIFETIME],
        compute_generator_replacement_cost_per_year,
    ));
    b.define(VariableDef::derived(
        DIESEL_GENERATOR_OAND_M_COST_PER_YEAR,
        "system (mini-grid)",
        "diesel generator operations and maintenance cost per year",
        &["MinGrid_DslGnrtrOandMCstPrYr", "mg_dg_om"],
        "dollars per year",
        &[DIESEL_GENERATOR_OAND_M_COST_FRACTION, DIESEL_GENERATOR_COST],
        compute_generator_oand_m_cost_per_year,
    ));
    b.define(VariableDef::derived(
        MINI_GRID_SYSTEM_FUEL_COST_PER_YEAR,
        "system (mini-grid)",
        "mini-grid system fuel cost per year",
        &["MinGrid_FuelCstPrYr", "mg_fl"],
        "dollars per year",
        &[
            demand::PROJECTED_NODAL_DEMAND_PER_YEAR,
            DIESEL_FUEL_LITERS_CONSUMED_PER_KILOWATT_HOUR,
            DIESEL_FUEL_COST_PER_LITER,
        ],
        compute_fuel_cost_per_year,
    ));
    b.define(VariableDef::derived(
        MINI_GRID_SYSTEM_INITIAL_COST,
        "system (mini-grid)",
        "mini-grid system initial cost",
        &["MinGrid_InitCst", "mg_ini"],
        "dollars",
        &[
            DIESEL_GENERATOR_COST,
            cost_distribution::LOW_VOLTAGE_LINE_INITIAL_COST,
            cost_distribution::LOW_VOLTAGE_LINE_EQUIPMENT_INITIAL_COST,
        ],
        compute_initial_cost,
    ));
    b.define(VariableDef::derived(
        MINI_GRID_SYSTEM_RECURRING_COST_PER_YEAR,
        "system (mini-grid)",
        "mini-grid system recurring cost per year",
        &["MinGrid_RcrgCstPrYr", "mg_rec"],
        "dollars per year",
        &[
            DIESEL_GENERATOR_OAND_M_COST_PER_YEAR,
            DIESEL_GENERATOR_REPLACEMENT_COST_PER_YEAR,
            MINI_GRID_SYSTEM_FUEL_COST_PER_YEAR,
            cost_distribution::LOW_VOLTAGE_LINE_RECURRING_COST_PER_YEAR,
            cost_distribution::LOW_VOLTAGE_LINE_EQUIPMENT_RECURRING_COST_PER_YEAR,
        ],
        compute_recurring_cost_per_year,
    ));
    b.define(VariableDef::derived(
        MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
        "system (mini-grid)",
        "mini-grid system nodal discounted cost",
        &["MinGrid_NdlDsctdCst", "mg_nod_d"],
        "dollars",
        &[
            MINI_GRID_SYSTEM_INITIAL_COST,
            MINI_GRID_SYSTEM_RECURRING_COST_PER_YEAR,
            finance::DISCOUNTED_CASH_FLOW_FACTOR,
        ],
        compute_nodal_discounted_cost,
    ));
    b.define(VariableDef::derived(
        MINI_GRID_SYSTEM_NODAL_LEVELIZED_COST,
        "system (mini-grid)",
        "mini-grid system nodal levelized cost",
        &["MinGrid_NdlLvlzdCst", "mg_nod_lev"],
        "dollars per kilowatt-hour",
        &[
            MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
            demand::PROJECTED_NODAL_DISCOUNTED_DEMAND,
        ],
        compute_nodal_levelized_cost,
    ));
}

fn compute_generator_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(demand::PROJECTED_NODAL_PEAK_DEMAND)?
            * vs.get_f64(DIESEL_GENERATOR_COST_PER_KILOWATT)?,
    ))
}

fn compute_generator_replacement_cost_per_year(
    vs: &mut VariableStore,
) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(DIESEL_GENERATOR_COST)? / vs.get_f64(DIESEL_GENERATOR_LIFETIME)?,
    ))
}

fn compute_generator_oand_m_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(DIESEL_GENERATOR_OAND_M_COST_FRACTION)? * vs.get_f64(DIESEL_GENERATOR_COST)?,
    ))
}

fn compute_fuel_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(demand::PROJECTED_NODAL_DEMAND_PER_YEAR)?
            * vs.get_f64(DIESEL_FUEL_LITERS_CONSUMED_PER_KILOWATT_HOUR)?
            * vs.get_f64(DIESEL_FUEL_COST_PER_LITER)?,
    ))
}

fn compute_initial_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(DIESEL_GENERATOR_COST)?
            + vs.get_f64(cost_distribution::LOW_VOLTAGE_LINE_INITIAL_COST)?
            + vs.get_f64(cost_distribution::LOW_VOLTAGE_LINE_EQUIPMENT_INITIAL_COST)?,
    ))
}

fn compute_recurring_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(DIESEL_GENERATOR_OAND_M_COST_PER_YEAR)?
            + vs.get_f64(DIESEL_GENERATOR_REPLACEMENT_COST_PER_YEAR)?
            + vs.get_f64(MINI_GRID_SYSTEM_FUEL_COST_PER_YEAR)?
            + vs.get_f64(cost_distribution::LOW_VOLTAGE_LINE_RECURRING_COST_PER_YEAR)?
            + vs.get_f64(cost_distribution::LOW_VOLTAGE_LINE_EQUIPMENT_RECURRING_COST_PER_YEAR)?,
    ))
}

fn compute_nodal_discounted_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(MINI_GRID_SYSTEM_INITIAL_COST)?
            + vs.get_f64(finance::DISCOUNTED_CASH_FLOW_FACTOR)?
                * vs.get_f64(MINI_GRID_SYSTEM_RECURRING_COST_PER_YEAR)?,
    ))
}

fn compute_nodal_levelized_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let discounted_demand = vs.get_f64(demand::PROJECTED_NODAL_DISCOUNTED_DEMAND)?;
    if discounted_demand == 0.0 {
        return Ok(Value::Float(0.0));
    }
    Ok(Value::Float(
        vs.get_f64(MINI_GRID_SYSTEM_NODAL_DISCOUNTED_COST)? / discounted_demand,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model;
    use crate::topology::{GridStatus, Network, NodeId};

    #[test]
    fn fuel_cost_tracks_annual_demand() {
        let registry = model::standard().unwrap();
        let mut config = Config::new();
        config.set("de_pop", "50");
        config.set("de_grow", "0");
        let mut net = Network::new();
        net.add_node(GridStatus::Off);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));

        // 10 households at 100 kWh/yr: 1000 kWh * 0.5 l/kWh * $1.08/l.
        let fuel = store.get_f64(MINI_GRID_SYSTEM_FUEL_COST_PER_YEAR).unwrap();
        assert!((fuel - 540.0).abs() < 1e-9);
    }

    #[test]
    fn initial_cost_includes_distribution() {
        let registry = model::standard().unwrap();
        let config = Config::new();
        let mut net = Network::new();
        net.add_node(GridStatus::Off);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));

        let generator = store.get_f64(DIESEL_GENERATOR_COST).unwrap();
        let line = store
            .get_f64(cost_distribution::LOW_VOLTAGE_LINE_INITIAL_COST)
            .unwrap();
        let equipment = store
            .get_f64(cost_distribution::LOW_VOLTAGE_LINE_EQUIPMENT_INITIAL_COST)
            .unwrap();
        let initial = store.get_f64(MINI_GRID_SYSTEM_INITIAL_COST).unwrap();
        assert!((initial - (generator + line + equipment)).abs() < 1e-9);
    }
}
