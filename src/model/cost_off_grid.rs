//! Cost of a standalone photovoltaic system serving one node.

use crate::eval::{EvalError, VariableStore};
use crate::registry::{assert_positive, RegistryBuilder, Value, VarKey, VariableDef};

use super::{demand, finance};

pub const PHOTOVOLTAIC_PANEL_COST_PER_KILOWATT: VarKey = VarKey("PhotovoltaicPanelCostPerKilowatt");
pub const PHOTOVOLTAIC_PANEL_LIFETIME: VarKey = VarKey("PhotovoltaicPanelLifetime");
pub const OFF_GRID_SYSTEM_OAND_M_COST_FRACTION: VarKey =
    VarKey("OffGridSystemOperationsAndMaintenanceCostPerYearAsFractionOfInitialCost");
pub const OFF_GRID_SYSTEM_INITIAL_COST: VarKey = VarKey("OffGridSystemInitialCost");
pub const OFF_GRID_SYSTEM_REPLACEMENT_COST_PER_YEAR: VarKey =
    VarKey("OffGridSystemReplacementCostPerYear");
pub const OFF_GRID_SYSTEM_RECURRING_COST_PER_YEAR: VarKey =
    VarKey("OffGridSystemRecurringCostPerYear");
pub const OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST: VarKey =
    VarKey("OffGridSystemNodalDiscountedCost");
pub const OFF_GRID_SYSTEM_NODAL_LEVELIZED_COST: VarKey = VarKey("OffGridSystemNodalLevelizedCost");

pub fn register(b: &mut RegistryBuilder) {
    b.define(VariableDef::leaf(
        PHOTOVOLTAIC_PANEL_COST_PER_KILOWATT,
        "system (off-grid)",
        "photovoltaic panel cost per kilowatt",
        &["OffGrid_PvPnlCstPrKw", "og_pv_ckw"],
        "dollars per kilowatt",
        6000.0,
    ));
    b.define(VariableDef::leaf_checked(
        PHOTOVOLTAIC_PANEL_LIFETIME,
        "system (off-grid)",
        "photovoltaic panel lifetime",
        &["OffGrid_PvPnlLife", "og_pv_life"],
        "years",
        20.0,
        assert_positive,
    ));
    b.define(VariableDef::leaf(
        OFF_GRID_SYSTEM_OAND_M_COST_FRACTION,
        "system (off-grid)",
        "off-grid system operations and maintenance cost per year as fraction of initial cost",
        &["OffGrid_OandMCstPrYrAsFctnOfInitCst", "og_omf"],
        "",
        0.05,
    ));
    b.define(VariableDef::derived(
        OFF_GRID_SYSTEM_INITIAL_COST,
        "system (off-grid)",
        "off-grid system initial cost",
        &["OffGrid_InitCst", "og_ini"],
        "dollars",
        &[
            demand::PROJECTED_NODAL_PEAK_DEMAND,
            PHOTOVOLTAIC_PANEL_COST_PER_KILOWATT,
        ],
        compute_initial_cost,
    ));
    b.define(VariableDef::derived(
        OFF_GRID_SYSTEM_REPLACEMENT_COST_PER_YEAR,
        "system (off-grid)",
        "off-grid system replacement cost per year",
        &["OffGrid_RpmtCstPrYr", "og_rep"],
        "dollars per year",
        &[OFF_GRID_SYSTEM_INITIAL_COST, PHOTOVOLTAIC_PANEL_LIFETIME],
        compute_replacement_cost_per_year,
    ));
    b.define(VariableDef::derived(
        OFF_GRID_SYSTEM_RECURRING_COST_PER_YEAR,
        "system (off-grid)",
        "off-grid system recurring cost per year",
        &["OffGrid_RcrgCstPrYr", "og_rec"],
        "dollars per year",
        &[
            OFF_GRID_SYSTEM_OAND_M_COST_FRACTION,
            OFF_GRID_SYSTEM_INITIAL_COST,
            OFF_GRID_SYSTEM_REPLACEMENT_COST_PER_YEAR,
        ],
        compute_recurring_cost_per_year,
    ));
    b.define(VariableDef::derived(
        OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
        "system (off-grid)",
        "off-grid system nodal discounted cost",
        &["OffGrid_NdlDsctdCst", "og_nod_d"],
        "dollars",
        &[
            OFF_GRID_SYSTEM_INITIAL_COST,
            OFF_GRID_SYSTEM_RECURRING_COST_PER_YEAR,
            finance::DISCOUNTED_CASH_FLOW_FACTOR,
        ],
        compute_nodal_discounted_cost,
    ));
    b.define(VariableDef::derived(
        OFF_GRID_SYSTEM_NODAL_LEVELIZED_COST,
        "system (off-grid)",
        "off-grid system nodal levelized cost",
        &["OffGrid_NdlLvlzdCst", "og_nod_lev"],
        "dollars per kilowatt-hour",
        &[
            OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST,
            demand::PROJECTED_NODAL_DISCOUNTED_DEMAND,
        ],
        compute_nodal_levelized_cost,
    ));
}

fn compute_initial_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(demand::PROJECTED_NODAL_PEAK_DEMAND)?
            * vs.get_f64(PHOTOVOLTAIC_PANEL_COST_PER_KILOWATT)?,
    ))
}

fn compute_replacement_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(OFF_GRID_SYSTEM_INITIAL_COST)? / vs.get_f64(PHOTOVOLTAIC_PANEL_LIFETIME)?,
    ))
}

fn compute_recurring_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(OFF_GRID_SYSTEM_OAND_M_COST_FRACTION)?
            * vs.get_f64(OFF_GRID_SYSTEM_INITIAL_COST)?
            + vs.get_f64(OFF_GRID_SYSTEM_REPLACEMENT_COST_PER_YEAR)?,
    ))
}

fn compute_nodal_discounted_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(OFF_GRID_SYSTEM_INITIAL_COST)?
            + vs.get_f64(finance::DISCOUNTED_CASH_FLOW_FACTOR)?
                * vs.get_f64(OFF_GRID_SYSTEM_RECURRING_COST_PER_YEAR)?,
    ))
}

fn compute_nodal_levelized_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let discounted_demand = vs.get_f64(demand::PROJECTED_NODAL_DISCOUNTED_DEMAND)?;
    if discounted_demand == 0.0 {
        return Ok(Value::Float(0.0));
    }
    Ok(Value::Float(
        vs.get_f64(OFF_GRID_SYSTEM_NODAL_DISCOUNTED_COST)? / discounted_demand,
    ))
}
