//! Cost of connecting one node to the grid. Internal costs cover the
//! transformer and low voltage distribution inside the node; external costs
//! are per meter of medium voltage line extended toward the node.

use crate::eval::{EvalError, VariableStore};
use crate::registry::{assert_positive, RegistryBuilder, Value, VarKey, VariableDef};

use super::{cost_distribution, demand, finance};

pub const TRANSFORMER_COST_PER_KILOWATT: VarKey = VarKey("TransformerCostPerKilowatt");
pub const TRANSFORMER_LIFETIME: VarKey = VarKey("TransformerLifetime");
pub const TRANSFORMER_OAND_M_COST_FRACTION: VarKey =
    VarKey("TransformerOperationsAndMaintenanceCostPerYearAsFractionOfTransformerCost");
pub const ELECTRICITY_COST_PER_KILOWATT_HOUR: VarKey = VarKey("ElectricityCostPerKilowattHour");
pub const MEDIUM_VOLTAGE_LINE_COST_PER_METER: VarKey = VarKey("MediumVoltageLineCostPerMeter");
pub const MEDIUM_VOLTAGE_LINE_LIFETIME: VarKey = VarKey("MediumVoltageLineLifetime");
pub const MEDIUM_VOLTAGE_LINE_OAND_M_COST_FRACTION: VarKey =
    VarKey("MediumVoltageLineOperationsAndMaintenanceCostPerYearAsFractionOfLineCost");
pub const TRANSFORMER_COST: VarKey = VarKey("TransformerCost");
pub const TRANSFORMER_REPLACEMENT_COST_PER_YEAR: VarKey =
    VarKey("TransformerReplacementCostPerYear");
pub const TRANSFORMER_OAND_M_COST_PER_YEAR: VarKey =
    VarKey("TransformerOperationsAndMaintenanceCostPerYear");
pub const GRID_INTERNAL_SYSTEM_ELECTRICITY_COST_PER_YEAR: VarKey =
    VarKey("GridInternalSystemElectricityCostPerYear");
pub const GRID_INTERNAL_SYSTEM_INITIAL_COST: VarKey = VarKey("GridInternalSystemInitialCost");
pub const GRID_INTERNAL_SYSTEM_RECURRING_COST_PER_YEAR: VarKey =
    VarKey("GridInternalSystemRecurringCostPerYear");
pub const GRID_INTERNAL_SYSTEM_NODAL_DISCOUNTED_COST: VarKey =
    VarKey("GridInternalSystemNodalDiscountedCost");
pub const GRID_INTERNAL_SYSTEM_NODAL_LEVELIZED_COST: VarKey =
    VarKey("GridInternalSystemNodalLevelizedCost");
pub const GRID_EXTERNAL_SYSTEM_INITIAL_COST_PER_METER: VarKey =
    VarKey("GridExternalSystemInitialCostPerMeter");
pub const GRID_EXTERNAL_SYSTEM_RECURRING_COST_PER_METER_PER_YEAR: VarKey =
    VarKey("GridExternalSystemRecurringCostPerMeterPerYear");
pub const GRID_EXTERNAL_SYSTEM_NODAL_DISCOUNTED_COST_PER_METER: VarKey =
    VarKey("GridExternalSystemNodalDiscountedCostPerMeter");

pub fn register(b: &mut RegistryBuilder) {
    b.define(VariableDef::leaf(
        TRANSFORMER_COST_PER_KILOWATT,
        "system (grid)",
        "transformer cost per kilowatt",
        &["Grid_TfmrCstPrKw", "gr_tx_ckw"],
        "dollars per kilowatt",
        1000.0,
    ));
    b.define(VariableDef::leaf_checked(
        TRANSFORMER_LIFETIME,
        "system (grid)",
        "transformer lifetime",
        &["Grid_TfmrLife", "gr_tx_life"],
        "years",
        15.0,
        assert_positive,
    ));
    b.define(VariableDef::leaf(
        TRANSFORMER_OAND_M_COST_FRACTION,
        "system (grid)",
        "transformer operations and maintenance cost per year as fraction of transformer cost",
        &["Grid_TfmrOandMCstPrYrAsFctnOfTfmrCst", "gr_tx_omf"],
        "",
        0.01,
    ));
    b.define(VariableDef::leaf(
        ELECTRICITY_COST_PER_KILOWATT_HOUR,
        "system (grid)",
        "electricity cost per kilowatt-hour",
        &["Grid_ElctrcCstPrKwHr", "gr_el_ckwh"],
        "dollars per kilowatt-hour",
        0.17,
    ));
    b.define(VariableDef::leaf(
        MEDIUM_VOLTAGE_LINE_COST_PER_METER,
        "system (grid)",
        "medium voltage line cost per meter",
        &["Grid_MVLnCstPrM", "gr_mv_cm"],
        "dollars per meter",
        9.0,
    ));
    b.define(VariableDef::leaf_checked(
        MEDIUM_VOLTAGE_LINE_LIFETIME,
        "system (grid)",
        "medium voltage line lifetime",
        &["Grid_MVLnLife", "gr_mv_life"],
        "years",
        30.0,
        assert_positive,
    ));
    b.define(VariableDef::leaf(
        MEDIUM_VOLTAGE_LINE_OAND_M_COST_FRACTION,
        "system (grid)",
        "medium voltage line operations and maintenance cost per year as fraction of line cost",
        &["Grid_MVLnOandMCstPrYrAsFctnOfLnCst", "gr_mv_omf"],
        "",
        0.01,
    ));
    b.define(VariableDef::derived(
        TRANSFORMER_COST,
        "system (grid)",
        "transformer cost",
        &["Grid_TfmrCst", "gr_tx_cst"],
        "dollars",
        &[
            demand::PROJECTED_NODAL_PEAK_DEMAND,
            TRANSFORMER_COST_PER_KILOWATT,
        ],
        compute_transformer_cost,
    ));
    b.define(VariableDef::derived(
        TRANSFORMER_REPLACEMENT_COST_PER_YEAR,
        "system (grid)",
        "transformer replacement cost per year",
        &["Grid_TfmrRpmtCstPrYr", "gr_tx_rep"],
        "dollars per year",
        &[TRANSFORMER_COST, TRANSFORMER_LIFETIME],
        compute_transformer_replacement_cost_per_year,
    ));
    b.define(VariableDef::derived(
        TRANSFORMER_OAND_M_COST_PER_YEAR,
        "system (grid)",
        "transformer operations and maintenance cost per year",
        &["Grid_TfmrOandMCstPrYr", "gr_tx_om"],
        "dollars per year",
        &[TRANSFORMER_OAND_M_COST_FRACTION, TRANSFORMER_COST],
        compute_transformer_oand_m_cost_per_year,
    ));
    b.define(VariableDef::derived(
        GRID_INTERNAL_SYSTEM_ELECTRICITY_COST_PER_YEAR,
        "system (grid)",
        "grid internal system electricity cost per year",
        &["Grid_IntElctrcCstPrYr", "gr_int_el"],
        "dollars per year",
        &[
            demand::PROJECTED_NODAL_DEMAND_PER_YEAR,
            ELECTRICITY_COST_PER_KILOWATT_HOUR,
        ],
        compute_electricity_cost_per_year,
    ));
    b.define(VariableDef::derived(
        GRID_INTERNAL_SYSTEM_INITIAL_COST,
        "system (grid)",
        "grid internal system initial cost",
        &["Grid_IntInitCst", "gr_int_ini"],
        "dollars",
        &[
            TRANSFORMER_COST,
            cost_distribution::LOW_VOLTAGE_LINE_INITIAL_COST,
            cost_distribution::LOW_VOLTAGE_LINE_EQUIPMENT_INITIAL_COST,
        ],
        compute_internal_initial_cost,
    ));
    b.define(VariableDef::derived(
        GRID_INTERNAL_SYSTEM_RECURRING_COST_PER_YEAR,
        "system (grid)",
        "grid internal system recurring cost per year",
        &["Grid_IntRcrgCstPrYr", "gr_int_rec"],
        "dollars per year",
        &[
            TRANSFORMER_OAND_M_COST_PER_YEAR,
            TRANSFORMER_REPLACEMENT_COST_PER_YEAR,
            GRID_INTERNAL_SYSTEM_ELECTRICITY_COST_PER_YEAR,
            cost_distribution::LOW_VOLTAGE_LINE_RECURRING_COST_PER_YEAR,
            cost_distribution::LOW_VOLTAGE_LINE_EQUIPMENT_RECURRING_COST_PER_YEAR,
        ],
        compute_internal_recurring_cost_per_year,
    ));
    b.define(VariableDef::derived(
        GRID_INTERNAL_SYSTEM_NODAL_DISCOUNTED_COST,
        "system (grid)",
        "grid internal system nodal discounted cost",
        &["Grid_IntNdlDsctdCst", "gr_int_nod_d"],
        "dollars",
        &[
            GRID_INTERNAL_SYSTEM_INITIAL_COST,
            GRID_INTERNAL_SYSTEM_RECURRING_COST_PER_YEAR,
            finance::DISCOUNTED_CASH_FLOW_FACTOR,
        ],
        compute_internal_nodal_discounted_cost,
    ));
    b.define(VariableDef::derived(
        GRID_INTERNAL_SYSTEM_NODAL_LEVELIZED_COST,
        "system (grid)",
        "grid internal system nodal levelized cost",
        &["Grid_IntNdlLvlzdCst", "gr_int_nod_lev"],
        "dollars per kilowatt-hour",
        &[
            GRID_INTERNAL_SYSTEM_NODAL_DISCOUNTED_COST,
            demand::PROJECTED_NODAL_DISCOUNTED_DEMAND,
        ],
        compute_internal_nodal_levelized_cost,
    ));
    b.define(VariableDef::derived(
        GRID_EXTERNAL_SYSTEM_INITIAL_COST_PER_METER,
        "system (grid)",
        "grid external system initial cost per meter",
        &["Grid_ExtInitCstPrM", "gr_ext_ini_m"],
        "dollars per meter",
        &[MEDIUM_VOLTAGE_LINE_COST_PER_METER],
        compute_external_initial_cost_per_meter,
    ));
    b.define(VariableDef::derived(
        GRID_EXTERNAL_SYSTEM_RECURRING_COST_PER_METER_PER_YEAR,
        "system (grid)",
        "grid external system recurring cost per meter per year",
        &["Grid_ExtRcrgCstPrMPrYr", "gr_ext_rec_m"],
        "dollars per meter per year",
        &[
            MEDIUM_VOLTAGE_LINE_COST_PER_METER,
            MEDIUM_VOLTAGE_LINE_LIFETIME,
            MEDIUM_VOLTAGE_LINE_OAND_M_COST_FRACTION,
        ],
        compute_external_recurring_cost_per_meter_per_year,
    ));
    b.define(VariableDef::derived(
        GRID_EXTERNAL_SYSTEM_NODAL_DISCOUNTED_COST_PER_METER,
        "system (grid)",
        "grid external system nodal discounted cost per meter",
        &["Grid_ExtNdlDsctdCstPrM", "gr_ext_nod_dm"],
        "dollars per meter",
        &[
            GRID_EXTERNAL_SYSTEM_INITIAL_COST_PER_METER,
            GRID_EXTERNAL_SYSTEM_RECURRING_COST_PER_METER_PER_YEAR,
            finance::DISCOUNTED_CASH_FLOW_FACTOR,
        ],
        compute_external_nodal_discounted_cost_per_meter,
    ));
}

fn compute_transformer_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(demand::PROJECTED_NODAL_PEAK_DEMAND)?
            * vs.get_f64(TRANSFORMER_COST_PER_KILOWATT)?,
    ))
}

fn compute_transformer_replacement_cost_per_year(
    vs: &mut VariableStore,
) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(TRANSFORMER_COST)? / vs.get_f64(TRANSFORMER_LIFETIME)?,
    ))
}

fn compute_transformer_oand_m_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(TRANSFORMER_OAND_M_COST_FRACTION)? * vs.get_f64(TRANSFORMER_COST)?,
    ))
}

fn compute_electricity_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(demand::PROJECTED_NODAL_DEMAND_PER_YEAR)?
            * vs.get_f64(ELECTRICITY_COST_PER_KILOWATT_HOUR)?,
    ))
}

fn compute_internal_initial_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(TRANSFORMER_COST)?
            + vs.get_f64(cost_distribution::LOW_VOLTAGE_LINE_INITIAL_COST)?
            + vs.get_f64(cost_distribution::LOW_VOLTAGE_LINE_EQUIPMENT_INITIAL_COST)?,
    ))
}

fn compute_internal_recurring_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(TRANSFORMER_OAND_M_COST_PER_YEAR)?
            + vs.get_f64(TRANSFORMER_REPLACEMENT_COST_PER_YEAR)?
            + vs.get_f64(GRID_INTERNAL_SYSTEM_ELECTRICITY_COST_PER_YEAR)?
            + vs.get_f64(cost_distribution::LOW_VOLTAGE_LINE_RECURRING_COST_PER_YEAR)?
            + vs.get_f64(cost_distribution::LOW_VOLTAGE_LINE_EQUIPMENT_RECURRING_COST_PER_YEAR)?,
    ))
}

fn compute_internal_nodal_discounted_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(GRID_INTERNAL_SYSTEM_INITIAL_COST)?
            + vs.get_f64(finance::DISCOUNTED_CASH_FLOW_FACTOR)?
                * vs.get_f64(GRID_INTERNAL_SYSTEM_RECURRING_COST_PER_YEAR)?,
    ))
}

fn compute_internal_nodal_levelized_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let discounted_demand = vs.get_f64(demand::PROJECTED_NODAL_DISCOUNTED_DEMAND)?;
    if discounted_demand == 0.0 {
        return Ok(Value::Float(0.0));
    }
    Ok(Value::Float(
        vs.get_f64(GRID_INTERNAL_SYSTEM_NODAL_DISCOUNTED_COST)? / discounted_demand,
    ))
}

fn compute_external_initial_cost_per_meter(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(vs.get_f64(MEDIUM_VOLTAGE_LINE_COST_PER_METER)?))
}

fn compute_external_recurring_cost_per_meter_per_year(
    vs: &mut VariableStore,
) -> Result<Value, EvalError> {
    let cost_per_meter = vs.get_f64(MEDIUM_VOLTAGE_LINE_COST_PER_METER)?;
    let oand_m = vs.get_f64(MEDIUM_VOLTAGE_LINE_OAND_M_COST_FRACTION)? * cost_per_meter;
    let replacement = cost_per_meter / vs.get_f64(MEDIUM_VOLTAGE_LINE_LIFETIME)?;
    Ok(Value::Float(oand_m + replacement))
}

fn compute_external_nodal_discounted_cost_per_meter(
    vs: &mut VariableStore,
) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(GRID_EXTERNAL_SYSTEM_INITIAL_COST_PER_METER)?
            + vs.get_f64(finance::DISCOUNTED_CASH_FLOW_FACTOR)?
                * vs.get_f64(GRID_EXTERNAL_SYSTEM_RECURRING_COST_PER_METER_PER_YEAR)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model;
    use crate::topology::{GridStatus, Network, NodeId};

    #[test]
    fn external_cost_per_meter_discounts_line_upkeep() {
        let registry = model::standard().unwrap();
        let mut config = Config::new();
        config.set("fi_r", "0");
        config.set("fi_t", "10");
        config.set("gr_mv_cm", "9");
        config.set("gr_mv_life", "30");
        config.set("gr_mv_omf", "0.01");
        let mut net = Network::new();
        net.add_node(GridStatus::New);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));

        // $9/m up front, then 10 years of 1% O&M plus a thirtieth of the line.
        let per_meter = store
            .get_f64(GRID_EXTERNAL_SYSTEM_NODAL_DISCOUNTED_COST_PER_METER)
            .unwrap();
        let expected = 9.0 + 10.0 * (0.09 + 0.3);
        assert!((per_meter - expected).abs() < 1e-9);
    }

    #[test]
    fn internal_levelized_cost_is_zero_when_demand_is_zero() {
        let registry = model::standard().unwrap();
        let mut config = Config::new();
        config.set("de_pop", "0");
        let mut net = Network::new();
        net.add_node(GridStatus::New);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));

        assert_eq!(
            store
                .get_f64(GRID_INTERNAL_SYSTEM_NODAL_LEVELIZED_COST)
                .unwrap(),
            0.0
        );
    }
}
