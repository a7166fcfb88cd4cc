//! Construction and maintenance cost of a low voltage distribution system,
//! shared by the mini-grid and grid internal cost modules.

use crate::eval::{EvalError, VariableStore};
use crate::registry::{assert_positive, RegistryBuilder, Value, VarKey, VariableDef};

use super::{demand, demographics};

// Low voltage distribution cost parameters

pub const LOW_VOLTAGE_LINE_COST_PER_METER: VarKey = VarKey("LowVoltageLineCostPerMeter");
pub const LOW_VOLTAGE_LINE_LIFETIME: VarKey = VarKey("LowVoltageLineLifetime");
pub const LOW_VOLTAGE_LINE_OAND_M_COST_FRACTION: VarKey =
    VarKey("LowVoltageLineOperationsAndMaintenanceCostPerYearAsFractionOfLineCost");
pub const LOW_VOLTAGE_LINE_EQUIPMENT_COST_PER_CONNECTION: VarKey =
    VarKey("LowVoltageLineEquipmentCostPerConnection");
pub const LOW_VOLTAGE_LINE_EQUIPMENT_OAND_M_COST_FRACTION: VarKey =
    VarKey("LowVoltageLineEquipmentOperationsAndMaintenanceCostPerYearAsFractionOfEquipmentCost");
pub const LOW_VOLTAGE_LINE_EQUIPMENT_LIFETIME: VarKey = VarKey("LowVoltageLineEquipmentLifetime");

// Low voltage distribution cost derivatives

pub const LOW_VOLTAGE_LINE_LENGTH: VarKey = VarKey("LowVoltageLineLength");
pub const LOW_VOLTAGE_LINE_INITIAL_COST: VarKey = VarKey("LowVoltageLineInitialCost");
pub const LOW_VOLTAGE_LINE_OAND_M_COST_PER_YEAR: VarKey =
    VarKey("LowVoltageLineOperationsAndMaintenanceCostPerYear");
pub const LOW_VOLTAGE_LINE_REPLACEMENT_COST_PER_YEAR: VarKey =
    VarKey("LowVoltageLineReplacementCostPerYear");
pub const LOW_VOLTAGE_LINE_RECURRING_COST_PER_YEAR: VarKey =
    VarKey("LowVoltageLineRecurringCostPerYear");
pub const LOW_VOLTAGE_LINE_EQUIPMENT_INITIAL_COST: VarKey =
    VarKey("LowVoltageLineEquipmentInitialCost");
pub const LOW_VOLTAGE_LINE_EQUIPMENT_OAND_M_COST_PER_YEAR: VarKey =
    VarKey("LowVoltageLineEquipmentOperationsAndMaintenanceCostPerYear");
pub const LOW_VOLTAGE_LINE_EQUIPMENT_REPLACEMENT_COST_PER_YEAR: VarKey =
    VarKey("LowVoltageLineEquipmentReplacementCostPerYear");
pub const LOW_VOLTAGE_LINE_EQUIPMENT_RECURRING_COST_PER_YEAR: VarKey =
    VarKey("LowVoltageLineEquipmentRecurringCostPerYear");

pub fn register(b: &mut RegistryBuilder) {
    b.define(VariableDef::leaf(
        LOW_VOLTAGE_LINE_COST_PER_METER,
        "distribution",
        "low voltage line cost per meter",
        &["Dist_LVLnCstPrM", "di_ll_cm"],
        "dollars per meter",
        10.0,
    ));
    b.define(VariableDef::leaf_checked(
        LOW_VOLTAGE_LINE_LIFETIME,
        "distribution",
        "low voltage line lifetime",
        &["Dist_LVLnLife", "di_ll_life"],
        "years",
        10.0,
        assert_positive,
    ));
    b.define(VariableDef::leaf(
        LOW_VOLTAGE_LINE_OAND_M_COST_FRACTION,
        "distribution",
        "low voltage line operations and maintenance cost per year as fraction of line cost",
        &["Dist_LVLnOandMCstPrYrAsFctnOfLnCst", "di_ll_omf"],
        "",
        0.01,
    ));
    b.define(VariableDef::leaf(
        LOW_VOLTAGE_LINE_EQUIPMENT_COST_PER_CONNECTION,
        "distribution",
        "low voltage line equipment cost per connection",
        &["Dist_LVLnEqmtCstPrConn", "di_le_cc"],
        "dollars per connection",
        200.0,
    ));
    b.define(VariableDef::leaf(
        LOW_VOLTAGE_LINE_EQUIPMENT_OAND_M_COST_FRACTION,
        "distribution",
        "low voltage line equipment operations and maintenance cost as fraction of equipment cost",
        &["Dist_LVLnEqmtOandMCstAsFctnOfEqmtCst", "di_le_omf"],
        "",
        0.01,
    ));
    b.define(VariableDef::leaf_checked(
        LOW_VOLTAGE_LINE_EQUIPMENT_LIFETIME,
        "distribution",
        "low voltage line equipment lifetime",
        &["Dist_LVLnEqmtLife", "di_le_life"],
        "years",
        10.0,
        assert_positive,
    ));
    b.define(VariableDef::derived(
        LOW_VOLTAGE_LINE_LENGTH,
        "distribution",
        "low voltage line length",
        &["Dist_LVLnLgth", "di_ll_len"],
        "meters",
        &[
            demographics::MEAN_INTERHOUSEHOLD_DISTANCE,
            demand::TARGET_HOUSEHOLD_COUNT,
        ],
        compute_line_length,
    ));
    b.define(VariableDef::derived(
        LOW_VOLTAGE_LINE_INITIAL_COST,
        "distribution",
        "low voltage line initial cost",
        &["Dist_LVLnInitCst", "di_ll_ini"],
        "dollars",
        &[LOW_VOLTAGE_LINE_LENGTH, LOW_VOLTAGE_LINE_COST_PER_METER],
        compute_line_initial_cost,
    ));
    b.define(VariableDef::derived(
        LOW_VOLTAGE_LINE_OAND_M_COST_PER_YEAR,
        "distribution",
        "low voltage line operations and maintenance cost per year",
        &["Dist_LVLnOandMCstPrYr", "di_ll_om"],
        "dollars per year",
        &[
            LOW_VOLTAGE_LINE_OAND_M_COST_FRACTION,
            LOW_VOLTAGE_LINE_COST_PER_METER,
            LOW_VOLTAGE_LINE_LENGTH,
        ],
        compute_line_oand_m_cost_per_year,
    ));
    b.define(VariableDef::derived(
        LOW_VOLTAGE_LINE_REPLACEMENT_COST_PER_YEAR,
        "distribution",
        "low voltage line replacement cost per year",
        &["Dist_LVLnRpmtCstPrYr", "di_ll_rep"],
        "dollars per year",
        &[LOW_VOLTAGE_LINE_INITIAL_COST, LOW_VOLTAGE_LINE_LIFETIME],
        compute_line_replacement_cost_per_year,
    ));
    b.define(VariableDef::derived(
        LOW_VOLTAGE_LINE_RECURRING_COST_PER_YEAR,
        "distribution",
        "low voltage line recurring cost per year",
        &["Dist_LVLnRcrgCstPrYr", "di_ll_rec"],
        "dollars per year",
        &[
            LOW_VOLTAGE_LINE_OAND_M_COST_PER_YEAR,
            LOW_VOLTAGE_LINE_REPLACEMENT_COST_PER_YEAR,
        ],
        compute_line_recurring_cost_per_year,
    ));
    b.define(VariableDef::derived(
        LOW_VOLTAGE_LINE_EQUIPMENT_INITIAL_COST,
        "distribution",
        "low voltage line equipment initial cost",
        &["Dist_LVLnEqmtInitCst", "di_le_ini"],
        "dollars",
        &[
            LOW_VOLTAGE_LINE_EQUIPMENT_COST_PER_CONNECTION,
            demand::TARGET_HOUSEHOLD_COUNT,
        ],
        compute_equipment_initial_cost,
    ));
    b.define(VariableDef::derived(
        LOW_VOLTAGE_LINE_EQUIPMENT_OAND_M_COST_PER_YEAR,
        "distribution",
        "low voltage line equipment operations and maintenance cost per year",
        &["Dist_LVLnEqmtOandMCstPrYr", "di_le_om"],
        "dollars per year",
        &[
            LOW_VOLTAGE_LINE_EQUIPMENT_OAND_M_COST_FRACTION,
            LOW_VOLTAGE_LINE_EQUIPMENT_INITIAL_COST,
        ],
        compute_equipment_oand_m_cost_per_year,
    ));
    b.define(VariableDef::derived(
        LOW_VOLTAGE_LINE_EQUIPMENT_REPLACEMENT_COST_PER_YEAR,
        "distribution",
        "low voltage line equipment replacement cost per year",
        &["Dist_LVLnEqmtRpmtCstPrYr", "di_le_rep"],
        "dollars per year",
        &[
            LOW_VOLTAGE_LINE_EQUIPMENT_INITIAL_COST,
            LOW_VOLTAGE_LINE_EQUIPMENT_LIFETIME,
        ],
        compute_equipment_replacement_cost_per_year,
    ));
    b.define(VariableDef::derived(
        LOW_VOLTAGE_LINE_EQUIPMENT_RECURRING_COST_PER_YEAR,
        "distribution",
        "low voltage line equipment recurring cost per year",
        &["Dist_LVLnEqmtRcrgCstPrYr", "di_le_rec"],
        "dollars per year",
        &[
            LOW_VOLTAGE_LINE_EQUIPMENT_OAND_M_COST_PER_YEAR,
            LOW_VOLTAGE_LINE_EQUIPMENT_REPLACEMENT_COST_PER_YEAR,
        ],
        compute_equipment_recurring_cost_per_year,
    ));
}

/// A single household needs no line; n households need n - 1 spans.
fn compute_line_length(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let interhousehold_distance = vs.get_f64(demographics::MEAN_INTERHOUSEHOLD_DISTANCE)?;
    let household_count = vs.get_f64(demand::TARGET_HOUSEHOLD_COUNT)?;
    let length = if household_count > 1.0 {
        interhousehold_distance * (household_count - 1.0)
    } else {
        0.0
    };
    Ok(Value::Float(length))
}

fn compute_line_initial_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(LOW_VOLTAGE_LINE_COST_PER_METER)? * vs.get_f64(LOW_VOLTAGE_LINE_LENGTH)?,
    ))
}

fn compute_line_oand_m_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(LOW_VOLTAGE_LINE_OAND_M_COST_FRACTION)?
            * vs.get_f64(LOW_VOLTAGE_LINE_COST_PER_METER)?
            * vs.get_f64(LOW_VOLTAGE_LINE_LENGTH)?,
    ))
}

fn compute_line_replacement_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(LOW_VOLTAGE_LINE_INITIAL_COST)? / vs.get_f64(LOW_VOLTAGE_LINE_LIFETIME)?,
    ))
}

fn compute_line_recurring_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(LOW_VOLTAGE_LINE_OAND_M_COST_PER_YEAR)?
            + vs.get_f64(LOW_VOLTAGE_LINE_REPLACEMENT_COST_PER_YEAR)?,
    ))
}

fn compute_equipment_initial_cost(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(LOW_VOLTAGE_LINE_EQUIPMENT_COST_PER_CONNECTION)?
            * vs.get_f64(demand::TARGET_HOUSEHOLD_COUNT)?,
    ))
}

fn compute_equipment_oand_m_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(LOW_VOLTAGE_LINE_EQUIPMENT_OAND_M_COST_FRACTION)?
            * vs.get_f64(LOW_VOLTAGE_LINE_EQUIPMENT_INITIAL_COST)?,
    ))
}

fn compute_equipment_replacement_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(LOW_VOLTAGE_LINE_EQUIPMENT_INITIAL_COST)?
            / vs.get_f64(LOW_VOLTAGE_LINE_EQUIPMENT_LIFETIME)?,
    ))
}

fn compute_equipment_recurring_cost_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(LOW_VOLTAGE_LINE_EQUIPMENT_OAND_M_COST_PER_YEAR)?
            + vs.get_f64(LOW_VOLTAGE_LINE_EQUIPMENT_REPLACEMENT_COST_PER_YEAR)?,
    ))
}
