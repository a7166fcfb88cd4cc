//! Project population and household counts over the time horizon.

use crate::eval::{EvalError, VariableStore};
use crate::registry::{assert_positive, RegistryBuilder, Value, VarKey, VariableDef};

use super::finance;

pub const POPULATION_COUNT: VarKey = VarKey("PopulationCount");
pub const POPULATION_GROWTH_RATE_PER_YEAR: VarKey = VarKey("PopulationGrowthRatePerYear");
pub const PROJECTED_POPULATION_COUNT: VarKey = VarKey("ProjectedPopulationCount");
pub const MEAN_HOUSEHOLD_SIZE: VarKey = VarKey("MeanHouseholdSize");
pub const PROJECTED_HOUSEHOLD_COUNT: VarKey = VarKey("ProjectedHouseholdCount");
pub const MEAN_INTERHOUSEHOLD_DISTANCE: VarKey = VarKey("MeanInterhouseholdDistance");

pub fn register(b: &mut RegistryBuilder) {
    b.define(VariableDef::leaf(
        POPULATION_COUNT,
        "demographics",
        "population count",
        &["Demo_PopCnt", "de_pop"],
        "people",
        100.0,
    ));
    b.define(VariableDef::leaf(
        POPULATION_GROWTH_RATE_PER_YEAR,
        "demographics",
        "population growth rate per year",
        &["Demo_PopGrwthRtPrYr", "de_grow"],
        "fraction per year",
        0.02,
    ));
    b.define(VariableDef::derived(
        PROJECTED_POPULATION_COUNT,
        "demographics",
        "projected population count",
        &["Demo_PrjPopCnt", "de_prj_pop"],
        "people",
        &[
            POPULATION_COUNT,
            POPULATION_GROWTH_RATE_PER_YEAR,
            finance::TIME_HORIZON,
        ],
        compute_projected_population_count,
    ));
    b.define(VariableDef::leaf_checked(
        MEAN_HOUSEHOLD_SIZE,
        "demographics",
        "mean household size",
        &["Demo_MnHhSz", "de_hhsz"],
        "people per household",
        5.0,
        assert_positive,
    ));
    b.define(VariableDef::derived(
        PROJECTED_HOUSEHOLD_COUNT,
        "demographics",
        "projected household count",
        &["Demo_PrjHhCnt", "de_prj_hh"],
        "households",
        &[PROJECTED_POPULATION_COUNT, MEAN_HOUSEHOLD_SIZE],
        compute_projected_household_count,
    ));
    b.define(VariableDef::leaf(
        MEAN_INTERHOUSEHOLD_DISTANCE,
        "demographics",
        "mean interhousehold distance",
        &["Demo_MnIntrHhDist", "de_ihd"],
        "meters",
        25.0,
    ));
}

fn compute_projected_population_count(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let population = vs.get_f64(POPULATION_COUNT)?;
    let growth_rate = vs.get_f64(POPULATION_GROWTH_RATE_PER_YEAR)?;
    let time_horizon = vs.get_f64(finance::TIME_HORIZON)?;
    Ok(Value::Float(
        population * (1.0 + growth_rate).powf(time_horizon),
    ))
}

fn compute_projected_household_count(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let projected_population = vs.get_f64(PROJECTED_POPULATION_COUNT)?;
    let household_size = vs.get_f64(MEAN_HOUSEHOLD_SIZE)?;
    if household_size == 0.0 {
        return Ok(Value::Float(0.0));
    }
    Ok(Value::Float(projected_population / household_size))
}
