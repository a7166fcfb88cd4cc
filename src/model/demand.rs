//! Projected nodal electricity demand, peak demand, and discounted demand.

use crate::eval::{EvalError, VariableStore};
use crate::registry::{assert_positive, RegistryBuilder, Value, VarKey, VariableDef};

use super::{demographics, finance};

const HOURS_PER_YEAR: f64 = 8760.0;

pub const DEMAND_PER_HOUSEHOLD_PER_YEAR: VarKey = VarKey("DemandPerHouseholdPerYear");
pub const HOUSEHOLD_COVERAGE: VarKey = VarKey("HouseholdCoverage");
pub const TARGET_HOUSEHOLD_COUNT: VarKey = VarKey("TargetHouseholdCount");
pub const PROJECTED_NODAL_DEMAND_PER_YEAR: VarKey = VarKey("ProjectedNodalDemandPerYear");
pub const PEAK_TO_AVERAGE_DEMAND_RATIO: VarKey = VarKey("PeakToAverageDemandRatio");
pub const PROJECTED_NODAL_PEAK_DEMAND: VarKey = VarKey("ProjectedNodalPeakDemand");
pub const PROJECTED_NODAL_DISCOUNTED_DEMAND: VarKey = VarKey("ProjectedNodalDiscountedDemand");

pub fn register(b: &mut RegistryBuilder) {
    b.define(VariableDef::leaf(
        DEMAND_PER_HOUSEHOLD_PER_YEAR,
        "demand",
        "demand per household per year",
        &["Dmd_DmdPrHhPrYr", "dm_hh"],
        "kilowatt-hours per year",
        100.0,
    ));
    b.define(VariableDef::leaf(
        HOUSEHOLD_COVERAGE,
        "demand",
        "fraction of households targeted for connection",
        &["Dmd_HhCvrg", "dm_cov"],
        "fraction",
        1.0,
    ));
    b.define(VariableDef::derived(
        TARGET_HOUSEHOLD_COUNT,
        "demand",
        "target household count",
        &["Dmd_TgtHhCnt", "dm_tgt_hh"],
        "households",
        &[demographics::PROJECTED_HOUSEHOLD_COUNT, HOUSEHOLD_COVERAGE],
        compute_target_household_count,
    ));
    b.define(VariableDef::derived(
        PROJECTED_NODAL_DEMAND_PER_YEAR,
        "demand",
        "projected nodal demand per year",
        &["Dmd_PrjNdlDmdPrYr", "dm_nd"],
        "kilowatt-hours per year",
        &[TARGET_HOUSEHOLD_COUNT, DEMAND_PER_HOUSEHOLD_PER_YEAR],
        compute_projected_nodal_demand_per_year,
    ));
    b.define(VariableDef::leaf_checked(
        PEAK_TO_AVERAGE_DEMAND_RATIO,
        "demand",
        "peak to average demand ratio",
        &["Dmd_PkToAvgDmdRt", "dm_pk"],
        "fraction",
        1.5,
        assert_positive,
    ));
    b.define(VariableDef::derived(
        PROJECTED_NODAL_PEAK_DEMAND,
        "demand",
        "projected nodal peak demand",
        &["Dmd_PrjNdlPkDmd", "dm_pkd"],
        "kilowatts",
        &[PROJECTED_NODAL_DEMAND_PER_YEAR, PEAK_TO_AVERAGE_DEMAND_RATIO],
        compute_projected_nodal_peak_demand,
    ));
    b.define(VariableDef::derived(
        PROJECTED_NODAL_DISCOUNTED_DEMAND,
        "demand",
        "projected nodal discounted demand",
        &["Dmd_PrjNdlDsctdDmd", "dm_ndd"],
        "kilowatt-hours",
        &[
            PROJECTED_NODAL_DEMAND_PER_YEAR,
            finance::DISCOUNTED_CASH_FLOW_FACTOR,
        ],
        compute_projected_nodal_discounted_demand,
    ));
}

fn compute_target_household_count(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(demographics::PROJECTED_HOUSEHOLD_COUNT)? * vs.get_f64(HOUSEHOLD_COVERAGE)?,
    ))
}

fn compute_projected_nodal_demand_per_year(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(TARGET_HOUSEHOLD_COUNT)? * vs.get_f64(DEMAND_PER_HOUSEHOLD_PER_YEAR)?,
    ))
}

fn compute_projected_nodal_peak_demand(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let annual_demand = vs.get_f64(PROJECTED_NODAL_DEMAND_PER_YEAR)?;
    let peak_ratio = vs.get_f64(PEAK_TO_AVERAGE_DEMAND_RATIO)?;
    Ok(Value::Float(annual_demand / HOURS_PER_YEAR * peak_ratio))
}

fn compute_projected_nodal_discounted_demand(vs: &mut VariableStore) -> Result<Value, EvalError> {
    Ok(Value::Float(
        vs.get_f64(PROJECTED_NODAL_DEMAND_PER_YEAR)?
            * vs.get_f64(finance::DISCOUNTED_CASH_FLOW_FACTOR)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model;
    use crate::topology::{GridStatus, Network, NodeId};

    #[test]
    fn zero_population_means_zero_demand() {
        let registry = model::standard().unwrap();
        let mut config = Config::new();
        config.set("de_pop", "0");
        let mut net = Network::new();
        net.add_node(GridStatus::Off);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));

        assert_eq!(store.get_f64(PROJECTED_NODAL_DEMAND_PER_YEAR).unwrap(), 0.0);
        assert_eq!(
            store.get_f64(PROJECTED_NODAL_DISCOUNTED_DEMAND).unwrap(),
            0.0
        );
    }

    #[test]
    fn discounted_demand_scales_annual_demand_by_the_factor() {
        let registry = model::standard().unwrap();
        let mut config = Config::new();
        config.set("fi_r", "0");
        config.set("fi_t", "10");
        let mut net = Network::new();
        net.add_node(GridStatus::Off);
        let mut store = VariableStore::new(&registry, &config, &net, NodeId(0));

        let annual = store.get_f64(PROJECTED_NODAL_DEMAND_PER_YEAR).unwrap();
        let discounted = store.get_f64(PROJECTED_NODAL_DISCOUNTED_DEMAND).unwrap();
        assert!((discounted - annual * 10.0).abs() < 1e-9);
    }
}
