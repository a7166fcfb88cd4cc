//! Time-value-of-money variables shared by every cost module.

use crate::eval::{EvalError, VariableStore};
use crate::registry::{assert_positive, RegistryBuilder, Value, VarKey, VariableDef};

pub const TIME_HORIZON: VarKey = VarKey("TimeHorizon");
pub const INTEREST_RATE_PER_YEAR: VarKey = VarKey("InterestRatePerYear");
pub const DISCOUNTED_CASH_FLOW_FACTOR: VarKey = VarKey("DiscountedCashFlowFactor");

pub fn register(b: &mut RegistryBuilder) {
    b.define(VariableDef::leaf_checked(
        TIME_HORIZON,
        "finance",
        "time horizon",
        &["Fin_TmHrzn", "fi_t"],
        "years",
        10.0,
        assert_positive,
    ));
    b.define(VariableDef::leaf(
        INTEREST_RATE_PER_YEAR,
        "finance",
        "interest rate per year",
        &["Fin_IntRtPrYr", "fi_r"],
        "fraction per year",
        0.1,
    ));
    b.define(VariableDef::derived(
        DISCOUNTED_CASH_FLOW_FACTOR,
        "finance",
        "discounted cash flow factor",
        &["Fin_DsctdCshFlwFctr", "fi_dcff"],
        "years",
        &[TIME_HORIZON, INTEREST_RATE_PER_YEAR],
        compute_discounted_cash_flow_factor,
    ));
}

/// Present value of one dollar spent every year over the time horizon.
fn compute_discounted_cash_flow_factor(vs: &mut VariableStore) -> Result<Value, EvalError> {
    let time_horizon = vs.get_f64(TIME_HORIZON)?;
    let interest_rate = vs.get_f64(INTEREST_RATE_PER_YEAR)?;
    // A zero rate degenerates to an undiscounted sum of years
    if interest_rate == 0.0 {
        return Ok(Value::Float(time_horizon));
    }
    Ok(Value::Float(
        (1.0 - (1.0 + interest_rate).powf(-time_horizon)) / interest_rate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model;
    use crate::topology::{GridStatus, Network, NodeId};

    fn store_with<'a>(
        registry: &'a crate::registry::Registry,
        config: &'a Config,
        net: &'a Network,
    ) -> VariableStore<'a> {
        VariableStore::new(registry, config, net, NodeId(0))
    }

    #[test]
    fn discount_factor_matches_annuity_formula() {
        let registry = model::standard().unwrap();
        let config = Config::new();
        let mut net = Network::new();
        net.add_node(GridStatus::Off);
        let mut store = store_with(&registry, &config, &net);

        // 10 years at 10%: (1 - 1.1^-10) / 0.1
        let dcff = store.get_f64(DISCOUNTED_CASH_FLOW_FACTOR).unwrap();
        assert!((dcff - 6.144567105704685).abs() < 1e-12);
    }

    #[test]
    fn zero_interest_degenerates_to_the_horizon() {
        let registry = model::standard().unwrap();
        let mut config = Config::new();
        config.set("fi_r", "0");
        config.set("fi_t", "25");
        let mut net = Network::new();
        net.add_node(GridStatus::Off);
        let mut store = store_with(&registry, &config, &net);

        assert_eq!(store.get_f64(DISCOUNTED_CASH_FLOW_FACTOR).unwrap(), 25.0);
    }
}
