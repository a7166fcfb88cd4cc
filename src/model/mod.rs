//! The electrification model: formula modules that populate the registry
//! with the variables behind the maximum medium voltage extension metric.

use crate::registry::{Registry, RegistryBuilder, RegistryError, VarKey};

pub mod cost_distribution;
pub mod cost_grid;
pub mod cost_mini_grid;
pub mod cost_off_grid;
pub mod demand;
pub mod demographics;
pub mod finance;
pub mod metric;

/// Report sections, in display order.
pub const SECTIONS: &[&str] = &[
    "finance",
    "demographics",
    "demand",
    "distribution",
    "system (off-grid)",
    "system (mini-grid)",
    "system (grid)",
    "metric",
];

/// Primary outputs, in report order.
pub const ROOTS: &[VarKey] = &[
    metric::METRIC,
    metric::SYSTEM,
    metric::OFF_GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
    metric::OFF_GRID_SYSTEM_TOTAL_LEVELIZED_COST,
    metric::MINI_GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
    metric::MINI_GRID_SYSTEM_TOTAL_LEVELIZED_COST,
    metric::GRID_SYSTEM_TOTAL_DISCOUNTED_COST,
    metric::GRID_SYSTEM_TOTAL_LEVELIZED_COST,
    metric::GRID_SYSTEM_TOTAL_INITIAL_COST,
    metric::GRID_SYSTEM_TOTAL_RECURRING_COST,
];

/// Builds the full model registry.
pub fn standard() -> Result<Registry, RegistryError> {
    RegistryBuilder::new()
        .sections(SECTIONS)
        .roots(ROOTS)
        .module(finance::register)
        .module(demographics::register)
        .module(demand::register)
        .module(cost_distribution::register)
        .module(cost_off_grid::register)
        .module(cost_mini_grid::register)
        .module(cost_grid::register)
        .module(metric::register)
        .build()
}
