//! Aggregation engine: folds child contexts into a parent's accumulators.
//!
//! For each aggregate kind the pass seeds the parent's accumulator from the
//! declared default, visits every child store, evaluates the membership
//! predicate against the child's own values, folds the child in when it
//! holds, and finally marks the accumulator complete. Fold steps are sums
//! and sums of products, so child order does not affect the totals.

use rayon::prelude::*;

use crate::registry::{Behavior, VariableId};

use super::{EvalError, VariableStore};

/// Runs the complete fold pass for every aggregate kind in the registry.
///
/// Must run to completion before any aggregate (or summary that reads one)
/// is read in the parent context. An empty child slice finalizes the
/// defaults, which is the correct total for a leaf of the network tree.
pub fn fold_children(
    parent: &mut VariableStore,
    children: &mut [VariableStore],
) -> Result<(), EvalError> {
    let registry = parent.registry();
    let aggregates: Vec<VariableId> = registry.aggregates().to_vec();

    for &id in &aggregates {
        parent.begin_fold(id)?;
    }
    for child in children.iter_mut() {
        for &id in &aggregates {
            let Behavior::Aggregate { applies, fold, .. } = &registry.def(id).behavior else {
                unreachable!("registry.aggregates() returned a non-aggregate");
            };
            let (applies, fold) = (*applies, *fold);
            if applies(child)? {
                // Single-writer reduction: the accumulator leaves the slot,
                // is updated, and returns before the next contribution.
                let mut acc = parent.accumulator(id)?;
                fold(&mut acc, child)?;
                parent.store_accumulator(id, acc);
            }
        }
    }
    for &id in &aggregates {
        parent.finalize_fold(id)?;
    }
    Ok(())
}

/// Like [`fold_children`], but resolves each child's declared aggregate
/// dependencies in parallel first. Child contexts are independent, so only
/// the fold itself has to stay serial; the totals are identical.
pub fn fold_children_parallel(
    parent: &mut VariableStore,
    children: &mut [VariableStore],
) -> Result<(), EvalError> {
    let registry = parent.registry();
    let prefetch: Vec<VariableId> = registry
        .aggregates()
        .iter()
        .flat_map(|&id| registry.dependencies(id).iter().copied())
        .filter(|&dep| !registry.def(dep).is_aggregate())
        .collect();

    children.par_iter_mut().try_for_each(|child| {
        for &dep in &prefetch {
            child.warm(dep)?;
        }
        Ok(())
    })?;

    fold_children(parent, children)
}
