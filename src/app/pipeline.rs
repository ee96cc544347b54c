//! Shared "allocation pipeline" logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! curve params -> curves -> eligibility -> greedy allocation -> roll-ups
//!
//! The subcommands can then focus on presentation and exports.

use std::collections::BTreeMap;

use crate::curves::{CurveSet, SpendGrid, build_curve_set, generate_curve_params};
use crate::domain::{Channel, CurveKey, CurveParams, PeriodKind, RunConfig, Tier};
use crate::error::AppError;
use crate::optimise::{
    AllocationResult, BaselineEntry, SweepPoint, allocate, compute_eligible, previous_spend, sweep_budgets,
};
use crate::report::{TierComparison, by_channel_tier, compare_by_tier};

/// All computed outputs of a single `spend run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub params: Vec<CurveParams>,
    pub curves: CurveSet,
    pub eligible: Vec<CurveKey>,
    pub allocation: AllocationResult,
    pub baseline: Vec<BaselineEntry>,
    pub comparison: Vec<TierComparison>,
    pub matrix: BTreeMap<(Channel, Tier), f64>,
}

/// Generate parameters and sample every curve for the chosen calendar.
pub fn build_curves(
    seed: u64,
    period_kind: PeriodKind,
    step: f64,
    max_spend: f64,
) -> Result<(Vec<CurveParams>, CurveSet), AppError> {
    let grid = SpendGrid::new(step, max_spend)?;
    let params = generate_curve_params(seed)?;
    let curves = build_curve_set(&params, period_kind.count(), grid)?;
    Ok((params, curves))
}

/// Reject plans that cannot fund anything, with a message the user can act on.
fn validate_selection(config: &RunConfig) -> Result<(), AppError> {
    if config.plan.live_count() == 0 {
        return Err(AppError::new(2, "Select at least one live period in the plan."));
    }
    if config.channels.is_empty() {
        return Err(AppError::new(2, "Select at least one marketing channel."));
    }
    Ok(())
}

/// Execute the full allocation pipeline and return the computed outputs.
pub fn run_allocation(config: &RunConfig) -> Result<RunOutput, AppError> {
    validate_selection(config)?;

    // 1) Curves from the seed.
    let (params, curves) = build_curves(config.seed, config.period_kind, config.step, config.max_spend)?;

    // 2) Eligible curves for this plan and channel set.
    let eligible = compute_eligible(curves.curves(), &config.plan, &config.channels);
    if eligible.is_empty() {
        return Err(AppError::new(
            2,
            "No eligible curves found. Check your live periods and selected channels.",
        ));
    }
    let eligible_curves = curves.resolve(&eligible)?;

    // 3) Greedy allocation.
    let allocation = allocate(&eligible_curves, config.budget, config.step)?;
    tracing::info!(
        scenario = %config.name,
        eligible = allocation.eligible_curves,
        steps_used = allocation.steps_used,
        steps_requested = allocation.steps_requested,
        total_spend = allocation.total_spend,
        total_uplift = allocation.total_uplift,
        "allocation complete"
    );

    // 4) Unoptimised comparison and roll-ups.
    let baseline = previous_spend(&curves, config.previous_budget, config.previous_seed)?;
    let comparison = compare_by_tier(&allocation.entries, &baseline);
    let matrix = by_channel_tier(&allocation.entries);

    Ok(RunOutput {
        params,
        curves,
        eligible,
        allocation,
        baseline,
        comparison,
        matrix,
    })
}

/// Run the allocator for each budget on the configured plan.
pub fn run_sweep(config: &RunConfig, budgets: &[f64]) -> Result<Vec<SweepPoint>, AppError> {
    validate_selection(config)?;
    let (_, curves) = build_curves(config.seed, config.period_kind, config.step, config.max_spend)?;
    let eligible = compute_eligible(curves.curves(), &config.plan, &config.channels);
    let eligible_curves = curves.resolve(&eligible)?;
    tracing::info!(budgets = budgets.len(), eligible = eligible.len(), "running budget sweep");
    Ok(sweep_budgets(&eligible_curves, budgets, config.step)?)
}
