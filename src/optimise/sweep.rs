//! Budget-response sweep.
//!
//! Each budget is an independent allocator run over the same immutable
//! curves, so the runs are spread across rayon's pool.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::curves::ResponseCurve;
use crate::error::AllocError;
use crate::optimise::greedy::allocate;

/// Outcome of one budget in a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub budget: f64,
    pub total_spend: f64,
    pub total_uplift: f64,
    pub steps_used: usize,
}

/// Run the allocator for each budget; output order follows `budgets`.
pub fn sweep_budgets(
    curves: &[&ResponseCurve],
    budgets: &[f64],
    step: f64,
) -> Result<Vec<SweepPoint>, AllocError> {
    budgets
        .par_iter()
        .map(|&budget| {
            let result = allocate(curves, budget, step)?;
            Ok(SweepPoint {
                budget,
                total_spend: result.total_spend,
                total_uplift: result.total_uplift,
                steps_used: result.steps_used,
            })
        })
        .collect()
}
