//! "Previous spend" comparison allocation.
//!
//! Models how a historical budget was spent without optimisation: split at
//! random over *every* curve, regardless of plan or channel selection, then
//! evaluated on the same response curves.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::curves::{CurveSet, evaluate_uplift};
use crate::domain::CurveKey;
use crate::error::AllocError;

/// Default historical spend.
pub const DEFAULT_PREVIOUS_BUDGET: f64 = 1_000_000.0;
/// Default seed for the historical split.
pub const DEFAULT_PREVIOUS_SEED: u64 = 2026;

/// Minimum split weight, so every curve gets something.
const WEIGHT_FLOOR: f64 = 0.2;

/// Spend recorded against one curve in the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub key: CurveKey,
    /// Recorded spend (not snapped to the grid, may exceed the cap).
    pub spend: f64,
    /// Uplift at `min(spend, cap)`.
    pub uplift: f64,
}

/// Split `total` across all curves with seeded random weights.
pub fn previous_spend(curves: &CurveSet, total: f64, seed: u64) -> Result<Vec<BaselineEntry>, AllocError> {
    if !(total.is_finite() && total >= 0.0) {
        return Err(AllocError::InvalidBudget(total));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let weights: Vec<f64> = curves
        .curves()
        .iter()
        .map(|_| WEIGHT_FLOOR + rng.r#gen::<f64>())
        .collect();
    let weight_sum: f64 = weights.iter().sum();
    if weight_sum <= 0.0 {
        return Ok(Vec::new());
    }

    let cap = curves.grid.max_spend();
    Ok(curves
        .curves()
        .iter()
        .zip(weights)
        .map(|(c, w)| {
            let spend = total * w / weight_sum;
            BaselineEntry {
                key: c.key,
                spend,
                uplift: evaluate_uplift(&c.params, spend.min(cap)),
            }
        })
        .collect())
}
