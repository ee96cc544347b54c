//! Discrete greedy budget allocation.
//!
//! The budget is cut into `floor(budget / step)` equal increments. Each
//! increment goes to the curve whose *next* grid step adds the most uplift.
//! For independent concave curves on a shared equal-step grid this greedy
//! order is optimal for the discrete problem.
//!
//! Ranking rule: raw uplift gain of the next step. Because every curve moves
//! by the same `step`, ranking by gain per unit spend would pick the same
//! winners.
//!
//! Tie-break: when gains are exactly equal, the curve that comes first in the
//! input order wins. Callers pass eligible curves in `(period, tier, channel)`
//! order, so ties resolve to the lowest key.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::curves::ResponseCurve;
use crate::domain::CurveKey;
use crate::error::AllocError;

/// Spend assigned to one curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub key: CurveKey,
    /// Grid level reached; `spend == step × step_index`.
    pub step_index: usize,
    pub spend: f64,
    pub uplift: f64,
}

/// Output of one allocator run.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult {
    /// Curves with non-zero spend, in input order.
    pub entries: Vec<AllocationEntry>,
    pub total_spend: f64,
    pub total_uplift: f64,
    pub eligible_curves: usize,
    /// `floor(budget / step)`, or 0 when there was nothing to allocate to.
    pub steps_requested: usize,
    /// Increments actually handed out (less than requested on saturation).
    pub steps_used: usize,
    pub step: f64,
    /// Winning curve for each increment, in allocation order.
    pub trace: Vec<CurveKey>,
}

impl AllocationResult {
    fn empty(step: f64, eligible_curves: usize) -> Self {
        Self {
            entries: Vec::new(),
            total_spend: 0.0,
            total_uplift: 0.0,
            eligible_curves,
            steps_requested: 0,
            steps_used: 0,
            step,
            trace: Vec::new(),
        }
    }

    /// Allocation as an ordered `(key, spend)` list.
    pub fn pairs(&self) -> Vec<(CurveKey, f64)> {
        self.entries.iter().map(|e| (e.key, e.spend)).collect()
    }

    /// Spend assigned to `key` (0 when it received nothing).
    pub fn spend_for(&self, key: &CurveKey) -> f64 {
        self.entries
            .iter()
            .find(|e| e.key == *key)
            .map_or(0.0, |e| e.spend)
    }

    /// True when saturation stopped the run before the budget ran out.
    pub fn terminated_early(&self) -> bool {
        self.steps_used < self.steps_requested
    }
}

/// Heap entry: the next increment available on one curve.
#[derive(Debug, Clone, Copy)]
struct NextStep {
    gain: f64,
    position: usize,
}

impl Ord for NextStep {
    fn cmp(&self, other: &Self) -> Ordering {
        // Larger gain first; on equal gain, lower position first.
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| Reverse(self.position).cmp(&Reverse(other.position)))
    }
}

impl PartialOrd for NextStep {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NextStep {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NextStep {}

fn next_step(curve: &ResponseCurve, current: usize, position: usize) -> Option<NextStep> {
    if current >= curve.max_index() {
        return None;
    }
    Some(NextStep {
        gain: curve.increment(current + 1),
        position,
    })
}

/// Allocate `total_budget` across `curves` in increments of `step`.
///
/// Every curve must be sampled on a grid whose increment equals `step`.
/// Runs in `O(steps × log n)`.
pub fn allocate(
    curves: &[&ResponseCurve],
    total_budget: f64,
    step: f64,
) -> Result<AllocationResult, AllocError> {
    if !(total_budget.is_finite() && total_budget >= 0.0) {
        return Err(AllocError::InvalidBudget(total_budget));
    }
    if !(step.is_finite() && step > 0.0) {
        return Err(AllocError::InvalidStep(step));
    }
    for c in curves {
        let grid_step = c.grid.step();
        if (grid_step - step).abs() > 1e-9 * step {
            return Err(AllocError::GridMismatch {
                key: c.key,
                grid_step,
                step,
            });
        }
    }

    let n = curves.len();
    if n == 0 {
        return Ok(AllocationResult::empty(step, 0));
    }
    let steps_requested = (total_budget / step).floor() as usize;
    if steps_requested == 0 {
        return Ok(AllocationResult::empty(step, n));
    }

    let mut index = vec![0usize; n];
    let mut trace = Vec::new();
    let mut heap: BinaryHeap<NextStep> = curves
        .iter()
        .enumerate()
        .filter_map(|(pos, c)| next_step(c, 0, pos))
        .collect();

    for _ in 0..steps_requested {
        let Some(best) = heap.pop() else {
            tracing::debug!("every eligible curve is at its spend cap");
            break;
        };
        if !(best.gain > 0.0) {
            tracing::debug!(gain = best.gain, "no positive marginal gain left");
            break;
        }
        let pos = best.position;
        index[pos] += 1;
        trace.push(curves[pos].key);
        if let Some(next) = next_step(curves[pos], index[pos], pos) {
            heap.push(next);
        }
    }

    let mut entries = Vec::new();
    let mut total_spend = 0.0;
    let mut total_uplift = 0.0;
    for (curve, &i) in curves.iter().zip(index.iter()) {
        if i == 0 {
            continue;
        }
        let spend = curve.spend_at(i);
        let uplift = curve.uplift[i];
        total_spend += spend;
        total_uplift += uplift;
        entries.push(AllocationEntry {
            key: curve.key,
            step_index: i,
            spend,
            uplift,
        });
    }

    let result = AllocationResult {
        entries,
        total_spend,
        total_uplift,
        eligible_curves: n,
        steps_requested,
        steps_used: trace.len(),
        step,
        trace,
    };
    tracing::debug!(
        eligible = n,
        steps_requested,
        steps_used = result.steps_used,
        total_spend,
        total_uplift,
        "allocation finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{SpendGrid, build_curve, build_curve_set, generate_curve_params};
    use crate::domain::{Channel, ChannelSelection, CurveParams, PeriodKind, Plan, Tier};
    use crate::optimise::compute_eligible;

    fn curve(channel: Channel, coefficient: f64, saturation_scale: f64) -> ResponseCurve {
        let params = CurveParams {
            tier: Tier::Xxl,
            channel,
            coefficient,
            saturation_scale,
            tier_weight: 1.0,
        };
        build_curve(&params, 0, SpendGrid::default())
    }

    #[test]
    fn single_curve_takes_every_increment() {
        let c = curve(Channel::GoogleSearch, 100.0, 50_000.0);
        let result = allocate(&[&c], 30_000.0, 10_000.0).unwrap();

        assert_eq!(result.steps_requested, 3);
        assert_eq!(result.steps_used, 3);
        assert_eq!(result.trace, vec![c.key; 3]);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].step_index, 3);
        assert_eq!(result.total_spend, 30_000.0);
        let expected = 100.0 * (1.0 - (-0.6f64).exp());
        assert!((result.total_uplift - expected).abs() < 1e-9);
        assert!((result.total_uplift - 45.12).abs() < 0.01);
    }

    #[test]
    fn winner_switches_when_the_other_curve_overtakes() {
        // A saturates fast: increments 63.2, 23.3, 8.6, ...
        // B saturates slowly: increments 19.0, 17.2, 15.6, 14.1, 12.8, ...
        let a = curve(Channel::GoogleSearch, 100.0, 10_000.0);
        let b = curve(Channel::Youtube, 200.0, 100_000.0);

        assert!(a.increment(2) > b.increment(1));
        assert!(a.increment(3) < b.increment(1));
        assert!(a.increment(3) < b.increment(4));

        let result = allocate(&[&a, &b], 60_000.0, 10_000.0).unwrap();
        assert_eq!(result.trace, vec![a.key, a.key, b.key, b.key, b.key, b.key]);
        assert_eq!(result.spend_for(&a.key), 20_000.0);
        assert_eq!(result.spend_for(&b.key), 40_000.0);
    }

    #[test]
    fn exact_ties_go_to_the_earlier_curve() {
        let a = curve(Channel::GoogleSearch, 100.0, 50_000.0);
        let b = curve(Channel::Youtube, 100.0, 50_000.0);

        let result = allocate(&[&a, &b], 40_000.0, 10_000.0).unwrap();
        assert_eq!(result.trace, vec![a.key, b.key, a.key, b.key]);

        let reversed = allocate(&[&b, &a], 40_000.0, 10_000.0).unwrap();
        assert_eq!(reversed.trace, vec![b.key, a.key, b.key, a.key]);
    }

    #[test]
    fn budget_below_step_is_an_empty_allocation() {
        let c = curve(Channel::Crm, 100.0, 50_000.0);
        for budget in [0.0, 9_999.0] {
            let result = allocate(&[&c], budget, 10_000.0).unwrap();
            assert!(result.entries.is_empty());
            assert_eq!(result.total_spend, 0.0);
            assert_eq!(result.total_uplift, 0.0);
            assert_eq!(result.steps_requested, 0);
            assert_eq!(result.eligible_curves, 1);
        }
    }

    #[test]
    fn no_curves_is_an_empty_allocation() {
        let result = allocate(&[], 1_000_000.0, 10_000.0).unwrap();
        assert!(result.entries.is_empty());
        assert_eq!(result.steps_requested, 0);
        assert_eq!(result.eligible_curves, 0);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let c = curve(Channel::Crm, 100.0, 50_000.0);
        assert_eq!(
            allocate(&[&c], -1.0, 10_000.0),
            Err(AllocError::InvalidBudget(-1.0))
        );
        assert!(matches!(
            allocate(&[&c], f64::INFINITY, 10_000.0),
            Err(AllocError::InvalidBudget(_))
        ));
        assert_eq!(allocate(&[&c], 100.0, 0.0), Err(AllocError::InvalidStep(0.0)));
        assert!(matches!(
            allocate(&[&c], 100_000.0, 5_000.0),
            Err(AllocError::GridMismatch { .. })
        ));
    }

    #[test]
    fn saturation_stops_before_budget_runs_out() {
        let a = curve(Channel::GoogleSearch, 100.0, 50_000.0);
        let b = curve(Channel::Youtube, 80.0, 30_000.0);

        let result = allocate(&[&a, &b], 10_000_000.0, 10_000.0).unwrap();
        assert_eq!(result.steps_requested, 1_000);
        assert_eq!(result.steps_used, 20);
        assert!(result.terminated_early());
        assert_eq!(result.total_spend, 200_000.0);
        assert!(result.total_spend < 10_000_000.0);
    }

    #[test]
    fn flat_curves_receive_nothing() {
        let mut flat = curve(Channel::Audio, 100.0, 50_000.0);
        flat.uplift = vec![0.0; flat.uplift.len()];
        let result = allocate(&[&flat], 50_000.0, 10_000.0).unwrap();
        assert_eq!(result.steps_requested, 5);
        assert_eq!(result.steps_used, 0);
        assert!(result.entries.is_empty());
    }

    #[test]
    fn spend_respects_budget_step_and_caps() {
        let params = generate_curve_params(1337).unwrap();
        let set = build_curve_set(&params, 12, SpendGrid::default()).unwrap();
        let plan = Plan::default_for(PeriodKind::Month);
        let keys = compute_eligible(set.curves(), &plan, &ChannelSelection::all());
        let curves = set.resolve(&keys).unwrap();

        let mut previous_uplift = 0.0;
        for k in 0..60 {
            let budget = k as f64 * 137_500.0;
            let result = allocate(&curves, budget, 10_000.0).unwrap();

            assert!(result.total_spend <= budget);
            assert_eq!((result.total_spend / 10_000.0).fract(), 0.0);
            assert!(result.total_uplift >= previous_uplift);
            previous_uplift = result.total_uplift;

            for e in &result.entries {
                assert!(e.spend <= set.grid.max_spend());
                assert_eq!(e.spend, set.grid.spend_at(e.step_index));
            }
            let positions: Vec<usize> = result
                .entries
                .iter()
                .map(|e| keys.iter().position(|k| *k == e.key).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
