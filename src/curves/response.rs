//! Response-curve evaluation on a shared spend grid.
//!
//! The curve family is a single saturating exponential:
//!
//! `uplift(x) = coefficient × tier_weight × (1 − e^(−x / saturation_scale))`
//!
//! It is strictly increasing and concave, starts at exactly 0 and approaches
//! `coefficient × tier_weight` as spend grows. We only ever evaluate it at the
//! discrete levels of a `SpendGrid`.

use crate::domain::{Channel, CurveKey, CurveParams, Tier};
use crate::error::AllocError;

/// Default allocation increment.
pub const DEFAULT_STEP: f64 = 10_000.0;
/// Default per-curve spend cap.
pub const DEFAULT_MAX_SPEND: f64 = 100_000.0;
/// Largest number of steps a grid may have. Every curve stores one sample
/// per level, so this bounds memory per curve set.
pub const MAX_GRID_STEPS: usize = 10_000;

/// Evaluate uplift at a spend level.
///
/// Returns exactly `0.0` for `spend <= 0` and never returns a negative value.
pub fn evaluate_uplift(params: &CurveParams, spend: f64) -> f64 {
    if !(spend > 0.0) {
        return 0.0;
    }
    // `-expm1(-x)` is `1 - e^-x` without cancellation for small `x`.
    let saturation = -(-spend / params.saturation_scale).exp_m1();
    (params.coefficient * params.tier_weight * saturation).max(0.0)
}

/// Fixed ascending spend levels `0, step, 2·step, …, max_spend`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpendGrid {
    step: f64,
    points: usize,
}

impl SpendGrid {
    /// Build a grid. `max_spend` must be a positive whole multiple of `step`,
    /// with at most `MAX_GRID_STEPS` steps.
    pub fn new(step: f64, max_spend: f64) -> Result<Self, AllocError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(AllocError::InvalidStep(step));
        }
        let invalid = AllocError::InvalidGrid { step, max_spend };
        if !(max_spend.is_finite() && max_spend >= step) {
            return Err(invalid);
        }
        let n = (max_spend / step).round();
        if n > MAX_GRID_STEPS as f64 || (n * step - max_spend).abs() > 1e-9 * max_spend {
            return Err(invalid);
        }
        let points = (n as usize).checked_add(1).ok_or(invalid)?;
        Ok(Self { step, points })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of levels, including 0.
    pub fn len(&self) -> usize {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points == 0
    }

    /// Index of the highest level.
    pub fn max_index(&self) -> usize {
        self.points - 1
    }

    pub fn max_spend(&self) -> f64 {
        self.spend_at(self.max_index())
    }

    /// Spend at level `i`. Always an exact multiple of `step`.
    pub fn spend_at(&self, i: usize) -> f64 {
        self.step * i as f64
    }

    pub fn levels(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.points).map(|i| self.spend_at(i))
    }
}

impl Default for SpendGrid {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            points: (DEFAULT_MAX_SPEND / DEFAULT_STEP) as usize + 1,
        }
    }
}

/// Uplift samples for one `(period, tier, channel)` on a spend grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCurve {
    pub key: CurveKey,
    pub params: CurveParams,
    pub grid: SpendGrid,
    /// One value per grid level; `uplift[0] == 0`.
    pub uplift: Vec<f64>,
}

impl ResponseCurve {
    /// Uplift gained by moving from level `i - 1` to level `i`.
    ///
    /// Level 0 is the starting state, not a move, so `increment(0) == 0`.
    pub fn increment(&self, i: usize) -> f64 {
        if i == 0 || i >= self.uplift.len() {
            return 0.0;
        }
        self.uplift[i] - self.uplift[i - 1]
    }

    pub fn spend_at(&self, i: usize) -> f64 {
        self.grid.spend_at(i)
    }

    pub fn max_index(&self) -> usize {
        self.uplift.len().saturating_sub(1)
    }
}

/// Sample one curve on the grid.
pub fn build_curve(params: &CurveParams, period: usize, grid: SpendGrid) -> ResponseCurve {
    let uplift = grid.levels().map(|x| evaluate_uplift(params, x)).collect();
    ResponseCurve {
        key: CurveKey::new(period, params.tier, params.channel),
        params: *params,
        grid,
        uplift,
    }
}

/// Every curve for every period, in `(period, tier, channel)` order.
///
/// Parameters do not vary by period; the period only enters the key.
#[derive(Debug, Clone)]
pub struct CurveSet {
    pub grid: SpendGrid,
    pub period_count: usize,
    curves: Vec<ResponseCurve>,
}

impl CurveSet {
    pub fn curves(&self) -> &[ResponseCurve] {
        &self.curves
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// O(1) lookup by key.
    pub fn get(&self, key: &CurveKey) -> Option<&ResponseCurve> {
        if key.period >= self.period_count {
            return None;
        }
        let per_period = Tier::ALL.len() * Channel::ALL.len();
        let idx = key.period * per_period + key.tier.index() * Channel::ALL.len() + key.channel.index();
        self.curves.get(idx).filter(|c| c.key == *key)
    }

    /// Resolve keys to curves, preserving order.
    pub fn resolve(&self, keys: &[CurveKey]) -> Result<Vec<&ResponseCurve>, AllocError> {
        keys.iter()
            .map(|k| self.get(k).ok_or(AllocError::UnknownCurve(*k)))
            .collect()
    }
}

/// Build curves for `period_count` periods from one parameter per pair.
///
/// `params` must cover every `(tier, channel)` pair exactly once; missing
/// pairs are reported as `UnknownCurve` for period 0.
pub fn build_curve_set(
    params: &[CurveParams],
    period_count: usize,
    grid: SpendGrid,
) -> Result<CurveSet, AllocError> {
    let mut ordered = Vec::with_capacity(Tier::ALL.len() * Channel::ALL.len());
    for tier in Tier::ALL {
        for channel in Channel::ALL {
            let p = params
                .iter()
                .find(|p| p.tier == tier && p.channel == channel)
                .ok_or(AllocError::UnknownCurve(CurveKey::new(0, tier, channel)))?;
            ordered.push(p);
        }
    }

    let mut curves = Vec::with_capacity(period_count * ordered.len());
    for period in 0..period_count {
        for p in &ordered {
            curves.push(build_curve(p, period, grid));
        }
    }

    Ok(CurveSet {
        grid,
        period_count,
        curves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::generate_curve_params;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn params(coefficient: f64, saturation_scale: f64) -> CurveParams {
        CurveParams {
            tier: Tier::L,
            channel: Channel::Display,
            coefficient,
            saturation_scale,
            tier_weight: 1.0,
        }
    }

    #[test]
    fn uplift_is_zero_at_zero_spend() {
        let p = params(100.0, 50_000.0);
        assert_eq!(evaluate_uplift(&p, 0.0), 0.0);
        assert_eq!(evaluate_uplift(&p, -10.0), 0.0);
    }

    #[test]
    fn uplift_matches_closed_form() {
        let p = params(100.0, 50_000.0);
        let y = evaluate_uplift(&p, 30_000.0);
        let expected = 100.0 * (1.0 - (-0.6f64).exp());
        assert!((y - expected).abs() < 1e-9);
        assert!((y - 45.12).abs() < 0.01, "got {y}");
    }

    #[test]
    fn uplift_is_non_negative_and_non_decreasing() {
        let mut rng = StdRng::seed_from_u64(7);
        for p in generate_curve_params(99).unwrap() {
            for _ in 0..200 {
                let a = rng.gen_range(0.0..500_000.0);
                let b = rng.gen_range(0.0..500_000.0);
                let (s1, s2) = if a <= b { (a, b) } else { (b, a) };
                let y1 = evaluate_uplift(&p, s1);
                let y2 = evaluate_uplift(&p, s2);
                assert!(y1 >= 0.0);
                assert!(y1 <= y2, "uplift({s1})={y1} > uplift({s2})={y2}");
            }
        }
    }

    #[test]
    fn doubling_saturation_scale_slows_saturation() {
        let fast = params(100.0, 20_000.0);
        let slow = params(100.0, 40_000.0);
        assert!(evaluate_uplift(&slow, 30_000.0) < evaluate_uplift(&fast, 30_000.0));
    }

    #[test]
    fn default_grid_has_eleven_levels() {
        let grid = SpendGrid::default();
        assert_eq!(grid.len(), 11);
        assert_eq!(grid.max_spend(), 100_000.0);
        assert_eq!(grid, SpendGrid::new(10_000.0, 100_000.0).unwrap());
    }

    #[test]
    fn grid_rejects_bad_inputs() {
        assert_eq!(SpendGrid::new(0.0, 100.0), Err(AllocError::InvalidStep(0.0)));
        assert!(SpendGrid::new(10.0, 5.0).is_err());
        assert!(SpendGrid::new(10.0, 25.0).is_err());
        assert!(SpendGrid::new(f64::NAN, 100.0).is_err());
    }

    #[test]
    fn grid_rejects_oversized_inputs() {
        assert_eq!(
            SpendGrid::new(1.0, 1e30),
            Err(AllocError::InvalidGrid { step: 1.0, max_spend: 1e30 })
        );
        assert!(SpendGrid::new(1.0, 1e9).is_err());
        assert!(SpendGrid::new(f64::MIN_POSITIVE, 1.0).is_err());

        let widest = SpendGrid::new(10.0, 10.0 * MAX_GRID_STEPS as f64).unwrap();
        assert_eq!(widest.len(), MAX_GRID_STEPS + 1);
        assert!(SpendGrid::new(10.0, 10.0 * (MAX_GRID_STEPS + 1) as f64).is_err());
    }

    #[test]
    fn curve_increments_are_diminishing() {
        let curve = build_curve(&params(100.0, 50_000.0), 3, SpendGrid::default());
        assert_eq!(curve.key, CurveKey::new(3, Tier::L, Channel::Display));
        assert_eq!(curve.increment(0), 0.0);
        for i in 2..curve.uplift.len() {
            assert!(curve.increment(i) < curve.increment(i - 1));
            assert!(curve.increment(i) > 0.0);
        }
    }

    #[test]
    fn curve_set_lookup_matches_order() {
        let params = generate_curve_params(1).unwrap();
        let set = build_curve_set(&params, 12, SpendGrid::default()).unwrap();
        assert_eq!(set.len(), 600);
        for w in set.curves().windows(2) {
            assert!(w[0].key < w[1].key);
        }
        let key = CurveKey::new(7, Tier::M, Channel::Audio);
        assert_eq!(set.get(&key).unwrap().key, key);
        assert!(set.get(&CurveKey::new(12, Tier::M, Channel::Audio)).is_none());
    }
}
