//! Reporting utilities: roll-ups of allocations and formatted terminal output.
//!
//! Aggregation works over anything that implements `SpendRecord`, so the
//! optimised allocation and the "previous" baseline share the same code.

use std::collections::BTreeMap;

use crate::domain::{Channel, CurveKey, Tier};
use crate::optimise::{AllocationEntry, BaselineEntry};

pub mod format;

pub use format::*;

/// A row of spend attributed to a curve.
pub trait SpendRecord {
    fn key(&self) -> CurveKey;
    fn spend(&self) -> f64;
    fn uplift(&self) -> f64;
}

impl SpendRecord for AllocationEntry {
    fn key(&self) -> CurveKey {
        self.key
    }

    fn spend(&self) -> f64 {
        self.spend
    }

    fn uplift(&self) -> f64 {
        self.uplift
    }
}

impl SpendRecord for BaselineEntry {
    fn key(&self) -> CurveKey {
        self.key
    }

    fn spend(&self) -> f64 {
        self.spend
    }

    fn uplift(&self) -> f64 {
        self.uplift
    }
}

/// Spend and uplift summed over a group of curves.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub spend: f64,
    pub uplift: f64,
}

impl Totals {
    pub fn cost_per_acquisition(&self) -> Option<f64> {
        cost_per_acquisition(self.spend, self.uplift)
    }
}

/// Spend per unit of uplift; `None` when nothing was acquired.
pub fn cost_per_acquisition(spend: f64, uplift: f64) -> Option<f64> {
    if uplift > 0.0 { Some(spend / uplift) } else { None }
}

/// Totals per tier, summed over periods and channels. Every tier is present.
pub fn by_tier<R: SpendRecord>(records: &[R]) -> BTreeMap<Tier, Totals> {
    let mut out: BTreeMap<Tier, Totals> = Tier::ALL.into_iter().map(|t| (t, Totals::default())).collect();
    for r in records {
        let t = out.entry(r.key().tier).or_default();
        t.spend += r.spend();
        t.uplift += r.uplift();
    }
    out
}

/// Spend per `(channel, tier)`, summed over periods. Every cell is present.
pub fn by_channel_tier<R: SpendRecord>(records: &[R]) -> BTreeMap<(Channel, Tier), f64> {
    let mut out: BTreeMap<(Channel, Tier), f64> = Channel::ALL
        .into_iter()
        .flat_map(|c| Tier::ALL.into_iter().map(move |t| ((c, t), 0.0)))
        .collect();
    for r in records {
        let key = r.key();
        *out.entry((key.channel, key.tier)).or_default() += r.spend();
    }
    out
}

/// Grand totals over all records.
pub fn totals<R: SpendRecord>(records: &[R]) -> Totals {
    records.iter().fold(Totals::default(), |acc, r| Totals {
        spend: acc.spend + r.spend(),
        uplift: acc.uplift + r.uplift(),
    })
}

/// Optimised vs previous for one tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierComparison {
    pub tier: Tier,
    pub optimised: Totals,
    pub previous: Totals,
}

impl TierComparison {
    pub fn spend_diff(&self) -> f64 {
        self.optimised.spend - self.previous.spend
    }

    pub fn uplift_diff(&self) -> f64 {
        self.optimised.uplift - self.previous.uplift
    }

    /// Only defined when both sides acquired something.
    pub fn cpa_diff(&self) -> Option<f64> {
        Some(self.optimised.cost_per_acquisition()? - self.previous.cost_per_acquisition()?)
    }
}

/// Side-by-side per-tier totals, in tier order.
pub fn compare_by_tier<A: SpendRecord, B: SpendRecord>(optimised: &[A], previous: &[B]) -> Vec<TierComparison> {
    let opt = by_tier(optimised);
    let prev = by_tier(previous);
    Tier::ALL
        .into_iter()
        .map(|tier| TierComparison {
            tier,
            optimised: opt.get(&tier).copied().unwrap_or_default(),
            previous: prev.get(&tier).copied().unwrap_or_default(),
        })
        .collect()
}
