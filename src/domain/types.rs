//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - used in-memory during curve generation and allocation
//! - exported to JSON/CSV
//! - reloaded later for display

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Prize-draw size category.
///
/// Ordering follows prize size (largest first), which is also the row order
/// used in every report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    #[value(name = "XXL")]
    Xxl,
    #[value(name = "XL")]
    Xl,
    #[value(name = "L")]
    L,
    #[value(name = "M")]
    M,
    #[value(name = "S")]
    S,
}

impl Tier {
    pub const ALL: [Tier; 5] = [Tier::Xxl, Tier::Xl, Tier::L, Tier::M, Tier::S];

    pub fn display_name(self) -> &'static str {
        match self {
            Tier::Xxl => "XXL",
            Tier::Xl => "XL",
            Tier::L => "L",
            Tier::M => "M",
            Tier::S => "S",
        }
    }

    /// Baseline response multiplier. Bigger prizes pull harder.
    pub fn mean_weight(self) -> f64 {
        match self {
            Tier::Xxl => 1.25,
            Tier::Xl => 1.10,
            Tier::L => 1.00,
            Tier::M => 0.85,
            Tier::S => 0.70,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|t| t.display_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown tier '{s}' (expected XXL, XL, L, M or S)."))
    }
}

/// Marketing channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Channel {
    GoogleSearch,
    TiktokVideo,
    MetaVideo,
    Youtube,
    OutdoorBrand,
    OutdoorPerf,
    Display,
    Audio,
    Affiliates,
    Crm,
}

impl Channel {
    pub const ALL: [Channel; 10] = [
        Channel::GoogleSearch,
        Channel::TiktokVideo,
        Channel::MetaVideo,
        Channel::Youtube,
        Channel::OutdoorBrand,
        Channel::OutdoorPerf,
        Channel::Display,
        Channel::Audio,
        Channel::Affiliates,
        Channel::Crm,
    ];

    /// Stable identifier used in curve keys and exports.
    pub fn id(self) -> &'static str {
        match self {
            Channel::GoogleSearch => "google_search",
            Channel::TiktokVideo => "tiktok_video",
            Channel::MetaVideo => "meta_video",
            Channel::Youtube => "youtube",
            Channel::OutdoorBrand => "outdoor_brand",
            Channel::OutdoorPerf => "outdoor_perf",
            Channel::Display => "display",
            Channel::Audio => "audio",
            Channel::Affiliates => "affiliates",
            Channel::Crm => "crm",
        }
    }

    /// Human-readable label for terminal output.
    pub fn label(self) -> &'static str {
        match self {
            Channel::GoogleSearch => "Google Search",
            Channel::TiktokVideo => "TikTok video",
            Channel::MetaVideo => "Meta video",
            Channel::Youtube => "YouTube",
            Channel::OutdoorBrand => "Outdoor (brand)",
            Channel::OutdoorPerf => "Outdoor (perf)",
            Channel::Display => "Display",
            Channel::Audio => "Audio",
            Channel::Affiliates => "Affiliates",
            Channel::Crm => "CRM",
        }
    }

    /// Assumed relative efficiency of the channel.
    pub fn efficiency(self) -> f64 {
        match self {
            Channel::GoogleSearch => 1.20,
            Channel::TiktokVideo => 0.95,
            Channel::MetaVideo => 1.00,
            Channel::Youtube => 0.90,
            Channel::OutdoorBrand => 0.80,
            Channel::OutdoorPerf => 0.88,
            Channel::Display => 0.92,
            Channel::Audio => 0.78,
            Channel::Affiliates => 1.05,
            Channel::Crm => 1.15,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.id() == s.trim())
            .ok_or_else(|| format!("Unknown channel '{s}'."))
    }
}

/// Granularity of the planning calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    /// Twelve calendar months.
    Month,
    /// A 30-day campaign window.
    Day,
}

impl PeriodKind {
    pub fn count(self) -> usize {
        match self {
            PeriodKind::Month => 12,
            PeriodKind::Day => 30,
        }
    }

    /// Short label for a period index (`Jan`, `D07`, ...).
    pub fn label(self, period: usize) -> String {
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        match self {
            PeriodKind::Month => MONTHS.get(period).map_or_else(|| format!("M{period}"), |m| m.to_string()),
            PeriodKind::Day => format!("D{:02}", period + 1),
        }
    }
}

/// Response-curve parameters for one `(tier, channel)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParams {
    pub tier: Tier,
    pub channel: Channel,
    /// Overall uplift scale.
    pub coefficient: f64,
    /// Spend at which the curve reaches ~63% of its ceiling.
    pub saturation_scale: f64,
    pub tier_weight: f64,
}

/// Identifies one response curve: `(period, tier, channel)`.
///
/// Ordering is period-major, then tier, then channel. This is the iteration
/// order of curve sets and eligible sets, and therefore the allocator's
/// tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurveKey {
    pub period: usize,
    pub tier: Tier,
    pub channel: Channel,
}

impl CurveKey {
    pub fn new(period: usize, tier: Tier, channel: Channel) -> Self {
        Self { period, tier, channel }
    }
}

impl fmt::Display for CurveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}__{}__{}", self.period, self.tier, self.channel)
    }
}

impl FromStr for CurveKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split("__");
        let (Some(period), Some(tier), Some(channel), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("Malformed curve key '{s}' (expected period__TIER__channel)."));
        };
        let period = period
            .parse::<usize>()
            .map_err(|e| format!("Malformed period in curve key '{s}': {e}"))?;
        Ok(CurveKey::new(period, tier.parse()?, channel.parse()?))
    }
}

impl Serialize for CurveKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CurveKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which tier is live in which period.
///
/// Every tier has exactly `period_count` flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    period_count: usize,
    live: BTreeMap<Tier, Vec<bool>>,
}

impl Plan {
    /// A plan with nothing live.
    pub fn empty(period_count: usize) -> Self {
        let live = Tier::ALL
            .into_iter()
            .map(|t| (t, vec![false; period_count]))
            .collect();
        Self { period_count, live }
    }

    /// The out-of-the-box plan: each tier live for a short block of periods.
    pub fn default_for(kind: PeriodKind) -> Self {
        let blocks: [(Tier, &[usize]); 5] = match kind {
            PeriodKind::Month => [
                (Tier::Xxl, &[10, 11][..]),
                (Tier::Xl, &[5, 6][..]),
                (Tier::L, &[2, 3][..]),
                (Tier::M, &[0, 1][..]),
                (Tier::S, &[7, 8][..]),
            ],
            PeriodKind::Day => [
                (Tier::Xxl, &[26, 27, 28][..]),
                (Tier::Xl, &[20, 21, 22][..]),
                (Tier::L, &[14, 15, 16][..]),
                (Tier::M, &[8, 9, 10][..]),
                (Tier::S, &[2, 3, 4][..]),
            ],
        };
        let mut plan = Plan::empty(kind.count());
        for (tier, periods) in blocks {
            for &p in periods {
                plan.set_live(tier, p, true);
            }
        }
        plan
    }

    pub fn period_count(&self) -> usize {
        self.period_count
    }

    /// Toggle a cell. Out-of-range periods are ignored.
    pub fn set_live(&mut self, tier: Tier, period: usize, live: bool) {
        if let Some(cell) = self.live.get_mut(&tier).and_then(|row| row.get_mut(period)) {
            *cell = live;
        }
    }

    pub fn is_live(&self, tier: Tier, period: usize) -> bool {
        self.live
            .get(&tier)
            .and_then(|row| row.get(period))
            .copied()
            .unwrap_or(false)
    }

    /// Live period indices for a tier, ascending.
    pub fn live_periods(&self, tier: Tier) -> Vec<usize> {
        self.live
            .get(&tier)
            .map(|row| row.iter().enumerate().filter(|(_, on)| **on).map(|(i, _)| i).collect())
            .unwrap_or_default()
    }

    /// Total number of live `(tier, period)` cells.
    pub fn live_count(&self) -> usize {
        self.live.values().map(|row| row.iter().filter(|on| **on).count()).sum()
    }
}

/// Channels currently enabled.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelSelection(BTreeSet<Channel>);

impl ChannelSelection {
    pub fn all() -> Self {
        Self(Channel::ALL.into_iter().collect())
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.0.contains(&channel)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Channel> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Channel> for ChannelSelection {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub name: String,
    pub seed: u64,
    pub period_kind: PeriodKind,
    pub plan: Plan,
    pub channels: ChannelSelection,

    pub budget: f64,
    pub step: f64,
    pub max_spend: f64,

    /// Historical spend used for the "previous" comparison column.
    pub previous_budget: f64,
    pub previous_seed: u64,

    pub plot: bool,
    pub plot_width: usize,

    pub export_scenario: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
    /// History file to append this run to.
    pub save_history: Option<PathBuf>,
}
