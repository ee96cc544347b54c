//! Command-line parsing for the marketing spend allocator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the curve/allocation code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::curves::{DEFAULT_MAX_SPEND, DEFAULT_STEP};
use crate::domain::{Channel, PeriodKind, Tier};
use crate::io::DEFAULT_HISTORY_FILE;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "spend", version, about = "Greedy marketing budget allocator over saturating response curves")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Allocate a budget across live curves, print the breakdown, and optionally plot/export.
    Run(RunArgs),
    /// Print the generated curve parameters for a seed.
    Curves(CurvesArgs),
    /// Allocate several budgets in parallel and print the budget-response table.
    Sweep(SweepArgs),
    /// Print a saved scenario (from history or an exported JSON file).
    Show(ShowArgs),
    /// List saved scenarios, newest first.
    History(HistoryArgs),
}

/// Options shared by every command that builds curves and a plan.
#[derive(Debug, Args, Clone)]
pub struct PlanArgs {
    /// Seed for curve parameter generation.
    #[arg(long, env = "SPEND_SEED", default_value_t = 1337)]
    pub seed: u64,

    /// Planning calendar (12 months or 30 days).
    #[arg(long, value_enum, default_value_t = PeriodKind::Month)]
    pub periods: PeriodKind,

    /// Live periods for a tier, 1-based: `--live XXL=11,12`. Repeatable.
    /// When absent the default seasonal plan is used.
    #[arg(long, value_name = "TIER=P1,P2", value_parser = parse_live)]
    pub live: Vec<(Tier, Vec<usize>)>,

    /// Channels to consider (comma separated). Defaults to all channels.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub channels: Vec<Channel>,

    /// Spend grid step.
    #[arg(long, default_value_t = DEFAULT_STEP)]
    pub step: f64,

    /// Maximum spend per curve (must be a multiple of the step).
    #[arg(long, default_value_t = DEFAULT_MAX_SPEND)]
    pub max_spend: f64,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options for `spend run`.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Total budget to allocate.
    #[arg(short = 'b', long, default_value_t = 300_000.0)]
    pub budget: f64,

    /// Scenario name stored in exports.
    #[arg(long, default_value = "Untitled scenario")]
    pub name: String,

    /// Total historical spend for the "previous" comparison column.
    #[arg(long, default_value_t = 1_000_000.0)]
    pub previous_budget: f64,

    /// Seed for the historical spend split.
    #[arg(long, default_value_t = 2026)]
    pub previous_seed: u64,

    /// Render ASCII tier bars in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Export the scenario (inputs + allocation) to JSON.
    #[arg(long = "export-scenario")]
    pub export_scenario: Option<PathBuf>,

    /// Export the allocation rows to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,

    /// Append this run to the scenario history.
    #[arg(long)]
    pub save: bool,

    /// Scenario history file.
    #[arg(long, env = "SPEND_HISTORY", default_value = DEFAULT_HISTORY_FILE)]
    pub history: PathBuf,
}

/// Options for `spend curves`.
#[derive(Debug, Args, Clone)]
pub struct CurvesArgs {
    /// Seed for curve parameter generation.
    #[arg(long, env = "SPEND_SEED", default_value_t = 1337)]
    pub seed: u64,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options for `spend sweep`.
#[derive(Debug, Args, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Budgets to allocate (comma separated).
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "100000,200000,300000,500000,750000,1000000"
    )]
    pub budgets: Vec<f64>,

    /// Render the budget-response curve.
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for `spend show`.
///
/// With no selector the last saved result is shown.
#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Scenario JSON produced by `spend run --export-scenario`.
    #[arg(long, value_name = "JSON", conflicts_with_all = ["last", "id"])]
    pub scenario: Option<PathBuf>,

    /// Show the last saved result.
    #[arg(long, conflicts_with = "id")]
    pub last: bool,

    /// Show the saved scenario with this id.
    #[arg(long)]
    pub id: Option<u64>,

    /// Scenario history file.
    #[arg(long, env = "SPEND_HISTORY", default_value = DEFAULT_HISTORY_FILE)]
    pub history: PathBuf,
}

/// Options for `spend history`.
#[derive(Debug, Args, Clone)]
pub struct HistoryArgs {
    /// Scenario history file.
    #[arg(long, env = "SPEND_HISTORY", default_value = DEFAULT_HISTORY_FILE)]
    pub history: PathBuf,

    /// Remove every saved scenario.
    #[arg(long)]
    pub clear: bool,
}

/// Parse `TIER=P1,P2,...` into a tier and 0-based period indices.
///
/// Periods on the command line are 1-based (`XXL=11,12` is Nov and Dec).
/// An empty list (`S=`) marks the tier as dark.
pub fn parse_live(s: &str) -> Result<(Tier, Vec<usize>), String> {
    let (tier, periods) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TIER=P1,P2,... but got '{s}'"))?;
    let tier: Tier = tier.trim().parse()?;

    let mut out = Vec::new();
    for raw in periods.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let p: usize = raw
            .parse()
            .map_err(|_| format!("invalid period '{raw}' for tier {tier}"))?;
        if p == 0 {
            return Err(format!("periods are 1-based; got 0 for tier {tier}"));
        }
        out.push(p - 1);
    }
    Ok((tier, out))
}
