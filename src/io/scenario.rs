//! Read/write scenario JSON files.
//!
//! A scenario is the portable record of one run:
//! - the inputs (plan, channels, budget, grid, seed)
//! - the allocation as an ordered list of `[curve_key, spend]` pairs
//! - the channel × tier spend matrix as ordered `[channel__TIER, spend]` pairs
//!
//! Pairs are written as arrays, never as JSON objects, so the order survives
//! any reader.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::pipeline::RunOutput;
use crate::domain::{Channel, CurveKey, PeriodKind, Plan, RunConfig, Tier};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub tool: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub seed: u64,
    pub period_kind: PeriodKind,
    pub budget: f64,
    pub step: f64,
    pub max_spend: f64,
    /// Live period indices per tier.
    pub plan: BTreeMap<Tier, Vec<usize>>,
    pub channels: Vec<Channel>,
    pub eligible_curves: usize,
    pub steps_requested: usize,
    pub steps_used: usize,
    pub total_spend: f64,
    pub total_uplift: f64,
    pub allocation: Vec<(CurveKey, f64)>,
    pub matrix: Vec<(String, f64)>,
}

impl Scenario {
    /// Snapshot a finished run.
    pub fn from_run(run: &RunOutput, config: &RunConfig, created_at: DateTime<Utc>) -> Self {
        let alloc = &run.allocation;
        Self {
            tool: "spend".to_string(),
            name: config.name.clone(),
            created_at,
            seed: config.seed,
            period_kind: config.period_kind,
            budget: config.budget,
            step: config.step,
            max_spend: config.max_spend,
            plan: Tier::ALL
                .into_iter()
                .map(|t| (t, config.plan.live_periods(t)))
                .collect(),
            channels: config.channels.iter().collect(),
            eligible_curves: alloc.eligible_curves,
            steps_requested: alloc.steps_requested,
            steps_used: alloc.steps_used,
            total_spend: alloc.total_spend,
            total_uplift: alloc.total_uplift,
            allocation: alloc.pairs(),
            matrix: run
                .matrix
                .iter()
                .map(|((c, t), v)| (format!("{}__{}", c.id(), t.display_name()), *v))
                .collect(),
        }
    }

    /// Rebuild the plan grid from the stored live periods.
    pub fn to_plan(&self) -> Plan {
        let mut plan = Plan::empty(self.period_kind.count());
        for (tier, periods) in &self.plan {
            for &p in periods {
                plan.set_live(*tier, p, true);
            }
        }
        plan
    }

    /// Parse the stored matrix back into `(channel, tier)` cells.
    pub fn matrix_cells(&self) -> Result<BTreeMap<(Channel, Tier), f64>, AppError> {
        self.matrix
            .iter()
            .map(|(cell, spend)| {
                let (channel, tier) = cell
                    .split_once("__")
                    .ok_or_else(|| AppError::new(2, format!("Malformed matrix cell '{cell}'.")))?;
                let channel: Channel = channel.parse().map_err(|e: String| AppError::new(2, e))?;
                let tier: Tier = tier.parse().map_err(|e: String| AppError::new(2, e))?;
                Ok(((channel, tier), *spend))
            })
            .collect()
    }
}

/// Write a scenario JSON file.
pub fn write_scenario_json(path: &Path, scenario: &Scenario) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create scenario JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, scenario)
        .map_err(|e| AppError::new(2, format!("Failed to write scenario JSON: {e}")))?;

    Ok(())
}

/// Read a scenario JSON file.
pub fn read_scenario_json(path: &Path) -> Result<Scenario, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open scenario JSON '{}': {e}", path.display())))?;
    let scenario: Scenario =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid scenario JSON: {e}")))?;
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_allocation;
    use crate::domain::ChannelSelection;

    fn config() -> RunConfig {
        RunConfig {
            name: "Christmas push".to_string(),
            seed: 1337,
            period_kind: PeriodKind::Month,
            plan: Plan::default_for(PeriodKind::Month),
            channels: [Channel::Crm, Channel::GoogleSearch, Channel::Youtube].into_iter().collect::<ChannelSelection>(),
            budget: 250_000.0,
            step: 10_000.0,
            max_spend: 100_000.0,
            previous_budget: 1_000_000.0,
            previous_seed: 2026,
            plot: false,
            plot_width: 40,
            export_scenario: None,
            export_csv: None,
            save_history: None,
        }
    }

    #[test]
    fn scenario_round_trips_through_json() {
        let config = config();
        let run = run_allocation(&config).unwrap();
        let created_at = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let scenario = Scenario::from_run(&run, &config, created_at);

        let path = std::env::temp_dir().join(format!("spend_scenario_{}.json", std::process::id()));
        write_scenario_json(&path, &scenario).unwrap();
        let loaded = read_scenario_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, scenario);
        assert_eq!(loaded.to_plan(), config.plan);
        assert_eq!(loaded.allocation, run.allocation.pairs());
        assert_eq!(loaded.total_spend, 250_000.0);
        assert_eq!(loaded.matrix_cells().unwrap(), run.matrix);
    }

    #[test]
    fn allocation_is_written_as_ordered_pairs() {
        let config = config();
        let run = run_allocation(&config).unwrap();
        let scenario = Scenario::from_run(&run, &config, Utc::now());
        let json = serde_json::to_value(&scenario).unwrap();

        let pairs = json["allocation"].as_array().unwrap();
        assert!(!pairs.is_empty());
        let first = pairs[0].as_array().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].as_str().unwrap(), scenario.allocation[0].0.to_string());
        assert_eq!(json["plan"]["XXL"], serde_json::json!([10, 11]));
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = read_scenario_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
