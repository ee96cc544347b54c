//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the allocation code stays clean and testable
//! - output changes are localized

use std::collections::BTreeMap;

use crate::app::pipeline::RunOutput;
use crate::domain::{Channel, CurveParams, PeriodKind, Plan, RunConfig, Tier};
use crate::io::History;
use crate::optimise::SweepPoint;
use crate::report::TierComparison;

/// Header block: inputs, eligibility and headline totals.
pub fn format_run_summary(run: &RunOutput, config: &RunConfig) -> String {
    let mut out = String::new();
    let alloc = &run.allocation;

    out.push_str("=== spend - greedy budget allocation ===\n");
    out.push_str(&format!("Scenario: {}\n", config.name));
    out.push_str(&format!(
        "Curves: seed={} | periods={} x {:?} | grid=0..{} step {}\n",
        config.seed,
        config.plan.period_count(),
        config.period_kind,
        fmt_money(run.curves.grid.max_spend()),
        fmt_money(run.curves.grid.step()),
    ));
    out.push_str(&format!(
        "Plan: {} live cells | {} channels | {} eligible curves\n",
        config.plan.live_count(),
        config.channels.len(),
        alloc.eligible_curves,
    ));
    out.push_str(&format!(
        "Budget: {} | spent {} | uplift {:.1} | CPA {}\n",
        fmt_money(config.budget),
        fmt_money(alloc.total_spend),
        alloc.total_uplift,
        fmt_opt_money(crate::report::cost_per_acquisition(alloc.total_spend, alloc.total_uplift)),
    ));
    out.push_str(&format!(
        "Steps: {} of {} used",
        alloc.steps_used, alloc.steps_requested
    ));
    if alloc.terminated_early() {
        out.push_str(" (stopped early: every eligible curve saturated or capped)");
    }
    out.push('\n');

    out
}

/// Optimised / previous / difference per tier for spend, uplift and CPA.
pub fn format_tier_comparison(rows: &[TierComparison]) -> String {
    let mut out = String::new();
    out.push_str("By tier (optimised vs previous):\n");
    out.push_str(
        format!(
            "{:<5} {:>12} {:>12} {:>12} {:>10} {:>10} {:>10} {:>9} {:>9} {:>9}",
            "tier", "spend", "prev", "diff", "uplift", "prev", "diff", "cpa", "prev", "diff"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!("{:-<5} {:-<38} {:-<32} {:-<29}\n", "", "", "", ""));

    for r in rows {
        out.push_str(
            format!(
                "{:<5} {:>12} {:>12} {:>12} {:>10.1} {:>10.1} {:>10.1} {:>9} {:>9} {:>9}",
                r.tier.display_name(),
                fmt_money(r.optimised.spend),
                fmt_money(r.previous.spend),
                fmt_money(r.spend_diff()),
                r.optimised.uplift,
                r.previous.uplift,
                r.uplift_diff(),
                fmt_opt_money(r.optimised.cost_per_acquisition()),
                fmt_opt_money(r.previous.cost_per_acquisition()),
                fmt_opt_money(r.cpa_diff()),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Channel rows × tier columns of optimised spend.
pub fn format_matrix(matrix: &BTreeMap<(Channel, Tier), f64>) -> String {
    let mut out = String::new();
    out.push_str("Spend by channel and tier:\n");

    let mut header = format!("{:<16}", "channel");
    for t in Tier::ALL {
        header.push_str(&format!(" {:>10}", t.display_name()));
    }
    header.push_str(&format!(" {:>11}", "total"));
    out.push_str(&header);
    out.push('\n');

    for c in Channel::ALL {
        let mut line = format!("{:<16}", truncate(c.label(), 16));
        let mut row_total = 0.0;
        for t in Tier::ALL {
            let v = matrix.get(&(c, t)).copied().unwrap_or(0.0);
            row_total += v;
            line.push_str(&format!(" {:>10}", fmt_money(v)));
        }
        line.push_str(&format!(" {:>11}", fmt_money(row_total)));
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// Generated parameters, one row per `(tier, channel)`.
pub fn format_curve_params(params: &[CurveParams], seed: u64) -> String {
    let mut out = String::new();
    out.push_str(&format!("Curve parameters (seed={seed}):\n"));
    out.push_str(&format!(
        "{:<5} {:<16} {:>10} {:>12} {:>8} {:>10}\n",
        "tier", "channel", "coef", "saturation", "weight", "ceiling"
    ));
    for p in params {
        out.push_str(&format!(
            "{:<5} {:<16} {:>10.3} {:>12.1} {:>8.3} {:>10.2}\n",
            p.tier.display_name(),
            truncate(p.channel.label(), 16),
            p.coefficient,
            p.saturation_scale,
            p.tier_weight,
            p.coefficient * p.tier_weight,
        ));
    }
    out
}

/// Budget-response table.
pub fn format_sweep(points: &[SweepPoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>14} {:>14} {:>12} {:>8} {:>10}\n",
        "budget", "spent", "uplift", "steps", "cpa"
    ));
    for p in points {
        out.push_str(&format!(
            "{:>14} {:>14} {:>12.1} {:>8} {:>10}\n",
            fmt_money(p.budget),
            fmt_money(p.total_spend),
            p.total_uplift,
            p.steps_used,
            fmt_opt_money(crate::report::cost_per_acquisition(p.total_spend, p.total_uplift)),
        ));
    }
    out
}

/// Live periods per tier, one line each.
pub fn format_plan(plan: &Plan, period_kind: PeriodKind) -> String {
    let mut out = String::new();
    out.push_str("Live periods:\n");
    for t in Tier::ALL {
        let live = plan.live_periods(t);
        let labels = if live.is_empty() {
            "-".to_string()
        } else {
            live.iter()
                .map(|&p| period_kind.label(p))
                .collect::<Vec<_>>()
                .join(" ")
        };
        out.push_str(&format!("{:<5} {labels}\n", t.display_name()));
    }
    out
}

/// Saved scenarios, newest first. The last result is marked with `*`.
pub fn format_history(history: &History) -> String {
    if history.is_empty() {
        return "No saved scenarios.\n".to_string();
    }
    let last = history.last().map(|s| s.id);
    let mut out = String::new();
    out.push_str(&format!(
        "  {:>4} {:<20} {:<24} {:>12} {:>12} {:>10}\n",
        "id", "saved", "name", "budget", "spent", "uplift"
    ));
    for saved in &history.scenarios {
        let s = &saved.scenario;
        let marker = if Some(saved.id) == last { '*' } else { ' ' };
        out.push_str(&format!(
            "{marker} {:>4} {:<20} {:<24} {:>12} {:>12} {:>10.1}\n",
            saved.id,
            s.created_at.format("%Y-%m-%d %H:%M:%S"),
            truncate(&s.name, 24),
            fmt_money(s.budget),
            fmt_money(s.total_spend),
            s.total_uplift,
        ));
    }
    out
}

/// Whole-unit amount with thousands separators (`-12,345`).
pub fn fmt_money(v: f64) -> String {
    if !v.is_finite() {
        return "-".to_string();
    }
    let rounded = v.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn fmt_opt_money(v: Option<f64>) -> String {
    v.map(fmt_money).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
