//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs the tracing subscriber
//! - runs the allocation pipeline
//! - prints reports/plots
//! - writes optional exports

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, CurvesArgs, HistoryArgs, PlanArgs, RunArgs, ShowArgs, SweepArgs};
use crate::domain::{ChannelSelection, Plan, RunConfig};
use crate::error::AppError;
use crate::io::{
    Scenario, append_to_history, load_history, read_scenario_json, save_history, write_allocation_csv,
    write_scenario_json,
};

pub mod pipeline;

/// Entry point for the `spend` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may carry SPEND_SEED / RUST_LOG; a missing file is fine.
    dotenvy::dotenv().ok();

    // `spend` and `spend --budget 5e5` behave like `spend run ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => {
            init_tracing(args.plan.verbose);
            handle_run(args)
        }
        Command::Curves(args) => {
            init_tracing(args.verbose);
            handle_curves(args)
        }
        Command::Sweep(args) => {
            init_tracing(args.plan.verbose);
            handle_sweep(args)
        }
        Command::Show(args) => {
            init_tracing(false);
            handle_show(args)
        }
        Command::History(args) => {
            init_tracing(false);
            handle_history(args)
        }
    }
}

/// Log to stderr so stdout stays clean for reports.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let run = pipeline::run_allocation(&config)?;

    println!("{}", crate::report::format_run_summary(&run, &config));
    println!("{}", crate::report::format_tier_comparison(&run.comparison));
    println!("{}", crate::report::format_matrix(&run.matrix));

    if config.plot {
        println!("{}", crate::plot::render_tier_bars(&run.comparison, config.plot_width));
    }

    if config.export_scenario.is_some() || config.save_history.is_some() {
        let scenario = Scenario::from_run(&run, &config, Utc::now());
        if let Some(path) = &config.export_scenario {
            write_scenario_json(path, &scenario)?;
            tracing::info!(path = %path.display(), "scenario written");
        }
        if let Some(path) = &config.save_history {
            let id = append_to_history(path, scenario)?;
            println!("Saved as scenario #{id} in {}", path.display());
        }
    }
    if let Some(path) = &config.export_csv {
        write_allocation_csv(path, &run.allocation, config.period_kind)?;
        tracing::info!(path = %path.display(), "allocation CSV written");
    }

    Ok(())
}

fn handle_curves(args: CurvesArgs) -> Result<(), AppError> {
    let params = crate::curves::generate_curve_params(args.seed)?;
    println!("{}", crate::report::format_curve_params(&params, args.seed));
    Ok(())
}

fn handle_sweep(args: SweepArgs) -> Result<(), AppError> {
    let mut config = base_config(&args.plan)?;
    config.plot = args.plot && !args.no_plot;
    let points = pipeline::run_sweep(&config, &args.budgets)?;

    println!("{}", crate::report::format_sweep(&points));
    if config.plot {
        println!("{}", crate::plot::render_budget_curve(&points, args.width, args.height));
    }
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    if let Some(path) = &args.scenario {
        let scenario = read_scenario_json(path)?;
        print_scenario(&scenario)?;
        return Ok(());
    }

    let history = load_history(&args.history)?;
    let saved = match args.id {
        Some(id) => history
            .get(id)
            .ok_or_else(|| AppError::new(2, format!("No saved scenario with id {id}.")))?,
        None => history.last().ok_or_else(|| {
            AppError::new(
                2,
                format!("No saved scenarios in '{}'. Use `spend run --save` first.", args.history.display()),
            )
        })?,
    };
    println!("#{}", saved.id);
    print_scenario(&saved.scenario)
}

fn handle_history(args: HistoryArgs) -> Result<(), AppError> {
    let mut history = load_history(&args.history)?;
    if args.clear {
        let removed = history.len();
        history.clear();
        save_history(&args.history, &history)?;
        println!("Removed {removed} saved scenarios.");
        return Ok(());
    }
    print!("{}", crate::report::format_history(&history));
    Ok(())
}

fn print_scenario(scenario: &Scenario) -> Result<(), AppError> {
    println!("Scenario: {} (saved {})", scenario.name, scenario.created_at.to_rfc3339());
    println!(
        "seed={} | periods={:?} | budget {} | step {} | max {}",
        scenario.seed,
        scenario.period_kind,
        crate::report::fmt_money(scenario.budget),
        crate::report::fmt_money(scenario.step),
        crate::report::fmt_money(scenario.max_spend),
    );
    println!(
        "Spent {} for uplift {:.1} | {} of {} steps over {} eligible curves",
        crate::report::fmt_money(scenario.total_spend),
        scenario.total_uplift,
        scenario.steps_used,
        scenario.steps_requested,
        scenario.eligible_curves,
    );
    println!();
    println!("{}", crate::report::format_plan(&scenario.to_plan(), scenario.period_kind));
    for (key, spend) in &scenario.allocation {
        println!(
            "{:<28} {:>5} {:>12}",
            key.to_string(),
            scenario.period_kind.label(key.period),
            crate::report::fmt_money(*spend)
        );
    }
    println!();
    println!("{}", crate::report::format_matrix(&scenario.matrix_cells()?));
    Ok(())
}

/// Build the plan and channel selection shared by `run` and `sweep`.
fn base_config(args: &PlanArgs) -> Result<RunConfig, AppError> {
    Ok(RunConfig {
        name: String::new(),
        seed: args.seed,
        period_kind: args.periods,
        plan: plan_from_args(args)?,
        channels: if args.channels.is_empty() {
            ChannelSelection::all()
        } else {
            args.channels.iter().copied().collect()
        },
        budget: 0.0,
        step: args.step,
        max_spend: args.max_spend,
        previous_budget: crate::optimise::DEFAULT_PREVIOUS_BUDGET,
        previous_seed: crate::optimise::DEFAULT_PREVIOUS_SEED,
        plot: false,
        plot_width: 0,
        export_scenario: None,
        export_csv: None,
        save_history: None,
    })
}

/// No `--live` flags means the default seasonal plan. Otherwise only the
/// listed tier/period cells are live.
fn plan_from_args(args: &PlanArgs) -> Result<Plan, AppError> {
    if args.live.is_empty() {
        return Ok(Plan::default_for(args.periods));
    }

    let count = args.periods.count();
    let mut plan = Plan::empty(count);
    for (tier, periods) in &args.live {
        for &p in periods {
            if p >= count {
                return Err(AppError::new(
                    2,
                    format!("Period {} for tier {tier} is outside 1..={count}.", p + 1),
                ));
            }
            plan.set_live(*tier, p, true);
        }
    }
    Ok(plan)
}

pub fn run_config_from_args(args: &RunArgs) -> Result<RunConfig, AppError> {
    let base = base_config(&args.plan)?;
    Ok(RunConfig {
        name: args.name.clone(),
        budget: args.budget,
        previous_budget: args.previous_budget,
        previous_seed: args.previous_seed,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        export_scenario: args.export_scenario.clone(),
        export_csv: args.export_csv.clone(),
        save_history: args.save.then(|| args.history.clone()),
        ..base
    })
}

/// Rewrite argv so `spend` defaults to `spend run`.
///
/// Rules:
/// - `spend`                      -> `spend run`
/// - `spend --budget 5e5 ...`     -> `spend run --budget 5e5 ...`
/// - `spend --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "curves" | "sweep" | "show" | "history");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "run flags".
    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
