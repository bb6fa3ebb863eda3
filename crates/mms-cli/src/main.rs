//! `mms` – headless micromouse simulator.
//!
//! 1. Loads `~/.mms/config.toml` (or `--config`), applying `MMS_*`
//!    overrides.
//! 2. Builds a perimeter-walled maze and a simulated mouse.
//! 3. Runs the built-in algorithm for the configured interface: a
//!    left-wall follower in discrete mode, a sensor-driven cruiser in
//!    continuous mode.
//! 4. Reports bus alerts live and prints a run summary.
//!
//! Ctrl-C raises the quit flag; motion loops stop at their next tick.

mod algorithm;
mod config;
mod harness;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, warn};

use mms_kernel::SimState;
use mms_middleware::{EventBus, Topic};
use mms_types::{Event, EventPayload, MmsError};

use crate::algorithm::RunSummary;
use crate::harness::Simulation;

#[derive(Parser)]
#[command(name = "mms", version, about = "Headless micromouse simulator")]
struct Cli {
    /// Config file (defaults to ~/.mms/config.toml)
    #[arg(long, env = "MMS_CONFIG")]
    config: Option<PathBuf>,

    /// Write the effective configuration to the config path and exit
    #[arg(long)]
    write_config: bool,

    /// Print the run report as JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Summary plus what the bus saw during the run.
#[derive(Debug, Serialize)]
struct Report {
    #[serde(flatten)]
    summary: RunSummary,
    elapsed_s: f64,
    alerts: usize,
    pose_updates: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // The span exporter must be up before any Tokio runtime exists.
    let _telemetry = mms_runtime::init_tracing("mms");

    let path = cli.config.clone().unwrap_or_else(config::config_path);
    let cfg = match config::load_or_default(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    if cli.write_config {
        return match config::save_to(&cfg, &path) {
            Ok(()) => {
                println!("  {} Config saved to {}", "✓".green().bold(), path.display().to_string().bold());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {}", "Error saving config".red(), e);
                ExitCode::FAILURE
            }
        };
    }

    if !cli.json {
        print_banner();
    }

    let state = Arc::new(SimState::new(cfg.sim.sim_speed));
    let bus = EventBus::default();
    install_ctrlc_handler(state.clone(), bus.clone());

    let sim = match Simulation::build(&cfg, state, &bus) {
        Ok(sim) => sim,
        Err(e) => {
            error!(%e, "cannot set up simulation");
            eprintln!("{}: {}", "Setup error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Runtime error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(supervise(sim, &bus, cli.json)) {
        Ok(report) => {
            print_report(&report, cli.json);
            if report.summary.crashed {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("{}: {}", "Run failed".red(), e);
            ExitCode::FAILURE
        }
    }
}

/// Run the simulation on a blocking thread while reporting bus traffic.
async fn supervise(mut sim: Simulation, bus: &EventBus, quiet: bool) -> Result<Report, MmsError> {
    let mut alerts = bus.subscribe_to(Topic::SystemAlerts);
    let mut telemetry = bus.subscribe_to(Topic::Telemetry);
    let (mut alert_count, mut pose_updates) = (0, 0);

    let run = tokio::task::spawn_blocking(move || {
        let summary = sim.run();
        (summary, sim.elapsed())
    });
    tokio::pin!(run);

    let joined = loop {
        tokio::select! {
            joined = &mut run => break joined,
            event = alerts.recv() => match event {
                Ok(event) => {
                    alert_count += 1;
                    if !quiet {
                        print_alert(&event);
                    }
                }
                Err(RecvError::Lagged(n)) => warn!(lagged_by = n, "alert listener lagged"),
                Err(RecvError::Closed) => break (&mut run).await,
            },
            event = telemetry.recv() => match event {
                Ok(_) => pose_updates += 1,
                Err(RecvError::Lagged(n)) => pose_updates += n as usize,
                Err(RecvError::Closed) => break (&mut run).await,
            },
        }
    };

    let (summary, elapsed) =
        joined.map_err(|e| MmsError::Channel(format!("simulation thread failed: {e}")))?;
    // Alerts published in the last moments of the run.
    for event in alerts.drain() {
        alert_count += 1;
        if !quiet {
            print_alert(&event);
        }
    }
    pose_updates += telemetry.drain().len();

    Ok(Report {
        summary: summary?,
        elapsed_s: elapsed.as_secs_f64(),
        alerts: alert_count,
        pose_updates,
    })
}

fn install_ctrlc_handler(state: Arc<SimState>, bus: EventBus) {
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the run …".yellow().bold());
        state.request_quit();
        let _ = bus.publish_to(
            Topic::SystemAlerts,
            Event::new(
                "mms-cli",
                EventPayload::QuitRequested {
                    reason: "operator Ctrl-C".to_string(),
                },
            ),
        );
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the run can only end on its own");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   __ _  __ _  ___"#.bold().cyan());
    println!("{}", r#"  /  ' \/  ' \(_-<"#.bold().cyan());
    println!("{}", r#" /_/_/_/_/_/_/___/"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "mms".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Micromouse simulator");
    println!();
}

fn print_alert(event: &Event) {
    let text = match &event.payload {
        EventPayload::Crashed { cell, direction } => {
            format!("crashed into the {direction} wall of {cell}")
        }
        EventPayload::ModeViolation {
            operation,
            required,
        } => format!("{operation}() needs the {required} interface, stopping"),
        EventPayload::QuitRequested { reason } => format!("quit requested: {reason}"),
        other => format!("{other:?}"),
    };
    println!("  {} {}", "!".red().bold(), text.yellow());
}

fn print_report(report: &Report, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("{}: {}", "Cannot encode report".red(), e),
        }
        return;
    }

    let s = &report.summary;
    let status = if s.crashed {
        "crashed".red().bold()
    } else if s.interrupted {
        "interrupted".yellow().bold()
    } else {
        "completed".green().bold()
    };
    println!();
    println!("  Run {status}");
    println!("    interface     : {}", s.interface.to_string().bold());
    println!("    steps         : {}", s.steps);
    println!("    cells visited : {}", s.cells_visited);
    println!("    final pose    : {} facing {}", s.final_cell, s.final_direction);
    println!("    elapsed       : {:.3} s", report.elapsed_s);
    println!("    alerts        : {}", report.alerts);
    println!("    pose updates  : {}", report.pose_updates);
    println!();
}
