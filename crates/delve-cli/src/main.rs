//! delve-sim: scenario runner for delve agents.
//!
//! - `delve-sim run <scenario.yaml>` - tick every agent towards its goal and report
//! - `delve-sim check <scenario.yaml>` - validate a scenario without running it

mod run;
mod scenario;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use crate::run::{run, AgentOutcome, RunOptions, RunReport};
use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "delve-sim")]
#[command(about = "Run delve navigation scenarios", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario to completion or the tick limit
    Run {
        scenario: PathBuf,

        /// Override the scenario's tick limit
        #[arg(long)]
        ticks: Option<u64>,

        /// Answer plan requests on worker threads
        #[arg(long)]
        threaded: bool,

        /// Worker threads for --threaded
        #[arg(long, default_value_t = 2)]
        workers: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a scenario without running it
    Check { scenario: PathBuf },
}

fn init_logging(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Run {
            scenario,
            ticks,
            threaded,
            workers,
            json,
        } => {
            let scenario = Scenario::load(&scenario)?;
            let options = RunOptions {
                ticks,
                threaded,
                workers,
            };
            let report = run(&scenario, &options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            if !report.all_arrived() {
                bail!("{}", report.summary());
            }
            Ok(())
        }
        Commands::Check { scenario: path } => {
            let scenario = Scenario::load(&path)?;
            let grid = scenario.validate()?;
            let bounds = grid.bounds();
            println!(
                "{}: ok ({} agents, world {} to {})",
                scenario.name,
                scenario.agents.len(),
                bounds.min,
                bounds.max
            );
            Ok(())
        }
    }
}

fn print_report(report: &RunReport) {
    println!("Scenario {} (run {})", report.scenario, report.run_id);
    println!("Started {}", report.started_at.to_rfc3339());
    println!();
    for agent in &report.agents {
        let outcome = match agent.outcome {
            AgentOutcome::Arrived => "arrived",
            AgentOutcome::Failed => "failed",
            AgentOutcome::Unfinished => "unfinished",
        };
        let cell = agent
            .final_cell
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  agent {:>3}  {:<10}  ticks {:>5}  at {}  steps {}  requests {}  replans {}{}",
            agent.agent,
            outcome,
            agent.ticks,
            cell,
            agent.steps,
            agent.plan_requests,
            agent.replans,
            if agent.no_path { "  (no path)" } else { "" }
        );
    }
    println!();
    println!("{}", report.summary());
}
