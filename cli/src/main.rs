//! Corridor CLI
//!
//! Runs the calculation engine against a rates snapshot from disk or against
//! the built-in demo snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use corridor_common::RatesSnapshot;
use corridor_engine::{CalculationOptions, Calculator, CalculatorInput, EngineConfig};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod report;
mod scenario;

use scenario::{demo_snapshot, Scenario};

/// Corridor calculation CLI
#[derive(Parser, Debug)]
#[command(name = "corridor")]
#[command(about = "Currency corridor conversion and fee calculator")]
struct Args {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate a request against a rates snapshot
    Calculate {
        /// Path to the request JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the rates snapshot JSON
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Solve for this output amount instead of using the request amount
        #[arg(long)]
        reverse: Option<Decimal>,

        /// Leave the step trace out of the result
        #[arg(long)]
        no_trace: bool,
    },

    /// Run a built-in scenario against the demo snapshot
    Demo {
        /// Scenario to run
        scenario: String,

        /// Print the full result as JSON instead of a step table
        #[arg(long)]
        json: bool,
    },

    /// List built-in scenarios
    Scenarios,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs);

    let config = EngineConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    let calculator = Calculator::new(config);

    match args.command {
        Command::Calculate {
            input,
            snapshot,
            reverse,
            no_trace,
        } => {
            let mut request: CalculatorInput = load_json(&input)?;
            let snapshot: RatesSnapshot = load_json(&snapshot)?;

            if let Some(target) = reverse {
                let params = request.params_mut();
                params.reverse_mode = true;
                params.target_amount = Some(target);
            }

            let options = CalculationOptions { trace: !no_trace };
            let result = calculator.calculate_with(&request, &snapshot, options)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Demo { scenario, json } => {
            let scenario = Scenario::load(&scenario)?;
            let snapshot = demo_snapshot().context("Failed to parse demo snapshot")?;

            info!("Running scenario: {}", scenario.name);

            let result = calculator.calculate(&scenario.input, &snapshot)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", scenario.description);
                println!();
                print!("{}", report::StepTable::new(&result));
            }
        }
        Command::Scenarios => {
            for name in Scenario::NAMES {
                let scenario = Scenario::load(name)?;
                println!("{:<16} {}", scenario.name, scenario.description);
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
