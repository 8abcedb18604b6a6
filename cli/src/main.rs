//! Crash-and-Recovery Simulator CLI
//!
//! Replays a JSON scenario script against a fresh coordinator session and
//! prints the per-step reports as JSON.
//!
//! # Example
//!
//! ```bash
//! # Replay a script, pretty-printing the result
//! crash-recovery-sim demos/replica_outage.json --pretty
//!
//! # Only print the final summary, with debug logging for fault decisions
//! RUST_LOG=crash_recovery_core_rs=debug crash-recovery-sim script.json --summary-only
//! ```

use clap::Parser;
use crash_recovery_core_rs::scenario::{ScenarioOutcome, ScenarioRunner, ScenarioScript};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Crash-and-Recovery Simulator
///
/// Runs a scripted operator session: batches under a simulation case,
/// replica toggles and stash abandonment. Identical scripts produce
/// identical output.
#[derive(Parser, Debug)]
#[command(name = "crash-recovery-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the JSON scenario script
    scenario: PathBuf,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Print only the final summary and node state
    #[arg(long)]
    summary_only: bool,

    /// Exit with a failure status if any step was rejected
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,crash_recovery_core_rs=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let text = match std::fs::read_to_string(&args.scenario) {
        Ok(text) => text,
        Err(err) => {
            error!(path = %args.scenario.display(), error = %err, "cannot read scenario");
            return ExitCode::FAILURE;
        }
    };

    let script = match ScenarioScript::from_json(&text) {
        Ok(script) => script,
        Err(err) => {
            error!(path = %args.scenario.display(), error = %err, "cannot parse scenario");
            return ExitCode::FAILURE;
        }
    };

    info!(path = %args.scenario.display(), steps = script.steps.len(), "Starting replay");

    let mut runner = match ScenarioRunner::new(script) {
        Ok(runner) => runner,
        Err(err) => {
            error!(error = %err, "invalid coordinator configuration");
            return ExitCode::FAILURE;
        }
    };
    let outcome = runner.run();

    let rejected = outcome.steps.iter().filter(|s| s.report.is_error()).count();
    let printed = render(&outcome, args.summary_only).and_then(|output| {
        if args.pretty {
            serde_json::to_string_pretty(&output)
        } else {
            serde_json::to_string(&output)
        }
    });
    match printed {
        Ok(text) => println!("{}", text),
        Err(err) => {
            error!(error = %err, "cannot serialize result");
            return ExitCode::FAILURE;
        }
    }

    if args.strict && rejected > 0 {
        error!(rejected, "scenario had rejected steps");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn render(outcome: &ScenarioOutcome, summary_only: bool) -> Result<serde_json::Value, serde_json::Error> {
    if summary_only {
        Ok(json!({
            "summary": serde_json::to_value(outcome.summary)?,
            "final_state": serde_json::to_value(outcome.final_state)?,
            "still_stashed": outcome.still_stashed,
            "attempts": outcome.outcomes.len(),
        }))
    } else {
        serde_json::to_value(outcome)
    }
}
