//! `stroke-replay`: run a recorded sensor trace through a workout session.
//!
//! # Usage
//!
//! ```bash
//! stroke-replay session.trace
//! stroke-replay session.trace --config rowing.json --method gps --log-level debug
//! ```
//!
//! The workout summary is printed to stdout as JSON. Logs go to stderr.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{error, info};

use stroke_sensing::{
    parse_trace, replay, DetectionMethod, SessionConfig, StrokeError, StrokeResult,
    WorkoutSession, WorkoutSummary,
};

/// Command-line arguments for the replay binary.
#[derive(Parser, Debug)]
#[command(
    name = "stroke-replay",
    version,
    about = "Replay a recorded rowing trace and print the workout summary",
    long_about = None
)]
struct Args {
    /// Trace file with `motion,<ts>,<magnitude>` and `gps,<ts>,<lat>,<lng>` lines.
    #[arg(value_name = "TRACE")]
    trace: PathBuf,

    /// JSON session configuration. Defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the detection method (gps, motion, both).
    #[arg(short, long)]
    method: Option<DetectionMethod>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let log_level_filter = args
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(log_level_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("stroke-replay v{}", stroke_sensing::VERSION);

    let summary = match run(&args) {
        Ok(summary) => summary,
        Err(e) => {
            error!("Replay failed: {e}");
            std::process::exit(1);
        }
    };

    match summary.to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(e) => {
            error!("Failed to serialize summary: {e}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> StrokeResult<WorkoutSummary> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(method) = args.method {
        config.method = method;
    }

    let file = File::open(&args.trace).map_err(|source| StrokeError::FileAccess {
        path: args.trace.clone(),
        source,
    })?;
    let records = parse_trace(BufReader::new(file))?;
    info!(
        "Loaded {} records from {} (method: {})",
        records.len(),
        args.trace.display(),
        config.method
    );

    let mut session = WorkoutSession::try_new(config)?;
    Ok(replay(&mut session, &records))
}

fn load_config(path: Option<&Path>) -> StrokeResult<SessionConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            SessionConfig::from_json(path)
        }
        None => {
            info!("No configuration file provided, using defaults");
            Ok(SessionConfig::default())
        }
    }
}
