//! Headless driver for a gravity-field session.
//!
//! Runs a session for a fixed number of steps at a fixed delta and writes the
//! JSON run summary to stdout or a file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use gravity_field_core::{Session, SessionConfig};

#[derive(Parser)]
#[command(name = "gravity-field")]
#[command(version)]
#[command(about = "Potential-field gravity well simulation")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session and emit its summary as JSON
    Run {
        /// Session config (JSON); defaults to the built-in demonstration setup
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of simulation steps
        #[arg(long, default_value = "600")]
        steps: usize,

        /// Seconds per step (clamped to the session's max step)
        #[arg(long, default_value = "0.016666666666666666")]
        dt: f64,

        /// Record metrics every N steps
        #[arg(long, default_value = "60")]
        sample_every: usize,

        /// Write the summary here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the default session config as JSON
    DefaultConfig,
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = SessionConfig::from_json_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Commands::Run {
            config,
            steps,
            dt,
            sample_every,
            output,
        } => {
            let config = load_config(config.as_ref())?;
            let mut session = Session::try_new(config)?;
            let mass = session.mass_snapshot();
            info!(
                emitters = session.emitters().len(),
                creeps = session.creeps().len(),
                columns = session.field().columns(),
                rows = session.field().rows(),
                mass_available = mass.available,
                "session ready"
            );

            let summary = session.try_run(steps, dt, sample_every)?;
            let json = serde_json::to_string_pretty(&summary)?;
            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), samples = summary.samples.len(), "summary written");
                }
                None => println!("{json}"),
            }
        }
        Commands::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&SessionConfig::default())?);
        }
    }

    Ok(())
}
