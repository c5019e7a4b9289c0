use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{debug, info};

use coral_bleach::pipeline::{self, View};
use coral_bleach::Config;

/// Render coral bleaching charts from the observation CSV.
#[derive(Parser, Debug)]
#[command(name = "coral-bleach", version)]
struct Cli {
    /// Which chart to produce
    #[arg(value_enum, default_value_t = Target::All)]
    view: Target,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Observation CSV (overrides the config file)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Output directory for the HTML charts (overrides the config file)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Target {
    Correlation,
    FreqSeverity,
    Map,
    All,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();
    debug!("coral-bleach started with verbosity level: {}", cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(out) = cli.out {
        config.output_dir = out;
    }

    let written = match cli.view {
        Target::Correlation => vec![pipeline::run(View::Correlation, &config)?],
        Target::FreqSeverity => vec![pipeline::run(View::FrequencySeverity, &config)?],
        Target::Map => vec![pipeline::run(View::Map, &config)?],
        Target::All => pipeline::run_all(&config)?,
    }
    .into_iter()
    .map(|p| p.display().to_string())
    .collect::<Vec<_>>();

    info!("wrote {} chart(s): {}", written.len(), written.join(", "));
    Ok(())
}
