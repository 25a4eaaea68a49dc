//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::LidarModel;
use std::path::PathBuf;

/// lidar-sim - simulated lidar ray synthesis and capture scheduling
#[derive(Parser, Debug)]
#[command(
    name = "lidar-sim",
    author,
    version,
    about = "Simulated lidar capture pipeline",
    long_about = "Generates per-revolution ray geometry for built-in lidar models and \n\
                  drives batched captures against a graph execution backend.\n\n\
                  The bundled backend is an in-process mock; results are synthetic."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LIDAR_SIM_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LIDAR_SIM_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario against the mock backend
    Run(RunArgs),

    /// Validate a scenario file without running
    Validate(ValidateArgs),

    /// Describe a scenario, or the built-in model catalog
    Info(InfoArgs),

    /// Generate the rays of one revolution and summarize them
    Rays(RaysArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to scenario file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "scenario.toml",
        env = "LIDAR_SIM_CONFIG"
    )]
    pub config: PathBuf,

    /// Number of scheduler ticks to run (0 = until Ctrl+C)
    #[arg(long, default_value = "0", env = "LIDAR_SIM_MAX_TICKS")]
    pub max_ticks: u64,

    /// Override the scenario's tick rate (Hz)
    #[arg(long, env = "LIDAR_SIM_TICK_HZ")]
    pub tick_hz: Option<f64>,

    /// Validate the scenario and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "LIDAR_SIM_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to scenario file to validate
    #[arg(short, long, default_value = "scenario.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Scenario file; the model catalog is listed when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `rays` command
#[derive(Parser, Debug)]
pub struct RaysArgs {
    /// Built-in model, e.g. velodyne_vlp16
    #[arg(short, long)]
    pub model: LidarModel,

    /// Override the horizontal resolution (degrees)
    #[arg(long)]
    pub resolution: Option<f64>,

    /// Override the minimum horizontal angle (degrees)
    #[arg(long, allow_hyphen_values = true)]
    pub min_angle: Option<f64>,

    /// Override the maximum horizontal angle (degrees)
    #[arg(long, allow_hyphen_values = true)]
    pub max_angle: Option<f64>,

    /// Number of leading rays to list
    #[arg(long, default_value = "0")]
    pub show: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
