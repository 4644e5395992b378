//! SpeedLog CLI - network throughput sampler
//!
//! Samples the host's interface counters, buckets the measured speeds and
//! prints read-and-reset speed logs.

mod commands;
mod output;
mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// SpeedLog - Network Throughput Sampler
#[derive(Parser)]
#[command(name = "speedlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory for SpeedLog
    #[arg(long, env = "SPEEDLOG_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "human")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Human,
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sampler and print a speed log periodically
    Watch {
        /// Seconds between reports
        #[arg(short, long, default_value_t = 10)]
        report_every: u64,

        /// Stop after this many reports
        #[arg(short, long)]
        count: Option<u64>,
    },

    /// Measure throughput once
    Sample {
        /// Measurement window in seconds
        #[arg(short, long, default_value_t = 1)]
        seconds: u64,
    },

    /// Show the bucket a rate (bytes/ms) falls into
    Classify {
        /// Rate in bytes per millisecond
        rate: f64,
    },

    /// Show the bucket table
    Buckets,

    /// Invoke a bridge action after one sampling interval
    Invoke {
        /// Action name, e.g. fetchSpeedLog
        action: String,

        /// JSON arguments passed to the action
        #[arg(long, default_value = "null")]
        args: String,
    },

    /// Show/update settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key
        key: String,

        /// Config value
        value: String,
    },

    /// Show all config
    Show,

    /// Reset to defaults
    Reset,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Determine data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .map(|d| d.join("speedlog"))
            .unwrap_or_else(|| PathBuf::from(".speedlog"))
    });

    let storage = speedlog_core::Storage::new(data_dir).await?;

    // Execute command
    match cli.command {
        Commands::Watch {
            report_every,
            count,
        } => commands::watch(&storage, report_every, count, cli.output).await?,

        Commands::Sample { seconds } => commands::sample(&storage, seconds, cli.output).await?,

        Commands::Classify { rate } => commands::classify(rate, cli.output)?,

        Commands::Buckets => commands::show_buckets(cli.output)?,

        Commands::Invoke { action, args } => {
            commands::invoke(&storage, &action, &args, cli.output).await?
        }

        Commands::Config { action } => commands::config_action(&storage, action, cli.output).await?,

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            clap_complete::generate(shell, &mut Cli::command(), "speedlog", &mut std::io::stdout());
        }
    }

    Ok(())
}
