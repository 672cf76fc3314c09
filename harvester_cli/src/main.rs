use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use harvester_cli::config::{ConfigManager, to_toml};
use harvester_cli::output::{OutputFormat, render_summary};
use harvester_core::{JobConfig, StopSignal};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "harvester")]
#[command(author, version, about = "Harvester - Managed file transfer pipelines", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Log every transfer step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured transfer job
    Run {
        /// Configuration file (defaults to the XDG config path)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,

        /// Override the interval between cycles, in seconds
        #[arg(short, long, value_name = "SECS")]
        interval: Option<u64>,

        /// Output format for the cycle summary
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Validate the configuration and print the assembled chain
    Check {
        /// Configuration file (defaults to the XDG config path)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Also print the resolved configuration as TOML
        #[arg(long)]
        show: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on debug flag
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Warn)
            .filter_module("harvester_core", log::LevelFilter::Debug)
            .filter_module("harvester_cli", log::LevelFilter::Debug)
            .filter_module("harvester", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match cli.command {
        Commands::Run {
            config,
            once,
            interval,
            format,
        } => run_command(config, once, interval, format).await?,
        Commands::Check { config, show } => check_command(config, show)?,
        Commands::Completions { shell } => generate_completions(shell),
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<JobConfig> {
    let manager = path.map(ConfigManager::with_path).unwrap_or_default();
    log::debug!("Loading configuration from {}", manager.config_path().display());
    manager.load()
}

async fn run_command(
    config_path: Option<PathBuf>,
    once: bool,
    interval: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(seconds) = interval {
        config.job.interval_seconds = seconds;
    }

    let mut job = config.build().context("Invalid job configuration")?;
    log::info!("Running {}", job.describe());

    if once {
        let summary = tokio::task::spawn_blocking(move || job.run_once())
            .await
            .context("Transfer job panicked")?
            .context("Transfer cycle failed")?;

        let rendered = render_summary(&summary, format)?;
        match format {
            OutputFormat::Json => println!("{rendered}"),
            OutputFormat::Text => eprintln!("{rendered}"),
        }

        if !summary.failed.is_empty() {
            anyhow::bail!("{} item(s) failed", summary.failed.len());
        }
        return Ok(());
    }

    let stop = StopSignal::new();
    let stopper = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Stopping after the current item...".yellow());
            stopper.stop();
        }
    });

    let interval = Duration::from_secs(config.job.interval_seconds);
    tokio::task::spawn_blocking(move || job.run_until(interval, &stop))
        .await
        .context("Transfer job panicked")??;

    eprintln!("{}", "Stopped".green());
    Ok(())
}

fn check_command(config_path: Option<PathBuf>, show: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let job = config.build().context("Invalid job configuration")?;

    println!("{} {}", "Chain:".bold(), job.describe());
    println!(
        "{} every {}s, {} audit, {} byte chunks",
        "Schedule:".bold(),
        config.job.interval_seconds,
        config.job.hash_algorithm,
        config.job.chunk_size
    );
    if show {
        println!();
        print!("{}", to_toml(&config)?);
    }
    println!("{}", "Configuration OK".green());
    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
