#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for fusing crime incidents with hourly weather.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use crime_temp_cli_utils::IndicatifProgress;
use crime_temp_dataset::config;
use crime_temp_dataset_models::{FusionConfig, FusionSummary};

#[derive(Parser)]
#[command(
    name = "crime_temp_cli",
    about = "Fuse crime incidents with the nearest hourly weather observation"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    #[command(flatten)]
    paths: PathArgs,
}

#[derive(Args)]
struct PathArgs {
    /// Configuration TOML (falls back to `CRIME_TEMP_CONFIG`, then the
    /// built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Crime CSV, overriding `crime.path`
    #[arg(long, global = true)]
    crime: Option<PathBuf>,
    /// Weather CSV, overriding `weather.path`
    #[arg(long, global = true)]
    weather: Option<PathBuf>,
    /// Fused output CSV, overriding `output.path`
    #[arg(long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the fused dataset and write it (the default)
    Prepare,
    /// Load and align both sources without writing anything
    Check,
    /// Print the effective configuration as TOML
    Config,
}

fn resolve_config(paths: PathArgs) -> Result<FusionConfig, Box<dyn std::error::Error>> {
    let mut config = config::load_config(paths.config.as_deref())?;
    if let Some(crime) = paths.crime {
        config.crime.path = crime;
    }
    if let Some(weather) = paths.weather {
        config.weather.path = weather;
    }
    if let Some(output) = paths.output {
        config.output.path = output;
    }
    Ok(config)
}

fn print_summary(summary: &FusionSummary) {
    println!("{:<32} {}", "Crime rows read", summary.crime_rows_read);
    println!(
        "{:<32} {}",
        "  dropped (missing values)", summary.crime_rows_incomplete
    );
    println!(
        "{:<32} {}",
        "  dropped (before weather)", summary.crime_rows_truncated
    );
    println!("{:<32} {}", "Weather rows read", summary.weather_rows_read);
    println!(
        "{:<32} {}",
        "  dropped (no temperature)", summary.weather_rows_dropped
    );
    println!("{:<32} {}", "Fused rows", summary.rows_fused);
    if let Some(path) = &summary.output_path {
        println!("{:<32} {}", "Output", path.display());
    }
    println!(
        "{:<32} {:.1}s",
        "Elapsed",
        summary.duration.as_secs_f64()
    );
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let multi = crime_temp_cli_utils::init_logger();
    let config = resolve_config(cli.paths)?;

    match cli.command.unwrap_or(Commands::Prepare) {
        Commands::Prepare => {
            let progress = IndicatifProgress::stages_bar(&multi, "Preparing fused dataset");
            let summary = crime_temp_dataset::prepare(&config, Some(progress))?;
            print_summary(&summary);
        }
        Commands::Check => {
            let progress = IndicatifProgress::stages_bar(&multi, "Checking sources");
            progress.set_total(3);
            let table = crime_temp_dataset::fuse(&config, &progress)?;
            progress.finish_and_clear();
            print_summary(&table.summary);
        }
        Commands::Config => {
            print!("{}", config::to_toml(&config)?);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
