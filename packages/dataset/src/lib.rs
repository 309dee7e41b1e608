#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Temporal fusion of crime incidents with hourly weather observations.
//!
//! The pipeline runs four stages over two in-memory tables:
//!
//! 1. [`load`] reads both CSV sources, drops unusable rows, and converts
//!    timestamps to epoch seconds.
//! 2. [`align`] truncates crimes that predate weather coverage and attaches
//!    the nearest-in-time observation to every remaining crime.
//! 3. [`features`] derives the weekday name and hour of each crime.
//! 4. [`persist`] writes the fused table atomically.
//!
//! Either the whole fused table is written or nothing is.

pub mod align;
pub mod config;
pub mod features;
pub mod load;
pub mod parsing;
pub mod paths;
pub mod persist;
pub mod progress;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crime_temp_dataset_models::{FusedIncident, FusionConfig, FusionSummary};
use strum_macros::Display;

use crate::progress::ProgressCallback;

/// Pipeline stage, used to locate failures in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    /// Reading the configuration file.
    Config,
    /// Reading and cleaning the crime source.
    LoadCrime,
    /// Reading and cleaning the weather source.
    LoadWeather,
    /// Truncation and nearest-observation lookup.
    Align,
    /// Writing the fused table.
    Persist,
}

/// Errors that can abort a fusion run.
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    /// A source could not be read or the destination could not be written.
    #[error("[{stage}] I/O error on {}: {source}", .path.display())]
    Io {
        /// Stage that was accessing the file.
        stage: Stage,
        /// File the operation was acting on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A source file is not well-formed CSV or failed mid-read.
    #[error("[{stage}] cannot read CSV {}: {source}", .path.display())]
    Csv {
        /// Stage that was reading the file.
        stage: Stage,
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// A configured column does not exist in the source header.
    #[error("[{stage}] column {column:?} not found in {}", .path.display())]
    MissingColumn {
        /// Stage that was reading the file.
        stage: Stage,
        /// The configured column name.
        column: String,
        /// File being read.
        path: PathBuf,
    },

    /// A retained record has a value that cannot be parsed.
    #[error("[{stage}] row {row}: cannot parse {column} value {value:?}: {reason}")]
    Parse {
        /// Stage that rejected the value.
        stage: Stage,
        /// 0-based data row position in the source file.
        row: u64,
        /// Column holding the value.
        column: String,
        /// The offending text.
        value: String,
        /// What was expected.
        reason: String,
    },

    /// No weather observation survived cleaning.
    #[error("[{}] no usable weather observations in {}", Stage::Align, .path.display())]
    NoWeatherData {
        /// The weather source file.
        path: PathBuf,
    },

    /// The configuration file could not be read or parsed.
    #[error("configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// The fused table held in memory, before or instead of being persisted.
#[derive(Debug, Clone)]
pub struct FusedTable {
    /// Header of the crime source, in source order.
    pub crime_headers: Vec<String>,
    /// Fused rows, ascending by epoch time.
    pub rows: Vec<FusedIncident>,
    /// Row counts gathered along the way. `output_path` is unset.
    pub summary: FusionSummary,
}

/// Runs load, align, and feature derivation without writing anything.
///
/// # Errors
///
/// Returns [`FusionError`] if either source is unreadable or malformed, a
/// retained record fails to parse, or no weather data survives cleaning.
pub fn fuse(
    config: &FusionConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<FusedTable, FusionError> {
    let start = Instant::now();

    progress.set_message(format!("Loading crimes from {}", config.crime.path.display()));
    let crimes = load::load_crimes(&config.crime)?;
    progress.inc(1);

    progress.set_message(format!(
        "Loading weather from {}",
        config.weather.path.display()
    ));
    let weather = load::load_weather(&config.weather)?;
    progress.inc(1);

    progress.set_message("Aligning crimes with weather".to_string());
    let alignment = align::align(crimes.incidents, weather.observations, &config.weather.path)?;
    progress.inc(1);

    let rows: Vec<FusedIncident> = alignment
        .incidents
        .into_iter()
        .map(features::derive)
        .collect();

    let summary = FusionSummary {
        crime_rows_read: crimes.rows_read,
        crime_rows_incomplete: crimes.rows_incomplete,
        crime_rows_truncated: alignment.truncated,
        weather_rows_read: weather.rows_read,
        weather_rows_dropped: weather.rows_dropped,
        rows_fused: rows.len() as u64,
        output_path: None,
        duration: start.elapsed(),
    };

    Ok(FusedTable {
        crime_headers: crimes.headers,
        rows,
        summary,
    })
}

/// Runs the full pipeline and writes the fused table to
/// `config.output.path`, replacing any previous file.
///
/// # Errors
///
/// Returns [`FusionError`] on any failure described for [`fuse`], or if the
/// destination cannot be written. The destination is left untouched on
/// failure.
pub fn prepare(
    config: &FusionConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<FusionSummary, FusionError> {
    let start = Instant::now();
    let progress = progress.unwrap_or_else(progress::null_progress);
    progress.set_total(4);

    log::info!(
        "Fusing {} with {}",
        config.crime.path.display(),
        config.weather.path.display()
    );

    let table = fuse(config, &progress)?;

    progress.set_message(format!("Writing {}", config.output.path.display()));
    persist::write_fused(
        &config.output.path,
        &table.crime_headers,
        &table.rows,
        config.output.emit_precipitation,
    )?;
    progress.inc(1);

    let summary = FusionSummary {
        output_path: Some(config.output.path.clone()),
        duration: start.elapsed(),
        ..table.summary
    };

    progress.finish(format!(
        "Fused {} incidents into {}",
        summary.rows_fused,
        config.output.path.display()
    ));
    log::info!(
        "Fusion complete: {} rows written in {:.1}s ({} incomplete, {} before weather coverage, {} weather rows without temperature)",
        summary.rows_fused,
        summary.duration.as_secs_f64(),
        summary.crime_rows_incomplete,
        summary.crime_rows_truncated,
        summary.weather_rows_dropped,
    );

    Ok(summary)
}
