#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Row, configuration, and run summary types for the crime/weather fusion
//! pipeline.
//!
//! The loader produces [`WeatherObservation`] and [`CrimeIncident`] rows, the
//! aligner and feature deriver turn crimes into [`FusedIncident`] rows, and
//! the persister writes those out. [`FusionConfig`] describes where the
//! inputs live and which columns hold which values.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Header of the epoch-seconds column in the fused output.
pub const EPOCH_TIME_COL: &str = "EpochTime";
/// Header of the weekday-name column in the fused output.
pub const DAY_COL: &str = "Day";
/// Header of the zero-padded hour column in the fused output.
pub const HOUR_COL: &str = "Hour";
/// Header of the imputed temperature column in the fused output.
pub const TEMP_COL: &str = "Temp";
/// Header of the optional precipitation column in the fused output.
pub const PRECIP_COL: &str = "Precip";
/// Header of the column holding each row's position in the crime source.
pub const SOURCE_INDEX_COL: &str = "index";

/// One cleaned hourly weather reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherObservation {
    /// 0-based data row position in the weather source file.
    pub source_index: u64,
    /// Observation time in epoch seconds.
    pub epoch_time: i64,
    /// Dry-bulb temperature in degrees Celsius. Always finite.
    pub temperature_c: f64,
    /// Hourly precipitation. Trace amounts are recorded as `0.0`; `None`
    /// when the source value was missing or not numeric.
    pub precipitation: Option<f64>,
}

/// One crime record that survived the load-time null check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeIncident {
    /// 0-based data row position in the crime source file.
    pub source_index: u64,
    /// Every column of the source row, verbatim and in header order.
    pub fields: Vec<String>,
    /// The unparsed timestamp text.
    pub raw_timestamp: String,
    /// Occurrence time in epoch seconds.
    pub epoch_time: i64,
    /// Crime type label (e.g. `"THEFT"`).
    pub primary_type: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Community area number, when present and numeric.
    pub community_area: Option<f64>,
}

/// A crime incident joined with its nearest weather observation and the
/// calendar features derived from its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedIncident {
    /// The underlying crime record.
    pub incident: CrimeIncident,
    /// Full English weekday name (e.g. `"Monday"`).
    pub day_of_week: String,
    /// Hour of day, `"00"` through `"23"`.
    pub hour_of_day: String,
    /// Temperature of the nearest-in-time observation.
    pub temperature_c: f64,
    /// Precipitation of the same observation.
    pub precipitation: Option<f64>,
}

/// Column mapping and parsing rules for the crime source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrimeSourceConfig {
    /// Path of the crime CSV file.
    pub path: PathBuf,
    /// Column holding the occurrence timestamp.
    pub timestamp_column: String,
    /// `chrono` format string for the timestamp column.
    pub timestamp_format: String,
    /// Column holding the crime type.
    pub type_column: String,
    /// Column holding the latitude.
    pub latitude_column: String,
    /// Column holding the longitude.
    pub longitude_column: String,
    /// Column holding the community area, if the source has one.
    pub community_area_column: Option<String>,
    /// Drop rows with a null in any column, not just the required ones.
    pub strict_dropna: bool,
}

impl Default for CrimeSourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/crime_data_original.csv"),
            timestamp_column: "Date".to_string(),
            timestamp_format: "%m/%d/%Y %I:%M:%S %p".to_string(),
            type_column: "Primary Type".to_string(),
            latitude_column: "Latitude".to_string(),
            longitude_column: "Longitude".to_string(),
            community_area_column: Some("Community Area".to_string()),
            strict_dropna: false,
        }
    }
}

/// Column mapping and parsing rules for the weather source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSourceConfig {
    /// Path of the weather CSV file.
    pub path: PathBuf,
    /// Column holding the observation timestamp.
    pub timestamp_column: String,
    /// `chrono` format string for the timestamp column.
    pub timestamp_format: String,
    /// Column holding the dry-bulb temperature in Celsius.
    pub temperature_column: String,
    /// Column holding hourly precipitation, if the source has one.
    pub precipitation_column: Option<String>,
    /// Precipitation marker meaning "trace amount", read as zero.
    pub trace_marker: String,
}

impl Default for WeatherSourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/weather_data.csv"),
            timestamp_column: "DATE".to_string(),
            timestamp_format: "%Y-%m-%d %H:%M".to_string(),
            temperature_column: "HOURLYDRYBULBTEMPC".to_string(),
            precipitation_column: Some("HOURLYPrecip".to_string()),
            trace_marker: "T".to_string(),
        }
    }
}

/// Where and how the fused table is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination CSV path. Overwritten on success.
    pub path: PathBuf,
    /// Append a precipitation column after the temperature column.
    pub emit_precipitation: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/crime_data_with_temp.csv"),
            emit_precipitation: false,
        }
    }
}

/// Complete configuration for one fusion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Crime source settings.
    pub crime: CrimeSourceConfig,
    /// Weather source settings.
    pub weather: WeatherSourceConfig,
    /// Output settings.
    pub output: OutputConfig,
}

/// Row counts and timing of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionSummary {
    /// Data rows read from the crime source.
    pub crime_rows_read: u64,
    /// Crime rows dropped for missing required values.
    pub crime_rows_incomplete: u64,
    /// Crime rows dropped because they predate all weather data.
    pub crime_rows_truncated: u64,
    /// Data rows read from the weather source.
    pub weather_rows_read: u64,
    /// Weather rows dropped for a missing or non-numeric temperature.
    pub weather_rows_dropped: u64,
    /// Rows in the fused table.
    pub rows_fused: u64,
    /// Where the fused table was written, if it was written.
    pub output_path: Option<PathBuf>,
    /// Wall-clock time of the run.
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_chicago_noaa_layout() {
        let config = FusionConfig::default();
        assert_eq!(config.crime.timestamp_column, "Date");
        assert_eq!(config.crime.type_column, "Primary Type");
        assert_eq!(config.weather.temperature_column, "HOURLYDRYBULBTEMPC");
        assert_eq!(
            config.weather.precipitation_column.as_deref(),
            Some("HOURLYPrecip")
        );
        assert_eq!(config.weather.trace_marker, "T");
        assert!(!config.output.emit_precipitation);
    }
}
