//! CSV loaders for the crime and weather sources.
//!
//! Each loader reads the whole file, drops rows that cannot participate in
//! the join, and converts the rest into typed rows. Rows are dropped only
//! for *missing* required values; a present value that fails to parse aborts
//! the run with [`FusionError::Parse`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crime_temp_dataset_models::{
    CrimeIncident, CrimeSourceConfig, WeatherObservation, WeatherSourceConfig,
};

use crate::parsing::{is_null, parse_epoch, parse_finite, parse_precipitation};
use crate::{FusionError, Stage};

/// The cleaned crime table.
#[derive(Debug, Clone)]
pub struct CrimeTable {
    /// Source header, in file order.
    pub headers: Vec<String>,
    /// Retained incidents, in file order.
    pub incidents: Vec<CrimeIncident>,
    /// Data rows in the file.
    pub rows_read: u64,
    /// Rows dropped for a missing required value.
    pub rows_incomplete: u64,
}

/// The cleaned weather table.
#[derive(Debug, Clone)]
pub struct WeatherTable {
    /// Retained observations, in file order.
    pub observations: Vec<WeatherObservation>,
    /// Data rows in the file.
    pub rows_read: u64,
    /// Rows dropped for a missing or non-numeric temperature.
    pub rows_dropped: u64,
}

/// Loads and cleans the crime source at `config.path`.
///
/// # Errors
///
/// Returns [`FusionError`] if the file is unreadable or malformed, a
/// configured column is missing, or a retained row has an unparseable
/// timestamp or coordinate.
pub fn load_crimes(config: &CrimeSourceConfig) -> Result<CrimeTable, FusionError> {
    log::info!("Loading crimes from {}", config.path.display());
    let file = open(&config.path, Stage::LoadCrime)?;
    let table = read_crimes(file, &config.path, config)?;
    log::info!(
        "Loaded {} crimes ({} of {} rows dropped for missing values)",
        table.incidents.len(),
        table.rows_incomplete,
        table.rows_read
    );
    Ok(table)
}

/// Loads and cleans the weather source at `config.path`.
///
/// # Errors
///
/// Returns [`FusionError`] if the file is unreadable or malformed, a
/// configured column is missing, or a row with a usable temperature has an
/// unparseable timestamp.
pub fn load_weather(config: &WeatherSourceConfig) -> Result<WeatherTable, FusionError> {
    log::info!("Loading weather from {}", config.path.display());
    let file = open(&config.path, Stage::LoadWeather)?;
    let table = read_weather(file, &config.path, config)?;
    log::info!(
        "Loaded {} weather observations ({} of {} rows without a temperature)",
        table.observations.len(),
        table.rows_dropped,
        table.rows_read
    );
    Ok(table)
}

/// Reads crime rows from any reader. `path` is only used in error messages.
///
/// # Errors
///
/// See [`load_crimes`].
pub fn read_crimes<R: Read>(
    reader: R,
    path: &Path,
    config: &CrimeSourceConfig,
) -> Result<CrimeTable, FusionError> {
    let stage = Stage::LoadCrime;
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader, stage, path)?;

    let ts_idx = column_index(&headers, &config.timestamp_column, stage, path)?;
    let type_idx = column_index(&headers, &config.type_column, stage, path)?;
    let lat_idx = column_index(&headers, &config.latitude_column, stage, path)?;
    let lng_idx = column_index(&headers, &config.longitude_column, stage, path)?;
    let area_idx = config.community_area_column.as_deref().and_then(|column| {
        let idx = headers.iter().position(|h| h == column);
        if idx.is_none() {
            log::warn!(
                "Community area column {column:?} not found in {}; leaving it empty",
                path.display()
            );
        }
        idx
    });
    let required = [ts_idx, type_idx, lat_idx, lng_idx];

    let mut incidents = Vec::new();
    let mut rows_read = 0u64;
    let mut rows_incomplete = 0u64;

    for (row, result) in (0u64..).zip(reader.records()) {
        let record = result.map_err(|source| csv_error(stage, path, source))?;
        rows_read += 1;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let incomplete = if config.strict_dropna {
            record.iter().any(is_null)
        } else {
            required.iter().any(|&idx| is_null(field(idx)))
        };
        if incomplete {
            log::debug!("Dropping crime row {row}: missing required value");
            rows_incomplete += 1;
            continue;
        }

        let raw_timestamp = field(ts_idx).trim().to_string();
        let epoch_time = parse_epoch(&raw_timestamp, &config.timestamp_format).ok_or_else(|| {
            FusionError::Parse {
                stage,
                row,
                column: config.timestamp_column.clone(),
                value: raw_timestamp.clone(),
                reason: format!("expected format {:?}", config.timestamp_format),
            }
        })?;
        let latitude = parse_coordinate(field(lat_idx), &config.latitude_column, row)?;
        let longitude = parse_coordinate(field(lng_idx), &config.longitude_column, row)?;

        let community_area = area_idx.and_then(|idx| {
            let value = field(idx);
            if is_null(value) {
                return None;
            }
            let parsed = parse_finite(value);
            if parsed.is_none() {
                log::warn!("Crime row {row}: non-numeric community area {value:?} ignored");
            }
            parsed
        });

        incidents.push(CrimeIncident {
            source_index: row,
            fields: record.iter().map(ToString::to_string).collect(),
            raw_timestamp,
            epoch_time,
            primary_type: field(type_idx).trim().to_string(),
            latitude,
            longitude,
            community_area,
        });
    }

    Ok(CrimeTable {
        headers,
        incidents,
        rows_read,
        rows_incomplete,
    })
}

/// Reads weather rows from any reader. `path` is only used in error
/// messages.
///
/// # Errors
///
/// See [`load_weather`].
pub fn read_weather<R: Read>(
    reader: R,
    path: &Path,
    config: &WeatherSourceConfig,
) -> Result<WeatherTable, FusionError> {
    let stage = Stage::LoadWeather;
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader, stage, path)?;

    let ts_idx = column_index(&headers, &config.timestamp_column, stage, path)?;
    let temp_idx = column_index(&headers, &config.temperature_column, stage, path)?;
    let precip_idx = config
        .precipitation_column
        .as_deref()
        .map(|column| column_index(&headers, column, stage, path))
        .transpose()?;

    let mut observations = Vec::new();
    let mut rows_read = 0u64;
    let mut rows_dropped = 0u64;

    for (row, result) in (0u64..).zip(reader.records()) {
        let record = result.map_err(|source| csv_error(stage, path, source))?;
        rows_read += 1;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        // Temperature is filtered before the timestamp is looked at, so rows
        // without a reading never raise timestamp errors.
        let Some(temperature_c) = parse_finite(field(temp_idx)) else {
            log::debug!(
                "Dropping weather row {row}: temperature {:?} is not numeric",
                field(temp_idx)
            );
            rows_dropped += 1;
            continue;
        };

        let raw_timestamp = field(ts_idx);
        let epoch_time = parse_epoch(raw_timestamp, &config.timestamp_format).ok_or_else(|| {
            FusionError::Parse {
                stage,
                row,
                column: config.timestamp_column.clone(),
                value: raw_timestamp.to_string(),
                reason: format!("expected format {:?}", config.timestamp_format),
            }
        })?;

        let precipitation =
            precip_idx.and_then(|idx| parse_precipitation(field(idx), &config.trace_marker));

        observations.push(WeatherObservation {
            source_index: row,
            epoch_time,
            temperature_c,
            precipitation,
        });
    }

    Ok(WeatherTable {
        observations,
        rows_read,
        rows_dropped,
    })
}

fn open(path: &Path, stage: Stage) -> Result<File, FusionError> {
    File::open(path).map_err(|source| FusionError::Io {
        stage,
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().has_headers(true).from_reader(reader)
}

fn csv_error(stage: Stage, path: &Path, source: csv::Error) -> FusionError {
    FusionError::Csv {
        stage,
        path: path.to_path_buf(),
        source,
    }
}

fn read_headers<R: Read>(
    reader: &mut csv::Reader<R>,
    stage: Stage,
    path: &Path,
) -> Result<Vec<String>, FusionError> {
    let headers = reader
        .headers()
        .map_err(|source| csv_error(stage, path, source))?;
    Ok(headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect())
}

fn column_index(
    headers: &[String],
    column: &str,
    stage: Stage,
    path: &Path,
) -> Result<usize, FusionError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| FusionError::MissingColumn {
            stage,
            column: column.to_string(),
            path: path.to_path_buf(),
        })
}

fn parse_coordinate(value: &str, column: &str, row: u64) -> Result<f64, FusionError> {
    parse_finite(value).ok_or_else(|| FusionError::Parse {
        stage: Stage::LoadCrime,
        row,
        column: column.to_string(),
        value: value.to_string(),
        reason: "expected a decimal coordinate".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crimes(csv: &str) -> Result<CrimeTable, FusionError> {
        read_crimes(
            csv.as_bytes(),
            Path::new("crime.csv"),
            &CrimeSourceConfig::default(),
        )
    }

    fn weather(csv: &str) -> Result<WeatherTable, FusionError> {
        read_weather(
            csv.as_bytes(),
            Path::new("weather.csv"),
            &WeatherSourceConfig::default(),
        )
    }

    #[test]
    fn drops_crimes_missing_required_fields() {
        let table = crimes(
            "ID,Date,Primary Type,Latitude,Longitude,Community Area\n\
             1,01/01/2015 12:30:00 AM,THEFT,41.8,-87.6,32\n\
             2,01/01/2015 12:40:00 AM,,41.8,-87.6,32\n\
             3,,THEFT,41.8,-87.6,32\n\
             4,01/01/2015 12:50:00 AM,THEFT,NaN,-87.6,32\n\
             5,01/01/2015 01:00:00 AM,THEFT,41.8,,32\n\
             6,01/01/2015 01:10:00 AM,BATTERY,41.9,-87.7,\n",
        )
        .unwrap();

        assert_eq!(table.rows_read, 6);
        assert_eq!(table.rows_incomplete, 4);
        let ids: Vec<u64> = table.incidents.iter().map(|i| i.source_index).collect();
        assert_eq!(ids, vec![0, 5]);
        assert_eq!(table.incidents[1].community_area, None);
        assert_eq!(table.incidents[0].community_area, Some(32.0));
        assert_eq!(table.incidents[0].primary_type, "THEFT");
        assert_eq!(table.incidents[0].raw_timestamp, "01/01/2015 12:30:00 AM");
    }

    #[test]
    fn strict_dropna_drops_rows_with_any_null() {
        let config = CrimeSourceConfig {
            strict_dropna: true,
            ..CrimeSourceConfig::default()
        };
        let table = read_crimes(
            "ID,Date,Primary Type,Latitude,Longitude,Community Area,Ward\n\
             1,01/01/2015 12:30:00 AM,THEFT,41.8,-87.6,32,\n\
             2,01/01/2015 12:40:00 AM,THEFT,41.8,-87.6,32,42\n"
                .as_bytes(),
            Path::new("crime.csv"),
            &config,
        )
        .unwrap();

        assert_eq!(table.rows_incomplete, 1);
        assert_eq!(table.incidents.len(), 1);
        assert_eq!(table.incidents[0].source_index, 1);
    }

    #[test]
    fn non_numeric_latitude_is_a_parse_error() {
        let err = crimes(
            "ID,Date,Primary Type,Latitude,Longitude,Community Area\n\
             1,01/01/2015 12:30:00 AM,THEFT,41.8,-87.6,32\n\
             2,01/01/2015 12:40:00 AM,THEFT,north,-87.6,32\n",
        )
        .unwrap_err();

        match err {
            FusionError::Parse {
                stage, row, column, ..
            } => {
                assert_eq!(stage, Stage::LoadCrime);
                assert_eq!(row, 1);
                assert_eq!(column, "Latitude");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_numeric_community_area_is_ignored() {
        let table = crimes(
            "ID,Date,Primary Type,Latitude,Longitude,Community Area\n\
             1,01/01/2015 12:30:00 AM,THEFT,41.8,-87.6,Loop\n",
        )
        .unwrap();
        assert_eq!(table.incidents[0].community_area, None);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let err = crimes("ID,Date,Primary Type,Latitude\n").unwrap_err();
        match err {
            FusionError::MissingColumn { stage, column, .. } => {
                assert_eq!(stage, Stage::LoadCrime);
                assert_eq!(column, "Longitude");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn trace_precipitation_row_is_retained() {
        let table = weather(
            "STATION,DATE,HOURLYDRYBULBTEMPC,HOURLYPrecip\n\
             WBAN:94846,2015-01-01 00:51,-3.3,T\n\
             WBAN:94846,2015-01-01 01:51,-3.9,0.01\n\
             WBAN:94846,2015-01-01 02:51,-4.4,0.01s\n",
        )
        .unwrap();

        assert_eq!(table.rows_dropped, 0);
        let precip: Vec<Option<f64>> = table
            .observations
            .iter()
            .map(|o| o.precipitation)
            .collect();
        assert_eq!(precip, vec![Some(0.0), Some(0.01), None]);
    }

    #[test]
    fn unusable_temperature_drops_row_before_timestamp_check() {
        let table = weather(
            "STATION,DATE,HOURLYDRYBULBTEMPC,HOURLYPrecip\n\
             WBAN:94846,not a date,M,\n\
             WBAN:94846,2015-01-01 01:51,12s,\n\
             WBAN:94846,2015-01-01 02:51,,\n\
             WBAN:94846,2015-01-01 03:51,-4.4,\n",
        )
        .unwrap();

        assert_eq!(table.rows_read, 4);
        assert_eq!(table.rows_dropped, 3);
        assert_eq!(table.observations.len(), 1);
        assert_eq!(table.observations[0].source_index, 3);
        assert_eq!(table.observations[0].temperature_c, -4.4);
    }

    #[test]
    fn malformed_weather_timestamp_is_fatal() {
        let err = weather(
            "STATION,DATE,HOURLYDRYBULBTEMPC,HOURLYPrecip\n\
             WBAN:94846,2015-01-01 00:51,-3.3,T\n\
             WBAN:94846,01/01/2015 01:51,-3.9,\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FusionError::Parse {
                stage: Stage::LoadWeather,
                row: 1,
                ..
            }
        ));
    }

    #[test]
    fn ragged_rows_are_malformed_csv() {
        let err = weather(
            "STATION,DATE,HOURLYDRYBULBTEMPC,HOURLYPrecip\n\
             WBAN:94846,2015-01-01 00:51,-3.3\n",
        )
        .unwrap_err();
        assert!(matches!(err, FusionError::Csv { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let config = WeatherSourceConfig {
            path: "/nonexistent/weather.csv".into(),
            ..WeatherSourceConfig::default()
        };
        assert!(matches!(
            load_weather(&config),
            Err(FusionError::Io { .. })
        ));
    }
}
