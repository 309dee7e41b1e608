//! Writes the fused table to CSV.
//!
//! The layout is a leading unnamed positional index, an `index` column with
//! each row's position in the crime source, every original crime column, and
//! then `EpochTime`, `Day`, `Hour`, `Temp` (plus `Precip` when enabled).
//!
//! Rows go to a sibling `.tmp` file that is renamed over the destination
//! only after everything was written, so a failed run never leaves a
//! truncated table behind.

use std::fs::File;
use std::path::Path;

use crime_temp_dataset_models::{
    DAY_COL, EPOCH_TIME_COL, FusedIncident, HOUR_COL, PRECIP_COL, SOURCE_INDEX_COL, TEMP_COL,
};

use crate::paths::{ensure_parent_dir, temp_path};
use crate::{FusionError, Stage};

/// Builds the output header for the given crime source header.
#[must_use]
pub fn output_headers(crime_headers: &[String], emit_precipitation: bool) -> Vec<String> {
    let mut headers = Vec::with_capacity(crime_headers.len() + 7);
    headers.push(String::new());
    headers.push(SOURCE_INDEX_COL.to_string());
    headers.extend(crime_headers.iter().cloned());
    headers.extend(
        [EPOCH_TIME_COL, DAY_COL, HOUR_COL, TEMP_COL]
            .iter()
            .map(ToString::to_string),
    );
    if emit_precipitation {
        headers.push(PRECIP_COL.to_string());
    }
    headers
}

/// Formats a float in shortest round-trip form, always with a decimal part
/// (`5.0`, not `5`).
#[must_use]
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}

/// Writes `rows` to `path`, replacing any existing file. Returns the number
/// of rows written.
///
/// # Errors
///
/// Returns [`FusionError::Io`] if the destination directory or file cannot
/// be written. The destination is unchanged in that case.
pub fn write_fused(
    path: &Path,
    crime_headers: &[String],
    rows: &[FusedIncident],
    emit_precipitation: bool,
) -> Result<u64, FusionError> {
    ensure_parent_dir(path).map_err(|source| io_error(path, source))?;

    let tmp = temp_path(path);
    let result = write_rows(&tmp, crime_headers, rows, emit_precipitation).and_then(|count| {
        std::fs::rename(&tmp, path).map_err(|source| io_error(path, source))?;
        Ok(count)
    });

    match &result {
        Ok(count) => log::info!("Wrote {count} rows to {}", path.display()),
        Err(e) => {
            log::debug!("Removing {} after failed write: {e}", tmp.display());
            std::fs::remove_file(&tmp).ok();
        }
    }

    result
}

fn write_rows(
    tmp: &Path,
    crime_headers: &[String],
    rows: &[FusedIncident],
    emit_precipitation: bool,
) -> Result<u64, FusionError> {
    let file = File::create(tmp).map_err(|source| io_error(tmp, source))?;
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file);

    writer
        .write_record(output_headers(crime_headers, emit_precipitation))
        .map_err(|source| csv_error(tmp, source))?;

    let mut count = 0u64;
    for (position, row) in rows.iter().enumerate() {
        let incident = &row.incident;
        let mut record = Vec::with_capacity(incident.fields.len() + 7);
        record.push(position.to_string());
        record.push(incident.source_index.to_string());
        record.extend(incident.fields.iter().cloned());
        record.push(incident.epoch_time.to_string());
        record.push(row.day_of_week.clone());
        record.push(row.hour_of_day.clone());
        record.push(format_float(row.temperature_c));
        if emit_precipitation {
            record.push(row.precipitation.map(format_float).unwrap_or_default());
        }
        writer
            .write_record(&record)
            .map_err(|source| csv_error(tmp, source))?;
        count += 1;
    }

    let file = writer
        .into_inner()
        .map_err(|e| io_error(tmp, e.into_error()))?;
    file.sync_all().map_err(|source| io_error(tmp, source))?;

    Ok(count)
}

fn io_error(path: &Path, source: std::io::Error) -> FusionError {
    FusionError::Io {
        stage: Stage::Persist,
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> FusionError {
    FusionError::Csv {
        stage: Stage::Persist,
        path: path.to_path_buf(),
        source,
    }
}
