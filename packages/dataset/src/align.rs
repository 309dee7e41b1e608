//! Temporal alignment of crimes with weather observations.
//!
//! Both tables are sorted ascending by epoch time (stable, so rows sharing a
//! timestamp keep their source order). Crimes earlier than the first
//! observation are cut off with a single forward scan; every remaining crime
//! then takes the temperature of the observation nearest to it in time.
//!
//! ## Tie rule
//!
//! When two observations are equally far from a crime, the earlier one wins.
//! When several observations share the winning timestamp, the first of them
//! in source order wins. This is the first-minimum rule of a linear
//! `argmin` over the sorted table, reached here with binary search.

use std::path::Path;

use crime_temp_dataset_models::{CrimeIncident, WeatherObservation};

use crate::FusionError;

/// A crime paired with the readings of its nearest observation.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedIncident {
    /// The crime record.
    pub incident: CrimeIncident,
    /// Temperature of the nearest observation.
    pub temperature_c: f64,
    /// Precipitation of the nearest observation.
    pub precipitation: Option<f64>,
}

/// Output of [`align`].
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Aligned crimes, ascending by epoch time.
    pub incidents: Vec<AlignedIncident>,
    /// Number of crimes dropped for predating all weather data.
    pub truncated: u64,
}

/// Sorts observations ascending by epoch time, keeping source order among
/// equal timestamps.
pub fn sort_weather(weather: &mut [WeatherObservation]) {
    weather.sort_by_key(|w| w.epoch_time);
}

/// Sorts crimes ascending by epoch time, keeping source order among equal
/// timestamps.
pub fn sort_crimes(crimes: &mut [CrimeIncident]) {
    crimes.sort_by_key(|c| c.epoch_time);
}

/// Drops every leading crime earlier than `coverage_start`.
///
/// `crimes` must be sorted ascending by epoch time. Returns how many crimes
/// were dropped.
pub fn truncate_uncovered(crimes: &mut Vec<CrimeIncident>, coverage_start: i64) -> usize {
    let mut cursor = 0;
    while cursor < crimes.len() && crimes[cursor].epoch_time < coverage_start {
        cursor += 1;
    }
    crimes.drain(..cursor);
    cursor
}

/// Returns the observation closest in time to `target`, applying the tie
/// rule described in the module docs.
///
/// `weather` must be sorted ascending by epoch time. Returns `None` only if
/// `weather` is empty.
#[must_use]
pub fn nearest(weather: &[WeatherObservation], target: i64) -> Option<&WeatherObservation> {
    let (first, _) = weather.split_first()?;
    Some(nearest_in(first, weather, target))
}

/// [`nearest`] over a table known to be non-empty. `first` is `weather[0]`
/// and is returned when no other candidate exists.
fn nearest_in<'a>(
    first: &'a WeatherObservation,
    weather: &'a [WeatherObservation],
    target: i64,
) -> &'a WeatherObservation {
    let split = weather.partition_point(|w| w.epoch_time < target);

    // partition_point lands on the first of any run of equal timestamps, so
    // `later` is already the source-order winner of its run.
    let later = weather.get(split);
    let earlier = split.checked_sub(1).and_then(|last_before| {
        let epoch = weather[last_before].epoch_time;
        let run_start = weather[..last_before].partition_point(|w| w.epoch_time < epoch);
        weather.get(run_start)
    });

    match (earlier, later) {
        (Some(before), Some(after)) => {
            if target.abs_diff(before.epoch_time) <= after.epoch_time.abs_diff(target) {
                before
            } else {
                after
            }
        }
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => first,
    }
}

/// Sorts both tables, truncates crimes not covered by weather data, and
/// pairs every remaining crime with its nearest observation.
///
/// `weather_source` is only used in the error message.
///
/// # Errors
///
/// Returns [`FusionError::NoWeatherData`] if `weather` is empty.
pub fn align(
    mut crimes: Vec<CrimeIncident>,
    mut weather: Vec<WeatherObservation>,
    weather_source: &Path,
) -> Result<Alignment, FusionError> {
    sort_weather(&mut weather);
    let Some(first) = weather.first() else {
        return Err(FusionError::NoWeatherData {
            path: weather_source.to_path_buf(),
        });
    };

    sort_crimes(&mut crimes);
    let truncated = truncate_uncovered(&mut crimes, first.epoch_time);
    log::info!(
        "Dropped {truncated} crimes before weather coverage starts; aligning {} crimes with {} observations",
        crimes.len(),
        weather.len()
    );

    let incidents = crimes
        .into_iter()
        .map(|incident| {
            let observation = nearest_in(first, &weather, incident.epoch_time);
            AlignedIncident {
                temperature_c: observation.temperature_c,
                precipitation: observation.precipitation,
                incident,
            }
        })
        .collect();

    Ok(Alignment {
        incidents,
        truncated: truncated as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(source_index: u64, epoch_time: i64, temperature_c: f64) -> WeatherObservation {
        WeatherObservation {
            source_index,
            epoch_time,
            temperature_c,
            precipitation: None,
        }
    }

    fn crime(source_index: u64, epoch_time: i64) -> CrimeIncident {
        CrimeIncident {
            source_index,
            fields: Vec::new(),
            raw_timestamp: String::new(),
            epoch_time,
            primary_type: "THEFT".to_string(),
            latitude: 41.88,
            longitude: -87.63,
            community_area: None,
        }
    }

    fn brute_force(weather: &[WeatherObservation], target: i64) -> &WeatherObservation {
        let mut best = &weather[0];
        for w in &weather[1..] {
            if w.epoch_time.abs_diff(target) < best.epoch_time.abs_diff(target) {
                best = w;
            }
        }
        best
    }

    #[test]
    fn equidistant_scenario_picks_earlier_observation() {
        let weather = vec![obs(0, 100, 5.0), obs(1, 200, 10.0)];
        let crimes = vec![crime(0, 50), crime(1, 150), crime(2, 250)];

        let alignment = align(crimes, weather, Path::new("weather.csv")).unwrap();

        assert_eq!(alignment.truncated, 1);
        let temps: Vec<(i64, f64)> = alignment
            .incidents
            .iter()
            .map(|a| (a.incident.epoch_time, a.temperature_c))
            .collect();
        assert_eq!(temps, vec![(150, 5.0), (250, 10.0)]);
    }

    #[test]
    fn empty_weather_is_an_error() {
        let err = align(vec![crime(0, 50)], Vec::new(), Path::new("weather.csv")).unwrap_err();
        assert!(matches!(err, FusionError::NoWeatherData { .. }));
    }

    #[test]
    fn sorts_unordered_inputs_before_aligning() {
        let weather = vec![obs(0, 300, 3.0), obs(1, 100, 1.0), obs(2, 200, 2.0)];
        let crimes = vec![crime(0, 290), crime(1, 90), crime(2, 110), crime(3, 205)];

        let alignment = align(crimes, weather, Path::new("weather.csv")).unwrap();

        assert_eq!(alignment.truncated, 1);
        let got: Vec<(u64, f64)> = alignment
            .incidents
            .iter()
            .map(|a| (a.incident.source_index, a.temperature_c))
            .collect();
        assert_eq!(got, vec![(2, 1.0), (3, 2.0), (0, 3.0)]);
    }

    #[test]
    fn truncation_scans_every_leading_row() {
        let mut crimes = vec![crime(0, 10), crime(1, 20), crime(2, 30)];
        assert_eq!(truncate_uncovered(&mut crimes, 100), 3);
        assert!(crimes.is_empty());

        let mut crimes = vec![crime(0, 100), crime(1, 120)];
        assert_eq!(truncate_uncovered(&mut crimes, 100), 0);
        assert_eq!(crimes.len(), 2);
    }

    #[test]
    fn duplicate_timestamps_resolve_to_first_in_source_order() {
        let mut weather = vec![obs(0, 100, 1.0), obs(1, 200, 2.0), obs(2, 200, 2.5)];
        sort_weather(&mut weather);

        assert_eq!(nearest(&weather, 190).unwrap().source_index, 1);
        assert_eq!(nearest(&weather, 200).unwrap().source_index, 1);
        assert_eq!(nearest(&weather, 260).unwrap().source_index, 1);
    }

    #[test]
    fn crimes_after_coverage_take_last_observation() {
        let weather = vec![obs(0, 100, 1.0), obs(1, 200, 2.0)];
        assert_eq!(nearest(&weather, 10_000).unwrap().temperature_c, 2.0);
        assert!(nearest(&[], 10).is_none());
    }

    #[test]
    fn every_covered_crime_is_aligned() {
        let weather = vec![obs(0, 100, 1.0)];
        let crimes = vec![crime(0, 100), crime(1, 5_000), crime(2, 99), crime(3, 100)];

        let alignment = align(crimes, weather, Path::new("weather.csv")).unwrap();

        assert_eq!(alignment.truncated, 1);
        let got: Vec<u64> = alignment
            .incidents
            .iter()
            .map(|a| a.incident.source_index)
            .collect();
        assert_eq!(got, vec![0, 3, 1]);
        assert!(alignment.incidents.iter().all(|a| a.temperature_c == 1.0));
    }

    #[test]
    fn binary_search_agrees_with_linear_argmin() {
        let mut weather: Vec<WeatherObservation> = (0u64..40)
            .map(|i| {
                let step = i64::try_from(i).unwrap();
                obs(i, (step * 3_607) % 50_000 + step % 3, step as f64)
            })
            .collect();
        sort_weather(&mut weather);

        for target in (-1_000..52_000).step_by(97) {
            let fast = nearest(&weather, target).unwrap();
            let slow = brute_force(&weather, target);
            assert_eq!(
                fast.source_index, slow.source_index,
                "target {target}: {fast:?} vs {slow:?}"
            );
        }
    }
}
