//! Calendar features derived from each crime's epoch time.

use crime_temp_dataset_models::FusedIncident;

use crate::align::AlignedIncident;
use crate::parsing::naive_from_epoch;

/// Returns the full weekday name and the two-digit hour for `epoch`, e.g.
/// `("Thursday", "01")`.
#[must_use]
pub fn day_and_hour(epoch: i64) -> (String, String) {
    let naive = naive_from_epoch(epoch);
    (naive.format("%A").to_string(), naive.format("%H").to_string())
}

/// Attaches the weekday and hour to an aligned crime.
#[must_use]
pub fn derive(aligned: AlignedIncident) -> FusedIncident {
    let (day_of_week, hour_of_day) = day_and_hour(aligned.incident.epoch_time);
    FusedIncident {
        incident: aligned.incident,
        day_of_week,
        hour_of_day,
        temperature_c: aligned.temperature_c,
        precipitation: aligned.precipitation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_epoch;

    #[test]
    fn midnight_is_hour_zero_zero() {
        let epoch = parse_epoch("01/05/2015 12:00:00 AM", "%m/%d/%Y %I:%M:%S %p").unwrap();
        assert_eq!(
            day_and_hour(epoch),
            ("Monday".to_string(), "00".to_string())
        );
    }

    #[test]
    fn late_evening_keeps_its_own_day() {
        let epoch = parse_epoch("12/31/2016 11:59:59 PM", "%m/%d/%Y %I:%M:%S %p").unwrap();
        assert_eq!(
            day_and_hour(epoch),
            ("Saturday".to_string(), "23".to_string())
        );
    }
}
