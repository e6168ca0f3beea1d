//! Field derivation for automatically dispatched work orders.

use chrono::Duration;

use crate::types::Timestamp;

/// Service address as shown to crews: `"{address}, {city}"`.
pub fn service_address(address: &str, city: &str) -> String {
    format!("{address}, {city}")
}

/// Explanation stored on every automatic job.
pub fn dispatch_notes(snowfall_inches: f64, threshold_inches: f64) -> String {
    format!(
        "Automatically created due to {snowfall_inches}\" snowfall \
         meeting threshold of {threshold_inches}\""
    )
}

/// When crews are expected on site for a job created at `now`.
pub fn scheduled_at(now: Timestamp, lead: Duration) -> Timestamp {
    now + lead
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn address_appends_city() {
        assert_eq!(service_address("12 Elm St", "City 1"), "12 Elm St, City 1");
    }

    #[test]
    fn notes_embed_snowfall_and_threshold() {
        let notes = dispatch_notes(3.5, 2.0);
        assert!(notes.contains("3.5\""));
        assert!(notes.contains("threshold of 2\""));
    }

    #[test]
    fn schedule_adds_lead() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap();
        assert_eq!(
            scheduled_at(now, Duration::hours(2)),
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
        );
    }
}
