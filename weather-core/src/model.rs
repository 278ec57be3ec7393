use chrono::NaiveDateTime;
use std::ops::RangeInclusive;

/// Wall-clock format shared by the store and the log file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder for absent textual fields.
pub const UNKNOWN: &str = "Unknown";

/// Temperatures outside this range are stored as-is but flagged in the logs.
pub const PLAUSIBLE_TEMPERATURE_C: RangeInclusive<f64> = -100.0..=70.0;

/// Provider response body, before any field has been validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload(pub serde_json::Value);

/// One normalized weather observation for a city.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub city: String,
    pub country: String,
    pub temperature_celsius: f64,
    pub humidity_percent: Option<u8>,
    pub pressure_hpa: Option<u32>,
    pub condition_description: String,
    pub wind_speed_mps: f64,
    /// Local time at normalization, second precision.
    pub observed_at: NaiveDateTime,
}

impl WeatherRecord {
    pub fn has_plausible_temperature(&self) -> bool {
        PLAUSIBLE_TEMPERATURE_C.contains(&self.temperature_celsius)
    }

    /// `observed_at` rendered in [`TIMESTAMP_FORMAT`].
    pub fn timestamp(&self) -> String {
        self.observed_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// A record as read back from the store, with its surrogate key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: i64,
    pub record: WeatherRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(temp: f64) -> WeatherRecord {
        WeatherRecord {
            city: "Oslo".into(),
            country: "NO".into(),
            temperature_celsius: temp,
            humidity_percent: None,
            pressure_hpa: None,
            condition_description: UNKNOWN.into(),
            wind_speed_mps: 0.0,
            observed_at: NaiveDate::from_ymd_opt(2024, 3, 9)
                .and_then(|d| d.and_hms_opt(7, 5, 0))
                .expect("valid date"),
        }
    }

    #[test]
    fn timestamp_uses_fixed_format() {
        assert_eq!(record(1.0).timestamp(), "2024-03-09 07:05:00");
    }

    #[test]
    fn plausibility_bounds() {
        assert!(record(-40.0).has_plausible_temperature());
        assert!(record(70.0).has_plausible_temperature());
        assert!(!record(9999.0).has_plausible_temperature());
        assert!(!record(f64::NAN).has_plausible_temperature());
    }
}
