//! Turns a loosely-typed provider payload into a [`WeatherRecord`].
//!
//! Only the city name and `main.temp` are required. Every other field falls
//! back to a default when absent or of the wrong type.

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde_json::Value;

use crate::{
    error::NormalizeError,
    model::{RawPayload, UNKNOWN, WeatherRecord},
};

/// Normalize `raw`, stamping the record with the current local time.
pub fn normalize(raw: &RawPayload) -> Result<WeatherRecord, NormalizeError> {
    normalize_at(raw, Local::now().naive_local())
}

/// Normalize `raw` with an explicit observation time (truncated to seconds).
pub fn normalize_at(
    raw: &RawPayload,
    observed_at: NaiveDateTime,
) -> Result<WeatherRecord, NormalizeError> {
    let body = &raw.0;

    let city = body
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| malformed("missing city name"))?
        .to_string();

    let main = body.get("main").ok_or_else(|| malformed("missing \"main\" block"))?;
    let temperature_celsius = main
        .get("temp")
        .and_then(as_real)
        .ok_or_else(|| malformed("missing or non-numeric temperature"))?;

    let country = body
        .pointer("/sys/country")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string();

    let humidity_percent =
        main.get("humidity").and_then(Value::as_u64).and_then(|h| u8::try_from(h).ok());
    let pressure_hpa =
        main.get("pressure").and_then(Value::as_u64).and_then(|p| u32::try_from(p).ok());

    let condition_description = body
        .pointer("/weather/0/description")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN)
        .to_string();

    let wind_speed_mps = body.pointer("/wind/speed").and_then(as_real).unwrap_or(0.0);

    Ok(WeatherRecord {
        city,
        country,
        temperature_celsius,
        humidity_percent,
        pressure_hpa,
        condition_description,
        wind_speed_mps,
        observed_at: observed_at.trunc_subsecs(0),
    })
}

/// Finite JSON number, or a string holding one.
fn as_real(value: &Value) -> Option<f64> {
    let real = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    real.filter(|v| v.is_finite())
}

fn malformed(reason: &str) -> NormalizeError {
    NormalizeError::MalformedPayload(reason.to_string())
}
