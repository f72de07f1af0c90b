//! Telemetry records and per-series schema resolution.
//!
//! A series is an ordered slice of per-second samples. Ordering is
//! load-bearing: every windowed, lag, and split computation counts samples,
//! so reordering input invalidates all temporal features.

use serde::{Deserialize, Serialize};

/// One per-second telemetry sample. Required signals use NaN for a missing
/// reading (imputed later); optional signals are absent when the vehicle or
/// driver does not report them at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub speed: f64,
    pub rpm: f64,
    pub acceleration: f64,
    pub throttle_position: f64,
    pub engine_temperature: f64,
    pub system_voltage: f64,
    pub engine_load_value: f64,
    pub distance_travelled: f64,
    pub brake: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_precipitation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_day_time: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_weather: Option<String>,
}

impl Default for TelemetryRecord {
    fn default() -> Self {
        Self {
            speed: 0.0,
            rpm: 0.0,
            acceleration: 0.0,
            throttle_position: 0.0,
            engine_temperature: 0.0,
            system_voltage: 0.0,
            engine_load_value: 0.0,
            distance_travelled: 0.0,
            brake: 0.0,
            latitude: None,
            longitude: None,
            heart_rate: None,
            body_temperature: None,
            has_precipitation: None,
            is_day_time: None,
            current_weather: None,
        }
    }
}

/// Names of the always-present core signals, in canonical column order.
pub const CORE_SIGNALS: [&str; 7] = [
    "speed",
    "rpm",
    "acceleration",
    "throttle_position",
    "engine_temperature",
    "system_voltage",
    "engine_load_value",
];

/// Optional-signal availability, resolved once per series before any
/// row-level work. A signal is available when at least one record carries
/// it; per-record gaps are imputed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesSchema {
    pub has_gps: bool,
    pub has_heart_rate: bool,
    pub has_body_temperature: bool,
    pub has_precipitation: bool,
    pub has_daylight: bool,
    pub has_weather_category: bool,
}

impl SeriesSchema {
    pub fn resolve(records: &[TelemetryRecord]) -> Self {
        Self {
            has_gps: records
                .iter()
                .any(|r| r.latitude.is_some() && r.longitude.is_some()),
            has_heart_rate: records.iter().any(|r| r.heart_rate.is_some()),
            has_body_temperature: records.iter().any(|r| r.body_temperature.is_some()),
            has_precipitation: records.iter().any(|r| r.has_precipitation.is_some()),
            has_daylight: records.iter().any(|r| r.is_day_time.is_some()),
            has_weather_category: records.iter().any(|r| r.current_weather.is_some()),
        }
    }

    /// Biometric composites need both heart rate and body temperature.
    pub fn has_biometrics(&self) -> bool {
        self.has_heart_rate && self.has_body_temperature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_resolves_partial_presence() {
        let mut records = vec![TelemetryRecord::default(); 3];
        records[1].heart_rate = Some(72.0);
        let schema = SeriesSchema::resolve(&records);
        assert!(schema.has_heart_rate);
        assert!(!schema.has_biometrics());
        assert!(!schema.has_gps);
    }
}
