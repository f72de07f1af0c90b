//! Preprocessing: synthetic per-second timeline, calendar features, and
//! whole-series median imputation of missing numeric readings.

use super::frame::{median, FeatureFrame};
use crate::error::{Result, RiskError};
use crate::telemetry::{SeriesSchema, TelemetryRecord, CORE_SIGNALS};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use tracing::{debug, info};

/// Journey start used to anchor the synthetic timeline. The records carry no
/// wall-clock meaning; only the derived calendar fields matter downstream.
fn base_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

pub struct Preprocessor;

impl Preprocessor {
    /// Build the initial frame: one column per core signal plus available
    /// optional signals, `seconds_elapsed`, and calendar features. Fails
    /// only on an empty series — downstream statistics are undefined.
    pub fn run(records: &[TelemetryRecord]) -> Result<(FeatureFrame, SeriesSchema)> {
        if records.is_empty() {
            return Err(RiskError::EmptySeries);
        }
        let n = records.len();
        let schema = SeriesSchema::resolve(records);
        let mut frame = FeatureFrame::new(n);

        frame.insert(
            "seconds_elapsed",
            (0..n).map(|i| i as f64).collect::<Vec<_>>(),
        );

        let mut hours = Vec::with_capacity(n);
        let mut minutes = Vec::with_capacity(n);
        let mut days = Vec::with_capacity(n);
        let mut rush = Vec::with_capacity(n);
        let mut weekend = Vec::with_capacity(n);
        let base = base_timestamp();
        for i in 0..n {
            let ts = base + Duration::seconds(i as i64);
            let h = ts.hour() as f64;
            let d = ts.weekday().num_days_from_monday() as f64;
            hours.push(h);
            minutes.push(ts.minute() as f64);
            days.push(d);
            let is_rush = (7.0..=9.0).contains(&h) || (17.0..=19.0).contains(&h);
            rush.push(if is_rush { 1.0 } else { 0.0 });
            weekend.push(if d >= 5.0 { 1.0 } else { 0.0 });
        }
        frame.insert("hour", hours);
        frame.insert("minute", minutes);
        frame.insert("day_of_week", days);
        frame.insert("is_rush_hour", rush);
        frame.insert("is_weekend", weekend);

        for signal in CORE_SIGNALS {
            frame.insert(signal, extract(records, signal));
        }
        frame.insert(
            "distance_travelled",
            records.iter().map(|r| r.distance_travelled).collect(),
        );
        frame.insert("brake", records.iter().map(|r| r.brake).collect());

        if schema.has_gps {
            frame.insert(
                "latitude",
                records
                    .iter()
                    .map(|r| r.latitude.unwrap_or(f64::NAN))
                    .collect(),
            );
            frame.insert(
                "longitude",
                records
                    .iter()
                    .map(|r| r.longitude.unwrap_or(f64::NAN))
                    .collect(),
            );
        }
        if schema.has_heart_rate {
            frame.insert(
                "heart_rate",
                records
                    .iter()
                    .map(|r| r.heart_rate.unwrap_or(f64::NAN))
                    .collect(),
            );
        }
        if schema.has_body_temperature {
            frame.insert(
                "body_temperature",
                records
                    .iter()
                    .map(|r| r.body_temperature.unwrap_or(f64::NAN))
                    .collect(),
            );
        }
        if schema.has_precipitation {
            frame.insert(
                "has_precipitation",
                records
                    .iter()
                    .map(|r| r.has_precipitation.map_or(f64::NAN, |b| b as u8 as f64))
                    .collect(),
            );
        }
        if schema.has_daylight {
            frame.insert(
                "is_day_time",
                records
                    .iter()
                    .map(|r| r.is_day_time.map_or(f64::NAN, |b| b as u8 as f64))
                    .collect(),
            );
        }

        impute_with_median(&mut frame);

        info!(samples = n, columns = frame.num_columns(), "preprocessed telemetry series");
        Ok((frame, schema))
    }
}

fn extract(records: &[TelemetryRecord], signal: &str) -> Vec<f64> {
    records
        .iter()
        .map(|r| match signal {
            "speed" => r.speed,
            "rpm" => r.rpm,
            "acceleration" => r.acceleration,
            "throttle_position" => r.throttle_position,
            "engine_temperature" => r.engine_temperature,
            "system_voltage" => r.system_voltage,
            "engine_load_value" => r.engine_load_value,
            _ => unreachable!("unknown core signal {signal}"),
        })
        .collect()
}

/// Replace NaN entries with the column's whole-series median. All-NaN
/// columns stay as-is; the selector drops them later.
fn impute_with_median(frame: &mut FeatureFrame) {
    let names: Vec<String> = frame.names().to_vec();
    for name in names {
        let col = frame.column(&name).unwrap();
        if !col.iter().any(|v| v.is_nan()) {
            continue;
        }
        let med = median(col);
        if med.is_nan() {
            debug!(column = %name, "all values missing; column left for selector to drop");
            continue;
        }
        let imputed: Vec<f64> = col
            .iter()
            .map(|&v| if v.is_nan() { med } else { v })
            .collect();
        frame.insert(name, imputed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_is_fatal() {
        assert!(matches!(
            Preprocessor::run(&[]),
            Err(RiskError::EmptySeries)
        ));
    }

    #[test]
    fn calendar_features_follow_synthetic_clock() {
        let records = vec![TelemetryRecord::default(); 3];
        let (frame, _) = Preprocessor::run(&records).unwrap();
        // Journey starts 09:00 on a Monday.
        assert_eq!(frame.column("hour").unwrap(), &[9.0, 9.0, 9.0]);
        assert_eq!(frame.column("is_rush_hour").unwrap(), &[1.0, 1.0, 1.0]);
        assert_eq!(frame.column("is_weekend").unwrap(), &[0.0, 0.0, 0.0]);
        assert_eq!(frame.column("seconds_elapsed").unwrap(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn missing_readings_take_column_median() {
        let mut records = vec![TelemetryRecord::default(); 3];
        records[0].speed = 10.0;
        records[1].speed = f64::NAN;
        records[2].speed = 30.0;
        let (frame, _) = Preprocessor::run(&records).unwrap();
        assert_eq!(frame.column("speed").unwrap(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn absent_optional_signals_produce_no_columns() {
        let records = vec![TelemetryRecord::default(); 2];
        let (frame, schema) = Preprocessor::run(&records).unwrap();
        assert!(!schema.has_gps);
        assert!(!frame.contains("latitude"));
        assert!(!frame.contains("heart_rate"));
    }
}
