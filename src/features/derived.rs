//! Derived composite features. Each composite is gated on the series schema
//! resolved up front; a missing optional input means the feature is skipped,
//! never an error.

use super::frame::{percentile, FeatureFrame};
use crate::config::FeaturesConfig;
use crate::telemetry::SeriesSchema;
use tracing::debug;

/// Meters per degree of latitude; longitude degrees scale by cos(latitude).
const METERS_PER_DEGREE: f64 = 111_000.0;
/// GPS vs. telemetry speed gap (km/h) flagged as a discrepancy.
const DISCREPANCY_KMH: f64 = 10.0;

pub fn add_derived(frame: &mut FeatureFrame, schema: &SeriesSchema, config: &FeaturesConfig) {
    if let (Some(speed), Some(accel)) = (frame.column("speed"), frame.column("acceleration")) {
        let product: Vec<f64> = speed
            .iter()
            .zip(accel)
            .map(|(s, a)| s * a.abs())
            .collect();
        frame.insert("speed_accel_product", product);
    }

    if let (Some(rpm), Some(speed)) = (frame.column("rpm"), frame.column("speed")) {
        // Guard against divide instability at crawl speeds.
        let ratio: Vec<f64> = rpm
            .iter()
            .zip(speed)
            .map(|(r, s)| if *s > 5.0 { r / s } else { 0.0 })
            .collect();
        frame.insert("rpm_speed_ratio", ratio);
    }

    if let (Some(load), Some(speed)) = (frame.column("engine_load_value"), frame.column("speed")) {
        let proxy: Vec<f64> = load.iter().zip(speed).map(|(l, s)| l / (s + 1.0)).collect();
        frame.insert("fuel_efficiency_proxy", proxy);
    }

    if let (Some(rpm), Some(load)) = (frame.column("rpm"), frame.column("engine_load_value")) {
        let stress: Vec<f64> = rpm
            .iter()
            .zip(load)
            .map(|(r, l)| (r / 6000.0) * (l / 100.0))
            .collect();
        frame.insert("engine_stress", stress);
    }

    if schema.has_biometrics() {
        add_biometric_stress(frame, config.stress_quantile);
    } else if schema.has_heart_rate || schema.has_body_temperature {
        debug!("biometric stress skipped: need both heart rate and body temperature");
    }

    if schema.has_precipitation {
        let weather: Vec<f64> = frame.column("has_precipitation").unwrap().to_vec();
        frame.insert("weather_risk", weather.clone());
        if schema.has_daylight {
            let day = frame.column("is_day_time").unwrap();
            let night_rain: Vec<f64> = weather
                .iter()
                .zip(day)
                .map(|(w, d)| if *w > 0.0 && *d == 0.0 { 1.0 } else { 0.0 })
                .collect();
            frame.insert("night_rain_risk", night_rain);
        }
    }

    if schema.has_gps {
        add_gps_features(frame);
    }
}

/// Z-like offsets from resting heart rate and core temperature, summed;
/// the high-stress flag thresholds at the series' own quantile.
fn add_biometric_stress(frame: &mut FeatureFrame, quantile: f64) {
    let hr = frame.column("heart_rate").unwrap();
    let bt = frame.column("body_temperature").unwrap();
    let stress: Vec<f64> = hr
        .iter()
        .zip(bt)
        .map(|(h, b)| (h - 70.0) / 50.0 + (b - 36.5) / 1.5)
        .collect();
    let cut = percentile(&stress, quantile * 100.0);
    let flag: Vec<f64> = stress
        .iter()
        .map(|&s| if s > cut { 1.0 } else { 0.0 })
        .collect();
    frame.insert("biometric_stress", stress);
    frame.insert("high_stress", flag);
}

/// Speed implied by successive GPS fixes, and its gap to telemetry speed.
fn add_gps_features(frame: &mut FeatureFrame) {
    let lat = frame.column("latitude").unwrap();
    let lon = frame.column("longitude").unwrap();
    let n = lat.len();

    let mut gps_speed = Vec::with_capacity(n);
    gps_speed.push(0.0);
    for i in 1..n {
        let dy = (lat[i] - lat[i - 1]) * METERS_PER_DEGREE;
        let dx = (lon[i] - lon[i - 1]) * METERS_PER_DEGREE * lat[i].to_radians().cos();
        // Meters per second between per-second fixes, converted to km/h.
        gps_speed.push((dy * dy + dx * dx).sqrt() * 3.6);
    }
    frame.insert("gps_speed", gps_speed.clone());

    if let Some(speed) = frame.column("speed") {
        let discrepancy: Vec<f64> = speed
            .iter()
            .zip(&gps_speed)
            .map(|(s, g)| (s - g).abs())
            .collect();
        let flag: Vec<f64> = discrepancy
            .iter()
            .map(|&d| if d > DISCREPANCY_KMH { 1.0 } else { 0.0 })
            .collect();
        frame.insert("speed_discrepancy", discrepancy);
        frame.insert("high_speed_discrepancy", flag);
    }
}
