//! Rule-based cross-check, independent of the trained model. Fixed domain
//! thresholds bucket each raw signal into low/medium/high (scored 0/1/2);
//! the composite is the mean bucket score, re-cut at 0.5 and 1.5.

use crate::risk::RiskLevel;
use crate::telemetry::TelemetryRecord;
use serde::{Deserialize, Serialize};

/// Signals covered by rule thresholds. Matching is on the full signal name
/// so engine_load features never fall into the engine_temperature buckets.
const RULE_SIGNALS: [&str; 5] = [
    "speed",
    "acceleration",
    "rpm",
    "engine_temperature",
    "throttle_position",
];

/// Bucket one raw signal by its rule thresholds.
pub fn bucket(signal: &str, value: f64) -> Option<u8> {
    let score = match signal {
        "speed" => step(value, 60.0, 90.0),
        "acceleration" => step(value.abs(), 0.2, 0.4),
        "rpm" => step(value, 3000.0, 4500.0),
        "engine_temperature" => step(value, 100.0, 110.0),
        "throttle_position" => step(value, 30.0, 70.0),
        _ => return None,
    };
    Some(score)
}

fn step(value: f64, medium: f64, high: f64) -> u8 {
    if value >= high {
        2
    } else if value >= medium {
        1
    } else {
        0
    }
}

fn level_of(score: u8) -> RiskLevel {
    match score {
        0 => RiskLevel::Low,
        1 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleAssessment {
    pub speed: u8,
    pub acceleration: u8,
    pub rpm: u8,
    pub engine_temperature: u8,
    pub throttle: u8,
    /// Mean of the five bucket scores.
    pub composite: f64,
    pub level: RiskLevel,
}

pub struct RuleEngine;

impl RuleEngine {
    pub fn assess(record: &TelemetryRecord) -> RuleAssessment {
        let speed = step(record.speed, 60.0, 90.0);
        let acceleration = step(record.acceleration.abs(), 0.2, 0.4);
        let rpm = step(record.rpm, 3000.0, 4500.0);
        let engine_temperature = step(record.engine_temperature, 100.0, 110.0);
        let throttle = step(record.throttle_position, 30.0, 70.0);
        let composite = f64::from(
            u32::from(speed)
                + u32::from(acceleration)
                + u32::from(rpm)
                + u32::from(engine_temperature)
                + u32::from(throttle),
        ) / 5.0;
        let level = if composite >= 1.5 {
            RiskLevel::High
        } else if composite >= 0.5 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        RuleAssessment {
            speed,
            acceleration,
            rpm,
            engine_temperature,
            throttle,
            composite,
            level,
        }
    }

    /// Bucket a single named feature value, mapped onto a risk level. A
    /// derived feature inherits the rule of the signal it is named after;
    /// features of uncovered signals get no rule context.
    pub fn level_for_feature(name: &str, value: f64) -> Option<RiskLevel> {
        let signal = RULE_SIGNALS
            .iter()
            .find(|&&s| name == s || name.strip_prefix(s).is_some_and(|rest| rest.starts_with('_')))?;
        bucket(signal, value).map(level_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calm_record_is_low() {
        let record = TelemetryRecord {
            speed: 40.0,
            acceleration: 0.05,
            rpm: 1800.0,
            engine_temperature: 88.0,
            throttle_position: 15.0,
            ..TelemetryRecord::default()
        };
        let assessment = RuleEngine::assess(&record);
        assert_eq!(assessment.composite, 0.0);
        assert_eq!(assessment.level, RiskLevel::Low);
    }

    #[test]
    fn aggressive_record_is_high() {
        let record = TelemetryRecord {
            speed: 110.0,
            acceleration: -0.6,
            rpm: 5200.0,
            engine_temperature: 112.0,
            throttle_position: 85.0,
            ..TelemetryRecord::default()
        };
        let assessment = RuleEngine::assess(&record);
        assert_eq!(assessment.composite, 2.0);
        assert_eq!(assessment.level, RiskLevel::High);
    }

    #[test]
    fn derived_feature_names_map_to_their_signal_rule() {
        assert_eq!(
            RuleEngine::level_for_feature("speed_mean_10s", 95.0),
            Some(RiskLevel::High)
        );
        assert_eq!(
            RuleEngine::level_for_feature("engine_temperature", 105.0),
            Some(RiskLevel::Medium)
        );
        assert_eq!(RuleEngine::level_for_feature("fuel_efficiency_proxy", 1.0), None);
    }

    #[test]
    fn engine_load_features_have_no_rule_context() {
        // Only engine_temperature has engine rule thresholds; load features
        // must not inherit them through the shared "engine" prefix.
        assert_eq!(RuleEngine::level_for_feature("engine_load_value", 95.0), None);
        assert_eq!(
            RuleEngine::level_for_feature("engine_load_value_mean_10s", 95.0),
            None
        );
        assert_eq!(
            RuleEngine::level_for_feature("engine_temperature_max_5s", 111.0),
            Some(RiskLevel::High)
        );
    }

    #[test]
    fn acceleration_buckets_by_magnitude() {
        assert_eq!(bucket("acceleration", -0.3), Some(1));
        assert_eq!(bucket("acceleration", 0.1), Some(0));
        assert_eq!(bucket("acceleration", -0.5), Some(2));
    }
}
