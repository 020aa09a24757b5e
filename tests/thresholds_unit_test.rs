//! Unit tests for the alert threshold rules.
//!
//! Run with: cargo test --test thresholds_unit_test

use enviro_db::alerts::thresholds;
use enviro_db::entity::enums::{AlertSeverity, SensorType};

#[test]
fn pm25_alerting_matrix() {
    // At or below the safety threshold: no alert at all
    assert!(!thresholds::exceeds_threshold(SensorType::Pm25, 35.4));
    assert!(!thresholds::exceeds_threshold(SensorType::Pm25, 12.0));

    // (35.4, 55] -> medium
    assert!(thresholds::exceeds_threshold(SensorType::Pm25, 40.0));
    assert_eq!(
        thresholds::severity_for(SensorType::Pm25, 40.0),
        AlertSeverity::Medium
    );

    // (55, 150] -> high; 150.0 sits exactly on the boundary and stays high
    assert_eq!(
        thresholds::severity_for(SensorType::Pm25, 80.0),
        AlertSeverity::High
    );
    assert_eq!(
        thresholds::severity_for(SensorType::Pm25, 150.0),
        AlertSeverity::High
    );

    // Strictly above 150 -> critical
    assert_eq!(
        thresholds::severity_for(SensorType::Pm25, 150.1),
        AlertSeverity::Critical
    );
}

#[test]
fn per_pollutant_safety_thresholds() {
    assert_eq!(thresholds::safety_threshold(SensorType::Pm25), Some(35.4));
    assert_eq!(thresholds::safety_threshold(SensorType::Pm10), Some(154.0));
    assert_eq!(thresholds::safety_threshold(SensorType::Ozone), Some(70.0));
    assert_eq!(thresholds::safety_threshold(SensorType::No2), Some(100.0));
    assert_eq!(thresholds::safety_threshold(SensorType::So2), Some(75.0));
    assert_eq!(thresholds::safety_threshold(SensorType::Co), Some(9.4));
    assert_eq!(thresholds::safety_threshold(SensorType::Temperature), None);
    assert_eq!(thresholds::safety_threshold(SensorType::WaterQuality), None);
}

#[test]
fn health_levels_and_aqi_names_are_distinct_schemes() {
    // Six-tier EPA classification per reading
    assert_eq!(thresholds::health_level(SensorType::Pm25, 8.0), "Good");
    assert_eq!(
        thresholds::health_level(SensorType::Pm25, 40.0),
        "Unhealthy for Sensitive Groups"
    );
    assert_eq!(
        thresholds::health_level(SensorType::Pm25, 200.0),
        "Very Unhealthy"
    );
    assert_eq!(thresholds::health_level(SensorType::Co, 5.0), "Unknown");

    // Coarse five-level AQI naming for snapshots
    assert_eq!(thresholds::aqi_level_name(2), "Fair");
    assert_eq!(thresholds::aqi_level_name(4), "Poor");
    assert_eq!(thresholds::aqi_level_name(42), "Unknown");
}
