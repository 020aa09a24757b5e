//! Pollutant threshold and classification rules.
//!
//! Two separate schemes live here and must not be conflated:
//! - alert severity bands, applied when a reading crosses its safety
//!   threshold (the sole automatic trigger for alert creation);
//! - EPA-style six-tier health levels per pollutant, used for display only.
//!
//! PM10 note: the upstream rule set contained a duplicated 254 boundary
//! that collapsed the high tier; the bands below use the consistent
//! three-tier scheme critical>254, high>154, medium otherwise.

use crate::entity::enums::{AlertSeverity, SensorType};

/// Safety threshold per sensor type; values strictly above it raise alerts.
///
/// Returns `None` for sensor types without a defined threshold, which
/// therefore never alert.
#[must_use]
pub fn safety_threshold(sensor_type: SensorType) -> Option<f64> {
    match sensor_type {
        SensorType::Pm25 => Some(35.4),
        SensorType::Pm10 => Some(154.0),
        SensorType::Ozone => Some(70.0),
        SensorType::No2 => Some(100.0),
        SensorType::So2 => Some(75.0),
        SensorType::Co => Some(9.4),
        _ => None,
    }
}

#[must_use]
pub fn exceeds_threshold(sensor_type: SensorType, value: f64) -> bool {
    safety_threshold(sensor_type).is_some_and(|threshold| value > threshold)
}

/// Severity of a confirmed exceedance. All boundaries are strict.
#[must_use]
pub fn severity_for(sensor_type: SensorType, value: f64) -> AlertSeverity {
    match sensor_type {
        SensorType::Pm25 => {
            if value > 150.0 {
                AlertSeverity::Critical
            } else if value > 55.0 {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            }
        }
        SensorType::Pm10 => {
            if value > 254.0 {
                AlertSeverity::Critical
            } else if value > 154.0 {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            }
        }
        SensorType::Ozone => {
            if value > 105.0 {
                AlertSeverity::Critical
            } else if value > 85.0 {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            }
        }
        _ => AlertSeverity::Medium,
    }
}

/// EPA-style health classification of a single reading, per pollutant.
///
/// Sensor types without a breakpoint table report "Unknown".
#[must_use]
pub fn health_level(sensor_type: SensorType, value: f64) -> &'static str {
    match sensor_type {
        SensorType::AirQuality => bucket(
            value,
            &[(50.0, "Good"), (100.0, "Moderate"), (150.0, "Unhealthy for Sensitive Groups"), (200.0, "Unhealthy"), (300.0, "Very Unhealthy")],
        ),
        SensorType::Pm25 => bucket(
            value,
            &[(12.0, "Good"), (35.4, "Moderate"), (55.4, "Unhealthy for Sensitive Groups"), (150.4, "Unhealthy"), (250.4, "Very Unhealthy")],
        ),
        SensorType::Pm10 => bucket(
            value,
            &[(54.0, "Good"), (154.0, "Moderate"), (254.0, "Unhealthy for Sensitive Groups"), (354.0, "Unhealthy"), (424.0, "Very Unhealthy")],
        ),
        SensorType::Ozone => bucket(
            value,
            &[(54.0, "Good"), (70.0, "Moderate"), (85.0, "Unhealthy for Sensitive Groups"), (105.0, "Unhealthy"), (200.0, "Very Unhealthy")],
        ),
        SensorType::No2 => bucket(
            value,
            &[(53.0, "Good"), (100.0, "Moderate"), (360.0, "Unhealthy for Sensitive Groups"), (649.0, "Unhealthy"), (1249.0, "Very Unhealthy")],
        ),
        _ => "Unknown",
    }
}

fn bucket(value: f64, breakpoints: &[(f64, &'static str)]) -> &'static str {
    for (upper, label) in breakpoints {
        if value <= *upper {
            return label;
        }
    }
    "Hazardous"
}

/// Name of a coarse 1-5 AQI level (the snapshot scheme, not the per-reading
/// health classification).
#[must_use]
pub fn aqi_level_name(level: i16) -> &'static str {
    match level {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    }
}

/// Bounds for the 2-sigma outlier check over a sensor's recent window.
///
/// Returns `None` when there are no samples. Uses the population standard
/// deviation.
#[must_use]
pub fn outlier_bounds(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    Some((mean - 2.0 * std_dev, mean + 2.0 * std_dev))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_only_trip_strictly_above_the_boundary() {
        assert!(!exceeds_threshold(SensorType::Pm25, 35.4));
        assert!(exceeds_threshold(SensorType::Pm25, 35.5));
        assert!(!exceeds_threshold(SensorType::Pm10, 154.0));
        assert!(exceeds_threshold(SensorType::Pm10, 154.1));
        assert!(exceeds_threshold(SensorType::Ozone, 70.1));
        assert!(exceeds_threshold(SensorType::No2, 100.5));
        assert!(exceeds_threshold(SensorType::So2, 76.0));
        assert!(exceeds_threshold(SensorType::Co, 9.5));
    }

    #[test]
    fn unlisted_sensor_types_never_exceed() {
        assert!(!exceeds_threshold(SensorType::Temperature, 1000.0));
        assert!(!exceeds_threshold(SensorType::Humidity, 1000.0));
        assert!(!exceeds_threshold(SensorType::WaterQuality, 1000.0));
        assert!(!exceeds_threshold(SensorType::AirQuality, 1000.0));
    }

    #[test]
    fn pm25_severity_bands_pin_the_150_boundary() {
        // 150.0 is not strictly above 150, so it stays high
        assert_eq!(severity_for(SensorType::Pm25, 150.0), AlertSeverity::High);
        assert_eq!(
            severity_for(SensorType::Pm25, 150.1),
            AlertSeverity::Critical
        );
        assert_eq!(severity_for(SensorType::Pm25, 55.0), AlertSeverity::Medium);
        assert_eq!(severity_for(SensorType::Pm25, 56.0), AlertSeverity::High);
        assert_eq!(severity_for(SensorType::Pm25, 40.0), AlertSeverity::Medium);
    }

    #[test]
    fn pm10_severity_uses_three_distinct_tiers() {
        assert_eq!(severity_for(SensorType::Pm10, 155.0), AlertSeverity::High);
        assert_eq!(severity_for(SensorType::Pm10, 254.0), AlertSeverity::High);
        assert_eq!(
            severity_for(SensorType::Pm10, 255.0),
            AlertSeverity::Critical
        );
    }

    #[test]
    fn ozone_severity_bands() {
        assert_eq!(severity_for(SensorType::Ozone, 80.0), AlertSeverity::Medium);
        assert_eq!(severity_for(SensorType::Ozone, 90.0), AlertSeverity::High);
        assert_eq!(
            severity_for(SensorType::Ozone, 110.0),
            AlertSeverity::Critical
        );
    }

    #[test]
    fn untiered_pollutants_default_to_medium() {
        assert_eq!(severity_for(SensorType::No2, 500.0), AlertSeverity::Medium);
        assert_eq!(severity_for(SensorType::So2, 500.0), AlertSeverity::Medium);
        assert_eq!(severity_for(SensorType::Co, 50.0), AlertSeverity::Medium);
    }

    #[test]
    fn health_levels_follow_pollutant_specific_breakpoints() {
        assert_eq!(health_level(SensorType::Pm25, 10.0), "Good");
        assert_eq!(health_level(SensorType::Pm25, 35.4), "Moderate");
        assert_eq!(
            health_level(SensorType::Pm25, 55.0),
            "Unhealthy for Sensitive Groups"
        );
        assert_eq!(health_level(SensorType::Pm25, 300.0), "Hazardous");
        assert_eq!(health_level(SensorType::Pm10, 100.0), "Moderate");
        assert_eq!(health_level(SensorType::Ozone, 60.0), "Moderate");
        assert_eq!(health_level(SensorType::No2, 40.0), "Good");
        assert_eq!(health_level(SensorType::AirQuality, 175.0), "Unhealthy");
        assert_eq!(health_level(SensorType::Temperature, 25.0), "Unknown");
        assert_eq!(health_level(SensorType::Co, 5.0), "Unknown");
    }

    #[test]
    fn aqi_level_names_cover_the_five_levels() {
        assert_eq!(aqi_level_name(1), "Good");
        assert_eq!(aqi_level_name(3), "Moderate");
        assert_eq!(aqi_level_name(5), "Very Poor");
        assert_eq!(aqi_level_name(0), "Unknown");
        assert_eq!(aqi_level_name(9), "Unknown");
    }

    #[test]
    fn outlier_bounds_are_mean_plus_minus_two_sigma() {
        assert_eq!(outlier_bounds(&[]), None);

        let (low, high) = outlier_bounds(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        // mean = 5, population std dev = 2
        assert!((low - 1.0).abs() < 1e-9);
        assert!((high - 9.0).abs() < 1e-9);

        // A constant series yields degenerate bounds at the mean
        let (low, high) = outlier_bounds(&[3.0, 3.0, 3.0]).unwrap();
        assert!((low - 3.0).abs() < 1e-9);
        assert!((high - 3.0).abs() < 1e-9);
    }
}
