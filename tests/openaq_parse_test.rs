//! Unit tests for OpenAQ payload normalization feeding sensor discovery.
//!
//! Run with: cargo test --test openaq_parse_test

use enviro_db::entity::enums::SensorType;
use enviro_db::openaq::models::{
    normalize_location, normalize_measurement, OpenAqEnvelope, RawLocation, RawMeasurement,
};
use enviro_db::sync::sensors::{has_priority_parameters, infer_sensor_type};

const SEARCH_RESPONSE: &str = r#"{
    "meta": {"name": "openaq-api", "page": 1, "limit": 100, "found": 2},
    "results": [
        {
            "id": 2178,
            "name": "Del Norte",
            "locality": "Albuquerque",
            "timezone": "America/Denver",
            "country": {"code": "US", "name": "United States"},
            "provider": {"name": "AirNow"},
            "isMobile": false,
            "isMonitor": true,
            "coordinates": {"latitude": 35.1353, "longitude": -106.5847},
            "sensors": [
                {"id": 1001, "parameter": {"name": "pm25", "units": "µg/m³"}},
                {"id": 1002, "parameter": {"name": "o3", "units": "ppm"}}
            ],
            "datetimeFirst": {"utc": "2016-03-06T19:00:00Z"},
            "datetimeLast": {"utc": "2026-08-05T12:00:00Z"},
            "distance": 1243.7
        },
        {
            "id": 3344,
            "name": "Backyard weather kit",
            "isMonitor": false,
            "sensors": [
                {"id": 2001, "parameter": {"name": "temperature", "units": "c"}},
                {"id": 2002, "parameter": {"name": "humidity", "units": "%"}}
            ]
        }
    ]
}"#;

#[test]
fn radius_search_response_parses_and_filters() {
    let envelope: OpenAqEnvelope<RawLocation> = serde_json::from_str(SEARCH_RESPONSE).unwrap();
    let descriptors: Vec<_> = envelope
        .results
        .iter()
        .filter_map(normalize_location)
        .collect();
    assert_eq!(descriptors.len(), 2);

    // Only the station exposing a priority pollutant survives import
    let survivors: Vec<_> = descriptors
        .iter()
        .filter(|d| has_priority_parameters(&d.parameters))
        .collect();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].provider_id, 2178);
    assert_eq!(
        infer_sensor_type(&survivors[0].parameters),
        SensorType::AirQuality
    );

    // The discarded one would have classified as a temperature sensor
    assert_eq!(
        infer_sensor_type(&descriptors[1].parameters),
        SensorType::Temperature
    );
}

#[test]
fn measurements_response_normalizes_two_points() {
    let response: OpenAqEnvelope<RawMeasurement> = serde_json::from_str(
        r#"{
            "results": [
                {
                    "value": 25.5,
                    "parameter": {"name": "pm25", "units": "µg/m³"},
                    "period": {
                        "label": "1hour",
                        "interval": "01:00:00",
                        "datetimeFrom": {"utc": "2026-08-05T10:00:00Z"}
                    },
                    "flagInfo": {"hasFlags": false}
                },
                {
                    "value": 150.0,
                    "parameter": {"name": "pm25", "units": "µg/m³"},
                    "period": {
                        "label": "1hour",
                        "interval": "01:00:00",
                        "datetimeFrom": {"utc": "2026-08-05T11:00:00Z"}
                    },
                    "flagInfo": {"hasFlags": false}
                }
            ]
        }"#,
    )
    .unwrap();

    let measurements: Vec<_> = response
        .results
        .iter()
        .filter_map(normalize_measurement)
        .collect();

    assert_eq!(measurements.len(), 2);
    assert_eq!(measurements[0].value, 25.5);
    assert_eq!(measurements[1].value, 150.0);
    assert_eq!(measurements[0].parameter, "pm25");
    assert!(measurements[0].recorded_at.unwrap() < measurements[1].recorded_at.unwrap());
}
