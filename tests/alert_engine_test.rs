//! Unit tests for the alert engine against a mock database.
//!
//! Run with: cargo test --test alert_engine_test

use chrono::Utc;
use enviro_db::alerts::engine;
use enviro_db::entity::enums::{AlertSeverity, AlertType, SensorStatus, SensorType};
use enviro_db::entity::{alerts, readings, sensors};
use enviro_db::notify::BroadcastNotifier;
use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

fn pm25_sensor() -> sensors::Model {
    let now = Utc::now();
    sensors::Model {
        id: Uuid::new_v4(),
        location_id: None,
        name: "Del Norte".to_string(),
        sensor_type: SensorType::Pm25,
        manufacturer: "AirNow".to_string(),
        installation_date: now.into(),
        status: SensorStatus::Active,
        latitude: Some(35.1353),
        longitude: Some(-106.5847),
        metadata: serde_json::json!({}),
        created_at: Some(now.into()),
        updated_at: Some(now.into()),
    }
}

fn pm25_reading(sensor_id: Uuid, value: f64) -> readings::Model {
    let now = Utc::now();
    readings::Model {
        id: Uuid::new_v4(),
        sensor_id,
        parameter_name: "pm25".to_string(),
        value,
        unit: "µg/m³".to_string(),
        recorded_at: now.into(),
        raw_data: None,
        created_at: Some(now.into()),
    }
}

fn expected_alert(sensor: &sensors::Model, reading: &readings::Model) -> alerts::Model {
    alerts::Model {
        id: Uuid::new_v4(),
        sensor_id: sensor.id,
        reading_id: Some(reading.id),
        alert_type: AlertType::ThresholdExceeded,
        severity: AlertSeverity::Critical,
        message: format!(
            "PM25 reading of {} {} exceeds safe threshold",
            reading.value, reading.unit
        ),
        resolved_at: None,
        metadata: None,
        created_at: Some(Utc::now().into()),
    }
}

#[tokio::test]
async fn exceeding_reading_creates_exactly_one_alert() {
    let sensor = pm25_sensor();
    let reading = pm25_reading(sensor.id, 150.1);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![expected_alert(&sensor, &reading)]])
        .into_connection();
    let notifier = BroadcastNotifier::default();
    let mut rx = notifier.subscribe();

    let created = engine::evaluate_reading(&db, &notifier, &sensor, &reading)
        .await
        .unwrap();
    assert!(created.is_some());

    // One insert statement, carrying the computed critical severity
    let log = db.into_transaction_log();
    assert_eq!(log.len(), 1);
    let statements = format!("{log:?}");
    assert!(statements.contains("critical"));
    assert!(statements.contains("threshold_exceeded"));

    // Critical alerts broadcast to subscribers
    let published = rx.try_recv().unwrap();
    assert_eq!(published.topic, "environmental_alerts");
}

#[tokio::test]
async fn reading_at_the_safety_threshold_creates_nothing() {
    let sensor = pm25_sensor();
    let reading = pm25_reading(sensor.id, 35.4);

    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let notifier = BroadcastNotifier::default();

    let created = engine::evaluate_reading(&db, &notifier, &sensor, &reading)
        .await
        .unwrap();
    assert!(created.is_none());
    assert!(db.into_transaction_log().is_empty());
}

#[tokio::test]
async fn medium_alerts_do_not_interrupt_subscribers() {
    let sensor = pm25_sensor();
    let reading = pm25_reading(sensor.id, 40.0);

    let mut medium = expected_alert(&sensor, &reading);
    medium.severity = AlertSeverity::Medium;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![medium]])
        .into_connection();
    let notifier = BroadcastNotifier::default();
    let mut rx = notifier.subscribe();

    let created = engine::evaluate_reading(&db, &notifier, &sensor, &reading)
        .await
        .unwrap();
    assert!(created.is_some());
    assert!(rx.try_recv().is_err());
}
