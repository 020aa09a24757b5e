//! Alert lifecycle: creation from threshold exceedances, resolution, and
//! aggregate statistics.
//!
//! Evaluation is an explicit post-persist step: reading sync calls
//! `evaluate_reading` after a reading write succeeds, so the trigger is
//! visible in the pipeline rather than hidden in the entity.

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::alerts::thresholds;
use crate::entity::enums::{AlertSeverity, AlertType};
use crate::entity::{alerts, readings, sensors};
use crate::error::{AppError, AppResult};
use crate::notify::{topics, Notifier};

/// Fixed resolution note applied by `dismiss_alert`.
const DISMISSED_NOTE: &str = "Dismissed by user";

/// Fixed resolution note applied by `bulk_resolve`.
const BULK_RESOLVED_NOTE: &str = "Bulk resolved";

/// Evaluate a freshly persisted reading against its sensor's thresholds.
///
/// Returns the created alert, or `None` when the reading does not exceed
/// its safety threshold (no database access happens in that case).
///
/// # Errors
///
/// Returns an error if the alert insert fails.
pub async fn evaluate_reading(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    sensor: &sensors::Model,
    reading: &readings::Model,
) -> AppResult<Option<alerts::Model>> {
    if !thresholds::exceeds_threshold(sensor.sensor_type, reading.value) {
        return Ok(None);
    }

    let severity = thresholds::severity_for(sensor.sensor_type, reading.value);
    let message = format!(
        "{} reading of {} {} exceeds safe threshold",
        sensor.sensor_type.as_str().to_uppercase(),
        reading.value,
        reading.unit
    );

    let created = create_alert(
        db,
        notifier,
        sensor.id,
        Some(reading.id),
        AlertType::ThresholdExceeded,
        severity,
        message,
    )
    .await?;

    Ok(Some(created))
}

/// Create an alert directly (threshold evaluation and manual creation both
/// land here) and broadcast it when it is severe enough to interrupt.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn create_alert(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    sensor_id: Uuid,
    reading_id: Option<Uuid>,
    alert_type: AlertType,
    severity: AlertSeverity,
    message: String,
) -> AppResult<alerts::Model> {
    let now = Utc::now();
    let alert = alerts::ActiveModel {
        id: Set(Uuid::new_v4()),
        sensor_id: Set(sensor_id),
        reading_id: Set(reading_id),
        alert_type: Set(alert_type),
        severity: Set(severity),
        message: Set(message.clone()),
        resolved_at: Set(None),
        metadata: Set(None),
        created_at: Set(Some(now.into())),
    };

    let created = alert.insert(db).await?;

    if severity == AlertSeverity::Critical {
        tracing::warn!(sensor_id = %sensor_id, "CRITICAL ALERT: {message}");
    }

    // Only high and critical alerts interrupt subscribers
    if severity >= AlertSeverity::High {
        let payload = serde_json::json!({
            "alert_id": created.id,
            "sensor_id": sensor_id,
            "severity": severity.as_str(),
            "message": created.message,
        });
        notifier.publish(topics::ALERTS, payload.clone());
        notifier.publish(&format!("sensor:{sensor_id}:alerts"), payload);
    }

    Ok(created)
}

/// Resolve an active alert, merging the resolution note into its metadata.
///
/// Returns `false` without touching the row when the alert is already
/// resolved; the active→resolved transition happens at most once.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id, or a database error.
pub async fn resolve_alert(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    alert_id: Uuid,
    resolution_note: Option<&str>,
) -> AppResult<bool> {
    let alert = alerts::Entity::find_by_id(alert_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Alert {alert_id} not found")))?;

    if alert.is_resolved() {
        return Ok(false);
    }

    let now = Utc::now();
    let metadata = merge_resolution_note(alert.metadata.clone(), resolution_note);

    let mut model: alerts::ActiveModel = alert.into();
    model.resolved_at = Set(Some(now.into()));
    model.metadata = Set(Some(metadata));
    let resolved = model.update(db).await?;

    notifier.publish(
        topics::ALERTS,
        serde_json::json!({
            "alert_id": resolved.id,
            "resolved_at": now.to_rfc3339(),
        }),
    );
    notifier.publish(topics::DASHBOARD, serde_json::json!({"event": "alert_resolved"}));

    Ok(true)
}

/// Dismiss an alert: resolve with a fixed note.
///
/// # Errors
///
/// Same contract as [`resolve_alert`].
pub async fn dismiss_alert(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    alert_id: Uuid,
) -> AppResult<bool> {
    resolve_alert(db, notifier, alert_id, Some(DISMISSED_NOTE)).await
}

/// Filter for bulk resolution; all fields are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub alert_ids: Option<Vec<Uuid>>,
    pub sensor_id: Option<Uuid>,
    pub severity: Option<AlertSeverity>,
    pub alert_type: Option<AlertType>,
}

/// Resolve every active alert matching the filter; returns how many were
/// resolved. Individual failures are logged and excluded from the count.
///
/// # Errors
///
/// Returns an error only if the initial query fails.
pub async fn bulk_resolve(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    filter: &AlertFilter,
) -> AppResult<u64> {
    let mut query = alerts::Entity::find().filter(alerts::Column::ResolvedAt.is_null());

    if let Some(ids) = &filter.alert_ids {
        query = query.filter(alerts::Column::Id.is_in(ids.clone()));
    }
    if let Some(sensor_id) = filter.sensor_id {
        query = query.filter(alerts::Column::SensorId.eq(sensor_id));
    }
    if let Some(severity) = filter.severity {
        query = query.filter(alerts::Column::Severity.eq(severity));
    }
    if let Some(alert_type) = filter.alert_type {
        query = query.filter(alerts::Column::AlertType.eq(alert_type));
    }

    let active = query.all(db).await?;
    let now = Utc::now();
    let mut resolved_count = 0u64;

    for alert in active {
        let alert_id = alert.id;
        let metadata = merge_resolution_note(alert.metadata.clone(), Some(BULK_RESOLVED_NOTE));

        let mut model: alerts::ActiveModel = alert.into();
        model.resolved_at = Set(Some(now.into()));
        model.metadata = Set(Some(metadata));

        match model.update(db).await {
            Ok(_) => resolved_count += 1,
            Err(e) => {
                tracing::warn!(alert_id = %alert_id, error = %e, "Failed to bulk-resolve alert");
            }
        }
    }

    if resolved_count > 0 {
        notifier.publish(
            topics::DASHBOARD,
            serde_json::json!({"event": "alerts_bulk_resolved", "count": resolved_count}),
        );
    }

    Ok(resolved_count)
}

/// Aggregate alert counts for dashboards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertStats {
    pub total: u64,
    pub active: u64,
    pub resolved: u64,
    pub by_severity: Vec<(AlertSeverity, u64)>,
}

/// # Errors
///
/// Returns an error if a count query fails.
pub async fn alert_stats(db: &DatabaseConnection) -> AppResult<AlertStats> {
    use sea_orm::Iterable;

    let total = alerts::Entity::find().count(db).await?;
    let active = alerts::Entity::find()
        .filter(alerts::Column::ResolvedAt.is_null())
        .count(db)
        .await?;

    let mut by_severity = Vec::new();
    for severity in AlertSeverity::iter() {
        let count = alerts::Entity::find()
            .filter(alerts::Column::Severity.eq(severity))
            .count(db)
            .await?;
        by_severity.push((severity, count));
    }

    Ok(AlertStats {
        total,
        active,
        resolved: total - active,
        by_severity,
    })
}

/// Alerts created per day over the trailing `days` window, oldest first.
/// Days without alerts are omitted.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn daily_alert_counts(
    db: &DatabaseConnection,
    days: i64,
) -> AppResult<Vec<(NaiveDate, u64)>> {
    let cutoff = Utc::now() - Duration::days(days);

    let recent = alerts::Entity::find()
        .filter(alerts::Column::CreatedAt.gt(cutoff))
        .order_by_asc(alerts::Column::CreatedAt)
        .all(db)
        .await?;

    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for alert in recent {
        if let Some(created_at) = alert.created_at {
            *buckets.entry(created_at.date_naive()).or_insert(0) += 1;
        }
    }

    Ok(buckets.into_iter().collect())
}

/// Readings outside the sensor's own mean ± 2σ over the trailing window.
///
/// Query capability only: nothing in the sync pipeline calls this, matching
/// the dormant anomaly-detection behavior of the system this replaces.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn anomalous_readings(
    db: &DatabaseConnection,
    sensor_id: Uuid,
    hours: i64,
) -> AppResult<Vec<readings::Model>> {
    let cutoff = Utc::now() - Duration::hours(hours);

    let window = readings::Entity::find()
        .filter(readings::Column::SensorId.eq(sensor_id))
        .filter(readings::Column::RecordedAt.gt(cutoff))
        .all(db)
        .await?;

    let values: Vec<f64> = window.iter().map(|r| r.value).collect();
    let Some((low, high)) = thresholds::outlier_bounds(&values) else {
        return Ok(Vec::new());
    };

    Ok(window
        .into_iter()
        .filter(|r| r.value < low || r.value > high)
        .collect())
}

fn merge_resolution_note(
    metadata: Option<serde_json::Value>,
    note: Option<&str>,
) -> serde_json::Value {
    let mut map = match metadata {
        Some(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    if let Some(note) = note {
        map.insert(
            "resolution_note".to_string(),
            serde_json::Value::String(note.to_string()),
        );
    }
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::enums::{SensorStatus, SensorType};
    use crate::notify::BroadcastNotifier;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn sensor(sensor_type: SensorType) -> sensors::Model {
        let now = Utc::now();
        sensors::Model {
            id: Uuid::new_v4(),
            location_id: None,
            name: "Test sensor".to_string(),
            sensor_type,
            manufacturer: "AirNow".to_string(),
            installation_date: now.into(),
            status: SensorStatus::Active,
            latitude: Some(37.7749),
            longitude: Some(-122.4194),
            metadata: serde_json::json!({}),
            created_at: Some(now.into()),
            updated_at: Some(now.into()),
        }
    }

    fn reading(sensor_id: Uuid, value: f64) -> readings::Model {
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

    #[tokio::test]
    async fn non_exceeding_reading_writes_nothing() {
        // No scripted results: any query or exec would fail the test
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let notifier = BroadcastNotifier::default();

        let sensor = sensor(SensorType::Pm25);
        let reading = reading(sensor.id, 20.0);

        let result = evaluate_reading(&db, &notifier, &sensor, &reading)
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn thresholdless_sensor_type_never_alerts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let notifier = BroadcastNotifier::default();

        let sensor = sensor(SensorType::Temperature);
        let reading = reading(sensor.id, 45.0);

        let result = evaluate_reading(&db, &notifier, &sensor, &reading)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn resolving_a_resolved_alert_is_a_no_op() {
        let resolved_at = Utc::now() - Duration::hours(1);
        let existing = alerts::Model {
            id: Uuid::new_v4(),
            sensor_id: Uuid::new_v4(),
            reading_id: None,
            alert_type: AlertType::ThresholdExceeded,
            severity: AlertSeverity::High,
            message: "PM25 reading of 80 µg/m³ exceeds safe threshold".to_string(),
            resolved_at: Some(resolved_at.into()),
            metadata: Some(serde_json::json!({"resolution_note": "cleared"})),
            created_at: Some((resolved_at - Duration::hours(2)).into()),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .into_connection();
        let notifier = BroadcastNotifier::default();

        let changed = resolve_alert(&db, &notifier, existing.id, Some("again"))
            .await
            .unwrap();
        assert!(!changed);

        // Only the lookup ran; resolved_at was never rewritten
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[tokio::test]
    async fn resolving_unknown_alert_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<alerts::Model>::new()])
            .into_connection();
        let notifier = BroadcastNotifier::default();

        let err = resolve_alert(&db, &notifier, Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn resolution_note_merges_into_existing_metadata() {
        let merged = merge_resolution_note(
            Some(serde_json::json!({"source": "sync"})),
            Some("handled on site"),
        );
        assert_eq!(merged["source"], "sync");
        assert_eq!(merged["resolution_note"], "handled on site");

        let fresh = merge_resolution_note(None, Some(DISMISSED_NOTE));
        assert_eq!(fresh["resolution_note"], DISMISSED_NOTE);

        let untouched = merge_resolution_note(None, None);
        assert_eq!(untouched, serde_json::json!({}));
    }
}
