//! Reading sync: pull recent measurements for every active sensor's cached
//! channels, de-duplicate, persist, and evaluate alerts.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::alerts::engine;
use crate::entity::sensor_metadata::SensorMetadata;
use crate::entity::{readings, sensors};
use crate::error::{AppError, AppResult};
use crate::notify::{topics, Notifier};
use crate::openaq::models::Measurement;
use crate::openaq::OpenAqClient;
use crate::store;

/// Measurements fetched per channel per run.
const MEASUREMENTS_FETCH_LIMIT: u32 = 100;

/// Aggregate result of one reading-sync cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadingSyncStats {
    /// Sensors that were actually processed (had cached channels).
    pub sensors: u64,
    /// New readings persisted this cycle.
    pub readings: u64,
}

/// Sync readings for all active sensors with cached channel ids, or one
/// targeted sensor.
///
/// Sensors run concurrently up to `concurrent_limit`; a sensor's failure is
/// logged and does not abort its siblings. Re-running with identical
/// upstream data creates no additional rows.
///
/// # Errors
///
/// Returns an error when the sensor query itself fails (cycle-level), or
/// when a targeted sensor id does not exist.
pub async fn sync_readings(
    db: &DatabaseConnection,
    openaq: &OpenAqClient,
    notifier: &dyn Notifier,
    lookback_hours: i64,
    concurrent_limit: usize,
    max_sensors: u64,
    sensor_id: Option<Uuid>,
) -> AppResult<ReadingSyncStats> {
    let targets = match sensor_id {
        Some(id) => {
            let sensor = sensors::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Sensor {id} not found")))?;
            vec![sensor]
        }
        None => store::active_sensors(db, max_sensors).await?,
    };

    tracing::info!(
        sensors = targets.len(),
        lookback_hours,
        "Starting environmental readings sync"
    );

    let results: Vec<Option<u64>> = stream::iter(targets)
        .map(|sensor| async move {
            match sync_readings_for_sensor(db, openaq, notifier, &sensor, lookback_hours).await {
                Ok(count) => count,
                Err(e) => {
                    tracing::error!(
                        sensor = %sensor.name,
                        error = %e,
                        "Failed to sync readings for sensor"
                    );
                    None
                }
            }
        })
        .buffer_unordered(concurrent_limit.max(1))
        .collect()
        .await;

    let mut totals = ReadingSyncStats::default();
    for created in results.into_iter().flatten() {
        totals.sensors += 1;
        totals.readings += created;
    }

    tracing::info!(
        sensors = totals.sensors,
        readings = totals.readings,
        "Environmental readings sync completed"
    );

    notifier.publish(
        topics::READINGS,
        serde_json::json!({
            "sensors": totals.sensors,
            "readings": totals.readings,
        }),
    );

    Ok(totals)
}

/// Returns `Ok(None)` for sensors that were skipped (no cached channels),
/// `Ok(Some(n))` with the number of new readings otherwise.
async fn sync_readings_for_sensor(
    db: &DatabaseConnection,
    openaq: &OpenAqClient,
    notifier: &dyn Notifier,
    sensor: &sensors::Model,
    lookback_hours: i64,
) -> AppResult<Option<u64>> {
    let mut metadata = SensorMetadata::from_json(&sensor.metadata);

    if !metadata.has_channels() {
        tracing::warn!(sensor = %sensor.name, "Sensor has no cached channel ids, skipping");
        return Ok(None);
    }

    let date_to = Utc::now();
    let date_from = date_to - chrono::Duration::hours(lookback_hours);
    let mut created_count = 0u64;

    for channel in &metadata.channels {
        let measurements = openaq
            .fetch_channel_measurements(
                channel.channel_id,
                date_from,
                date_to,
                MEASUREMENTS_FETCH_LIMIT,
            )
            .await;

        tracing::debug!(
            sensor = %sensor.name,
            channel_id = channel.channel_id,
            count = measurements.len(),
            "Fetched channel measurements"
        );

        for measurement in measurements {
            match persist_measurement(db, notifier, sensor, &measurement).await {
                Ok(true) => created_count += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        sensor = %sensor.name,
                        parameter = %measurement.parameter,
                        error = %e,
                        "Failed to process measurement"
                    );
                }
            }
        }
    }

    // Stamp the sweep so operators can spot stalled sensors
    metadata.last_readings_sync = Some(date_to);
    let mut model: sensors::ActiveModel = sensor.clone().into();
    model.metadata = Set(metadata.to_json());
    if let Err(e) = model.update(db).await {
        tracing::warn!(sensor = %sensor.name, error = %e, "Failed to stamp last readings sync");
    }

    tracing::info!(
        sensor = %sensor.name,
        created = created_count,
        "Synced readings for sensor"
    );

    Ok(Some(created_count))
}

/// Insert one measurement unless a reading already exists at
/// (sensor, parameter, timestamp). Returns whether a row was created.
///
/// Alert evaluation runs only after the insert has returned, so an alert
/// can never reference a reading that was not durably persisted.
async fn persist_measurement(
    db: &DatabaseConnection,
    notifier: &dyn Notifier,
    sensor: &sensors::Model,
    measurement: &Measurement,
) -> AppResult<bool> {
    let recorded_at = measurement.recorded_at.unwrap_or_else(Utc::now);

    if store::reading_exists(db, sensor.id, &measurement.parameter, recorded_at).await? {
        return Ok(false);
    }

    let now = Utc::now();
    let reading = readings::ActiveModel {
        id: Set(Uuid::new_v4()),
        sensor_id: Set(sensor.id),
        parameter_name: Set(measurement.parameter.clone()),
        value: Set(measurement.value),
        unit: Set(measurement
            .unit
            .clone()
            .unwrap_or_else(|| "unknown".to_string())),
        recorded_at: Set(recorded_at.into()),
        raw_data: Set(Some(serde_json::json!({
            "period_label": measurement.period_label,
            "interval": measurement.interval,
            "has_flags": measurement.has_flags,
        }))),
        created_at: Set(Some(now.into())),
    };

    let created = reading.insert(db).await?;

    if let Err(e) = engine::evaluate_reading(db, notifier, sensor, &created).await {
        tracing::error!(
            sensor = %sensor.name,
            reading_id = %created.id,
            error = %e,
            "Alert evaluation failed for reading"
        );
    }

    notifier.publish(
        &format!("sensor:{}:readings", sensor.id),
        serde_json::json!({
            "reading_id": created.id,
            "parameter": created.parameter_name,
            "value": created.value,
            "recorded_at": recorded_at.to_rfc3339(),
        }),
    );

    Ok(true)
}
