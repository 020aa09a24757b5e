//! Persistence-store adapter: shared lookups and explicit cascade deletes.
//!
//! Time-series rows have no independent lifecycle; deleting a sensor or a
//! location removes everything it owns inside one transaction instead of
//! relying on implicit ORM cascades.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entity::enums::SensorStatus;
use crate::entity::sensor_metadata::SensorMetadata;
use crate::entity::{
    air_qualities, alerts, flood_risks, historical_weathers, hourly_forecasts, locations,
    marine_weathers, readings, sensors, weather_metrics,
};
use crate::error::{AppError, AppResult};

/// Locations a sync cycle should process: all of them, or one by id.
///
/// # Errors
///
/// Returns `NotFound` when a targeted id does not exist.
pub async fn location_targets(
    db: &DatabaseConnection,
    location_id: Option<Uuid>,
) -> AppResult<Vec<locations::Model>> {
    match location_id {
        Some(id) => {
            let location = locations::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Location {id} not found")))?;
            Ok(vec![location])
        }
        None => Ok(locations::Entity::find().all(db).await?),
    }
}

/// All sensors indexed by their cached provider id.
///
/// Sensors without a provider id (manually created ones) are skipped; they
/// cannot collide with discovery imports.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn sensors_by_provider_id(
    db: &DatabaseConnection,
) -> AppResult<HashMap<i64, sensors::Model>> {
    let all = sensors::Entity::find().all(db).await?;

    Ok(all
        .into_iter()
        .filter_map(|sensor| {
            let provider_id = SensorMetadata::from_json(&sensor.metadata).provider_id?;
            Some((provider_id, sensor))
        })
        .collect())
}

/// Active sensors, capped for one sync run.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn active_sensors(
    db: &DatabaseConnection,
    limit: u64,
) -> AppResult<Vec<sensors::Model>> {
    Ok(sensors::Entity::find()
        .filter(sensors::Column::Status.eq(SensorStatus::Active))
        .limit(limit)
        .all(db)
        .await?)
}

/// Idempotency check: is there already a reading for this
/// (sensor, parameter, timestamp)?
///
/// Provider timestamps are coarse, so this existence check is the write-time
/// guard; the unique index is only a backstop.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn reading_exists(
    db: &DatabaseConnection,
    sensor_id: Uuid,
    parameter_name: &str,
    recorded_at: chrono::DateTime<chrono::Utc>,
) -> AppResult<bool> {
    let count = readings::Entity::find()
        .filter(readings::Column::SensorId.eq(sensor_id))
        .filter(readings::Column::ParameterName.eq(parameter_name))
        .filter(readings::Column::RecordedAt.eq(recorded_at))
        .count(db)
        .await?;

    Ok(count > 0)
}

/// Delete a sensor and everything it owns (readings, alerts) in one
/// transaction.
///
/// # Errors
///
/// Returns an error if any delete fails; nothing is removed in that case.
pub async fn delete_sensor(db: &DatabaseConnection, sensor_id: Uuid) -> AppResult<()> {
    let txn = db.begin().await?;

    alerts::Entity::delete_many()
        .filter(alerts::Column::SensorId.eq(sensor_id))
        .exec(&txn)
        .await?;
    readings::Entity::delete_many()
        .filter(readings::Column::SensorId.eq(sensor_id))
        .exec(&txn)
        .await?;
    sensors::Entity::delete_by_id(sensor_id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Delete a location and everything it owns: all weather time series plus
/// its sensors (and their readings and alerts), in one transaction.
///
/// # Errors
///
/// Returns an error if any delete fails; nothing is removed in that case.
pub async fn delete_location(db: &DatabaseConnection, location_id: Uuid) -> AppResult<()> {
    let txn = db.begin().await?;

    let owned_sensors: Vec<Uuid> = sensors::Entity::find()
        .filter(sensors::Column::LocationId.eq(location_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    if !owned_sensors.is_empty() {
        alerts::Entity::delete_many()
            .filter(alerts::Column::SensorId.is_in(owned_sensors.clone()))
            .exec(&txn)
            .await?;
        readings::Entity::delete_many()
            .filter(readings::Column::SensorId.is_in(owned_sensors))
            .exec(&txn)
            .await?;
        sensors::Entity::delete_many()
            .filter(sensors::Column::LocationId.eq(location_id))
            .exec(&txn)
            .await?;
    }

    weather_metrics::Entity::delete_many()
        .filter(weather_metrics::Column::LocationId.eq(location_id))
        .exec(&txn)
        .await?;
    hourly_forecasts::Entity::delete_many()
        .filter(hourly_forecasts::Column::LocationId.eq(location_id))
        .exec(&txn)
        .await?;
    historical_weathers::Entity::delete_many()
        .filter(historical_weathers::Column::LocationId.eq(location_id))
        .exec(&txn)
        .await?;
    marine_weathers::Entity::delete_many()
        .filter(marine_weathers::Column::LocationId.eq(location_id))
        .exec(&txn)
        .await?;
    air_qualities::Entity::delete_many()
        .filter(air_qualities::Column::LocationId.eq(location_id))
        .exec(&txn)
        .await?;
    flood_risks::Entity::delete_many()
        .filter(flood_risks::Column::LocationId.eq(location_id))
        .exec(&txn)
        .await?;

    locations::Entity::delete_by_id(location_id)
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(())
}
