//! Sensor discovery & sync: import air-quality stations near monitored
//! locations from OpenAQ and keep their records current.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entity::enums::{SensorStatus, SensorType};
use crate::entity::sensor_metadata::{ChannelRef, SensorMetadata};
use crate::entity::{locations, sensors};
use crate::error::AppResult;
use crate::notify::{topics, Notifier};
use crate::openaq::models::SensorDescriptor;
use crate::openaq::OpenAqClient;
use crate::store;

/// Parameters worth importing a sensor for; stations exposing none of these
/// are discarded.
pub const PRIORITY_PARAMETERS: &[&str] = &["pm25", "pm10", "o3", "no2", "so2", "co"];

/// Stations fetched per location search.
const DISCOVERY_FETCH_LIMIT: u32 = 100;

/// Aggregate result of one discovery cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSyncStats {
    pub synced: u64,
    pub created: u64,
    pub updated: u64,
}

/// Discover and sync sensors for all locations, or one targeted location.
///
/// One location's upstream failure is logged and does not abort the others.
///
/// # Errors
///
/// Returns an error when the location/sensor queries themselves fail
/// (cycle-level, the scheduler retries the whole run).
pub async fn sync_sensors(
    db: &DatabaseConnection,
    openaq: &OpenAqClient,
    notifier: &dyn Notifier,
    radius_km: u32,
    location_id: Option<Uuid>,
) -> AppResult<SensorSyncStats> {
    let targets = store::location_targets(db, location_id).await?;
    let mut existing = store::sensors_by_provider_id(db).await?;

    tracing::info!(
        locations = targets.len(),
        radius_km,
        "Starting environmental sensors sync"
    );

    let mut totals = SensorSyncStats::default();

    for location in &targets {
        match sync_sensors_for_location(db, openaq, notifier, location, radius_km, &mut existing)
            .await
        {
            Ok(stats) => {
                totals.synced += stats.synced;
                totals.created += stats.created;
                totals.updated += stats.updated;
            }
            Err(e) => {
                tracing::error!(
                    location = %location.name,
                    error = %e,
                    "Failed to sync sensors for location"
                );
            }
        }
    }

    tracing::info!(
        synced = totals.synced,
        created = totals.created,
        updated = totals.updated,
        "Environmental sensors sync completed"
    );

    notifier.publish(
        topics::SENSORS,
        serde_json::json!({
            "synced": totals.synced,
            "created": totals.created,
            "updated": totals.updated,
        }),
    );

    Ok(totals)
}

async fn sync_sensors_for_location(
    db: &DatabaseConnection,
    openaq: &OpenAqClient,
    notifier: &dyn Notifier,
    location: &locations::Model,
    radius_km: u32,
    existing: &mut HashMap<i64, sensors::Model>,
) -> AppResult<SensorSyncStats> {
    tracing::info!(
        location = %location.name,
        radius_km,
        "Syncing sensors near location"
    );

    let descriptors = openaq
        .fetch_sensors_near_location(
            location.latitude,
            location.longitude,
            radius_km,
            None,
            DISCOVERY_FETCH_LIMIT,
        )
        .await;

    let mut stats = SensorSyncStats::default();

    for descriptor in descriptors {
        if !has_priority_parameters(&descriptor.parameters) {
            continue;
        }

        let result = match existing.get(&descriptor.provider_id) {
            Some(current) => update_sensor(db, current.clone(), &descriptor)
                .await
                .map(|updated| (updated, false)),
            None => create_sensor(db, location, &descriptor)
                .await
                .map(|created| (created, true)),
        };

        let (mut sensor, was_created) = match result {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(
                    sensor = %descriptor.name,
                    provider_id = descriptor.provider_id,
                    error = %e,
                    "Failed to sync sensor"
                );
                continue;
            }
        };

        // Resolve per-parameter channel ids once; later refreshes keep them.
        if !SensorMetadata::from_json(&sensor.metadata).has_channels() {
            match resolve_channels(db, openaq, &sensor, descriptor.provider_id).await {
                Ok(Some(with_channels)) => sensor = with_channels,
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        sensor = %sensor.name,
                        error = %e,
                        "Failed to store channel ids"
                    );
                }
            }
        }

        if was_created {
            stats.created += 1;
        } else {
            stats.updated += 1;
        }
        stats.synced += 1;

        notifier.publish(
            &format!("sensor:{}", sensor.id),
            serde_json::json!({"sensor_id": sensor.id, "status": sensor.status}),
        );

        existing.insert(descriptor.provider_id, sensor);
    }

    tracing::info!(
        location = %location.name,
        synced = stats.synced,
        created = stats.created,
        updated = stats.updated,
        "Synced sensors for location"
    );

    Ok(stats)
}

async fn create_sensor(
    db: &DatabaseConnection,
    location: &locations::Model,
    descriptor: &SensorDescriptor,
) -> AppResult<sensors::Model> {
    let now = Utc::now();
    let metadata = metadata_from_descriptor(descriptor, now);

    let sensor = sensors::ActiveModel {
        id: Set(Uuid::new_v4()),
        location_id: Set(Some(location.id)),
        name: Set(descriptor.name.clone()),
        sensor_type: Set(infer_sensor_type(&descriptor.parameters)),
        manufacturer: Set(descriptor.manufacturer.clone()),
        installation_date: Set(descriptor.first_updated.unwrap_or(now).into()),
        status: Set(status_from_descriptor(descriptor)),
        latitude: Set(descriptor.latitude.or(Some(location.latitude))),
        longitude: Set(descriptor.longitude.or(Some(location.longitude))),
        metadata: Set(metadata.to_json()),
        created_at: Set(Some(now.into())),
        updated_at: Set(Some(now.into())),
    };

    let created = sensor.insert(db).await?;
    tracing::info!(
        sensor = %created.name,
        provider_id = descriptor.provider_id,
        "Created sensor"
    );
    Ok(created)
}

async fn update_sensor(
    db: &DatabaseConnection,
    current: sensors::Model,
    descriptor: &SensorDescriptor,
) -> AppResult<sensors::Model> {
    let now = Utc::now();

    let mut metadata = SensorMetadata::from_json(&current.metadata);
    metadata.merge_discovery(metadata_from_descriptor(descriptor, now), now);

    let name = current.name.clone();
    let mut model: sensors::ActiveModel = current.into();
    model.status = Set(status_from_descriptor(descriptor));
    model.metadata = Set(metadata.to_json());
    model.updated_at = Set(Some(now.into()));

    let updated = model.update(db).await?;
    tracing::debug!(sensor = %name, provider_id = descriptor.provider_id, "Updated sensor");
    Ok(updated)
}

/// Fetch the station's per-parameter channel list and cache it in sensor
/// metadata. Returns the refreshed model, or `None` when the provider had
/// nothing to offer (soft upstream failure included).
async fn resolve_channels(
    db: &DatabaseConnection,
    openaq: &OpenAqClient,
    sensor: &sensors::Model,
    provider_id: i64,
) -> AppResult<Option<sensors::Model>> {
    let Some(station) = openaq.fetch_sensor_metadata(provider_id).await else {
        return Ok(None);
    };
    if station.channels.is_empty() {
        return Ok(None);
    }

    let now = Utc::now();
    let channels: Vec<ChannelRef> = station
        .channels
        .into_iter()
        .map(|c| ChannelRef {
            channel_id: c.channel_id,
            parameter: c.parameter,
            unit: c.unit,
        })
        .collect();
    let channel_count = channels.len();

    let mut metadata = SensorMetadata::from_json(&sensor.metadata);
    metadata.set_channels(channels, now);

    let mut model: sensors::ActiveModel = sensor.clone().into();
    model.metadata = Set(metadata.to_json());
    model.updated_at = Set(Some(now.into()));
    let updated = model.update(db).await?;

    tracing::info!(
        sensor = %updated.name,
        channels = channel_count,
        "Stored channel ids for sensor"
    );

    Ok(Some(updated))
}

#[must_use]
pub fn has_priority_parameters(parameters: &[String]) -> bool {
    parameters
        .iter()
        .any(|p| PRIORITY_PARAMETERS.contains(&p.as_str()))
}

/// Infer the sensor type from its discovered parameter list.
#[must_use]
pub fn infer_sensor_type(parameters: &[String]) -> SensorType {
    if has_priority_parameters(parameters) {
        return SensorType::AirQuality;
    }
    if parameters.iter().any(|p| p == "temperature") {
        return SensorType::Temperature;
    }
    if parameters.iter().any(|p| p == "humidity") {
        return SensorType::Humidity;
    }
    SensorType::AirQuality
}

fn status_from_descriptor(descriptor: &SensorDescriptor) -> SensorStatus {
    if descriptor.is_monitor {
        SensorStatus::Active
    } else {
        SensorStatus::Inactive
    }
}

fn metadata_from_descriptor(descriptor: &SensorDescriptor, now: DateTime<Utc>) -> SensorMetadata {
    SensorMetadata {
        provider_id: Some(descriptor.provider_id),
        locality: descriptor.locality.clone(),
        country: descriptor.country.clone(),
        country_code: descriptor.country_code.clone(),
        timezone: descriptor.timezone.clone(),
        parameters: descriptor.parameters.clone(),
        is_mobile: descriptor.is_mobile,
        is_monitor: descriptor.is_monitor,
        distance_m: descriptor.distance_m,
        first_updated: descriptor.first_updated,
        last_updated: descriptor.last_updated,
        instruments: descriptor.instruments.clone(),
        channels: Vec::new(),
        channels_updated_at: None,
        discovered_at: Some(now),
        last_synced_at: Some(now),
        last_readings_sync: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn sensors_without_priority_pollutants_are_filtered() {
        assert!(has_priority_parameters(&params(&["pm25", "temperature"])));
        assert!(has_priority_parameters(&params(&["co"])));
        assert!(!has_priority_parameters(&params(&[
            "temperature",
            "humidity"
        ])));
        assert!(!has_priority_parameters(&params(&[])));
    }

    #[test]
    fn sensor_type_inference_prefers_air_quality() {
        assert_eq!(
            infer_sensor_type(&params(&["pm25", "temperature"])),
            SensorType::AirQuality
        );
        assert_eq!(
            infer_sensor_type(&params(&["temperature"])),
            SensorType::Temperature
        );
        assert_eq!(
            infer_sensor_type(&params(&["humidity"])),
            SensorType::Humidity
        );
        // Nothing recognizable defaults to air quality
        assert_eq!(
            infer_sensor_type(&params(&["noise"])),
            SensorType::AirQuality
        );
    }

    #[test]
    fn discovery_metadata_snapshot_has_no_channels_yet() {
        let now = Utc::now();
        let descriptor = SensorDescriptor {
            provider_id: 2178,
            name: "Del Norte".to_string(),
            locality: Some("Albuquerque".to_string()),
            country: Some("United States".to_string()),
            country_code: Some("US".to_string()),
            latitude: Some(35.1353),
            longitude: Some(-106.5847),
            parameters: params(&["pm25", "o3"]),
            manufacturer: "AirNow".to_string(),
            is_mobile: false,
            is_monitor: true,
            first_updated: None,
            last_updated: Some(now),
            distance_m: Some(1243.7),
            timezone: Some("America/Denver".to_string()),
            instruments: vec!["government monitor".to_string()],
        };

        let metadata = metadata_from_descriptor(&descriptor, now);
        assert_eq!(metadata.provider_id, Some(2178));
        assert!(metadata.channels.is_empty());
        assert_eq!(metadata.discovered_at, Some(now));
        assert_eq!(metadata.parameters, params(&["pm25", "o3"]));
        assert_eq!(status_from_descriptor(&descriptor), SensorStatus::Active);
    }
}
