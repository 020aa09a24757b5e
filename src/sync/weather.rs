//! Weather sync: per location, fetch and persist every Open-Meteo product.
//!
//! Each of the seven sub-syncs is isolated; one product's failure (marine
//! API down, say) never blocks the remaining six for that location, and one
//! location's failure never blocks the others.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::entity::{
    air_qualities, flood_risks, historical_weathers, hourly_forecasts, locations, marine_weathers,
    weather_metrics,
};
use crate::error::AppResult;
use crate::notify::{topics, Notifier};
use crate::openmeteo::OpenMeteoClient;
use crate::store;

/// Sync weather for every monitored location, concurrently up to
/// `concurrent_limit`. Returns the number of locations processed.
///
/// # Errors
///
/// Returns an error only when the location query fails (cycle-level).
pub async fn sync_weather(
    db: &DatabaseConnection,
    weather: &OpenMeteoClient,
    notifier: &dyn Notifier,
    concurrent_limit: usize,
) -> AppResult<u64> {
    let targets = store::location_targets(db, None).await?;
    let count = targets.len() as u64;

    tracing::info!(locations = count, "Starting comprehensive weather sync");

    stream::iter(targets)
        .for_each_concurrent(concurrent_limit.max(1), |location| async move {
            sync_location_weather(db, weather, notifier, &location).await;
        })
        .await;

    tracing::info!("Comprehensive weather sync completed");

    Ok(count)
}

/// Run all seven sub-syncs for one location, then fan out notifications.
/// Partial failure still notifies: whatever was stored should reach the UI.
async fn sync_location_weather(
    db: &DatabaseConnection,
    weather: &OpenMeteoClient,
    notifier: &dyn Notifier,
    location: &locations::Model,
) {
    if let Err(e) = sync_current(db, weather, location).await {
        tracing::error!(location = %location.name, error = %e, "Current weather sync failed");
    }
    if let Err(e) = sync_hourly_forecast(db, weather, location).await {
        tracing::error!(location = %location.name, error = %e, "Hourly forecast sync failed");
    }
    if let Err(e) = sync_historical(db, weather, location).await {
        tracing::error!(location = %location.name, error = %e, "Historical weather sync failed");
    }
    if let Err(e) = sync_marine(db, weather, location).await {
        tracing::error!(location = %location.name, error = %e, "Marine weather sync failed");
    }
    if let Err(e) = sync_air_quality(db, weather, location).await {
        tracing::error!(location = %location.name, error = %e, "Air quality sync failed");
    }
    if let Err(e) = sync_flood_risk(db, weather, location).await {
        tracing::error!(location = %location.name, error = %e, "Flood risk sync failed");
    }
    if let Err(e) = backfill_elevation(db, weather, location).await {
        tracing::error!(location = %location.name, error = %e, "Elevation backfill failed");
    }

    let payload = serde_json::json!({"location_id": location.id});
    notifier.publish(topics::LOCATION_UPDATES, payload.clone());
    for chart in topics::CHARTS {
        notifier.publish(chart, payload.clone());
    }
}

async fn sync_current(
    db: &DatabaseConnection,
    weather: &OpenMeteoClient,
    location: &locations::Model,
) -> AppResult<()> {
    let Some(current) = weather
        .fetch_current(location.latitude, location.longitude)
        .await
    else {
        return Ok(());
    };

    let now = Utc::now();
    let metric = weather_metrics::ActiveModel {
        id: Set(Uuid::new_v4()),
        location_id: Set(location.id),
        temperature: Set(current.temperature),
        feels_like: Set(current.feels_like),
        humidity: Set(current.humidity),
        wind_speed: Set(current.wind_speed),
        wind_direction: Set(current.wind_direction),
        wind_gust: Set(current.wind_gust),
        precipitation: Set(current.precipitation),
        weather_code: Set(current.weather_code),
        cloud_cover: Set(current.cloud_cover),
        pressure: Set(current.pressure),
        visibility: Set(current.visibility),
        recorded_at: Set(now.into()),
        created_at: Set(Some(now.into())),
    };
    metric.insert(db).await?;

    tracing::info!(location = %location.name, "Current weather synced");
    Ok(())
}

async fn sync_hourly_forecast(
    db: &DatabaseConnection,
    weather: &OpenMeteoClient,
    location: &locations::Model,
) -> AppResult<()> {
    let points = weather
        .fetch_hourly_forecast(location.latitude, location.longitude)
        .await;
    if points.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let point_count = points.len();
    let models: Vec<hourly_forecasts::ActiveModel> = points
        .into_iter()
        .map(|p| hourly_forecasts::ActiveModel {
            id: Set(Uuid::new_v4()),
            location_id: Set(location.id),
            forecast_time: Set(p.forecast_time.into()),
            temperature: Set(p.temperature),
            humidity: Set(p.humidity),
            weather_code: Set(p.weather_code),
            wind_speed: Set(p.wind_speed),
            precipitation_probability: Set(p.precipitation_probability),
            precipitation: Set(p.precipitation),
            created_at: Set(Some(now.into())),
        })
        .collect();

    // "None of the records are inserted" is expected from ON CONFLICT DO
    // NOTHING when the whole batch already exists
    if let Err(e) = hourly_forecasts::Entity::insert_many(models)
        .on_conflict(
            sea_orm::sea_query::OnConflict::columns([
                hourly_forecasts::Column::LocationId,
                hourly_forecasts::Column::ForecastTime,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(db)
        .await
    {
        let msg = e.to_string();
        if !msg.contains("None of the records") && !msg.contains("duplicate") {
            return Err(e.into());
        }
    }

    tracing::info!(
        location = %location.name,
        hours = point_count,
        "Hourly forecast synced"
    );
    Ok(())
}

async fn sync_historical(
    db: &DatabaseConnection,
    weather: &OpenMeteoClient,
    location: &locations::Model,
) -> AppResult<()> {
    let days = weather
        .fetch_historical(location.latitude, location.longitude)
        .await;
    if days.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let day_count = days.len();
    let models: Vec<historical_weathers::ActiveModel> = days
        .into_iter()
        .map(|d| historical_weathers::ActiveModel {
            id: Set(Uuid::new_v4()),
            location_id: Set(location.id),
            weather_date: Set(d.weather_date),
            max_temperature: Set(d.max_temperature),
            min_temperature: Set(d.min_temperature),
            avg_temperature: Set(d.avg_temperature),
            total_precipitation: Set(d.total_precipitation),
            weather_code: Set(d.weather_code),
            created_at: Set(Some(now.into())),
        })
        .collect();

    if let Err(e) = historical_weathers::Entity::insert_many(models)
        .on_conflict(
            sea_orm::sea_query::OnConflict::columns([
                historical_weathers::Column::LocationId,
                historical_weathers::Column::WeatherDate,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(db)
        .await
    {
        let msg = e.to_string();
        if !msg.contains("None of the records") && !msg.contains("duplicate") {
            return Err(e.into());
        }
    }

    tracing::info!(
        location = %location.name,
        days = day_count,
        "Historical weather synced"
    );
    Ok(())
}

async fn sync_marine(
    db: &DatabaseConnection,
    weather: &OpenMeteoClient,
    location: &locations::Model,
) -> AppResult<()> {
    let Some(marine) = weather
        .fetch_marine(location.latitude, location.longitude)
        .await
    else {
        return Ok(());
    };

    let now = Utc::now();
    let row = marine_weathers::ActiveModel {
        id: Set(Uuid::new_v4()),
        location_id: Set(location.id),
        wave_height: Set(marine.wave_height),
        wave_period: Set(marine.wave_period),
        water_temperature: Set(marine.water_temperature),
        recorded_at: Set(now.into()),
        created_at: Set(Some(now.into())),
    };
    row.insert(db).await?;

    tracing::info!(location = %location.name, "Marine weather synced");
    Ok(())
}

async fn sync_air_quality(
    db: &DatabaseConnection,
    weather: &OpenMeteoClient,
    location: &locations::Model,
) -> AppResult<()> {
    let Some(air) = weather
        .fetch_air_quality(location.latitude, location.longitude)
        .await
    else {
        return Ok(());
    };

    let now = Utc::now();
    let row = air_qualities::ActiveModel {
        id: Set(Uuid::new_v4()),
        location_id: Set(location.id),
        pm2_5: Set(air.pm2_5),
        pm10: Set(air.pm10),
        o3: Set(air.o3),
        no2: Set(air.no2),
        so2: Set(air.so2),
        aqi_level: Set(Some(air.aqi_level)),
        recorded_at: Set(now.into()),
        created_at: Set(Some(now.into())),
    };
    row.insert(db).await?;

    tracing::info!(location = %location.name, "Air quality synced");
    Ok(())
}

async fn sync_flood_risk(
    db: &DatabaseConnection,
    weather: &OpenMeteoClient,
    location: &locations::Model,
) -> AppResult<()> {
    let Some(outlook) = weather
        .fetch_flood_risk(location.latitude, location.longitude)
        .await
    else {
        return Ok(());
    };

    let now = Utc::now();
    let row = flood_risks::ActiveModel {
        id: Set(Uuid::new_v4()),
        location_id: Set(location.id),
        flood_probability: Set(outlook.flood_probability),
        flood_severity: Set(outlook.flood_severity.to_string()),
        flood_description: Set(outlook.flood_description.to_string()),
        recorded_at: Set(now.into()),
        created_at: Set(Some(now.into())),
    };
    row.insert(db).await?;

    tracing::info!(location = %location.name, "Flood risk synced");
    Ok(())
}

/// One-time elevation backfill; skipped once the location has a value.
async fn backfill_elevation(
    db: &DatabaseConnection,
    weather: &OpenMeteoClient,
    location: &locations::Model,
) -> AppResult<()> {
    if location.elevation.is_some() {
        return Ok(());
    }

    let Some(elevation) = weather
        .fetch_elevation(location.latitude, location.longitude)
        .await
    else {
        return Ok(());
    };

    let mut model: locations::ActiveModel = location.clone().into();
    model.elevation = Set(Some(elevation));
    model.updated_at = Set(Some(Utc::now().into()));
    model.update(db).await?;

    tracing::info!(location = %location.name, elevation, "Elevation updated");
    Ok(())
}
