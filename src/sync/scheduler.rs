use std::time::Duration;
use tokio::time::interval;

use crate::common::AppState;
use crate::sync::{readings, sensors, weather};

/// Run the weather sync task on a schedule.
pub async fn run_weather_sync(state: AppState) {
    let interval_secs = state.config.sync_weather_interval_seconds;
    let retry_delay_secs = state.config.sync_retry_delay_seconds;
    let max_retries = state.config.sync_retry_max;

    tracing::info!(interval_secs, "Starting weather sync scheduler");

    let mut ticker = interval(Duration::from_secs(interval_secs));

    // Run initial sync immediately
    ticker.tick().await;

    loop {
        tracing::debug!("Running weather sync...");

        let mut retries = 0;
        loop {
            match weather::sync_weather(
                &state.db,
                &state.weather_client,
                state.notifier.as_ref(),
                state.config.sync_concurrent_limit,
            )
            .await
            {
                Ok(locations) => {
                    tracing::debug!(locations, "Weather sync completed successfully");
                    break;
                }
                Err(e) => {
                    retries += 1;
                    if retries <= max_retries {
                        tracing::error!(
                            error = %e,
                            retry = retries,
                            max_retries,
                            "Weather sync failed, retrying"
                        );
                        tokio::time::sleep(Duration::from_secs(retry_delay_secs)).await;
                    } else {
                        tracing::error!(
                            error = %e,
                            max_retries,
                            "Weather sync failed after max retries"
                        );
                        break;
                    }
                }
            }
        }

        // Wait for next tick
        ticker.tick().await;
    }
}

/// Run the sensor discovery task on a schedule.
///
/// Refuses to start when no OpenAQ client is configured.
pub async fn run_sensor_discovery(state: AppState) {
    let Some(openaq) = state.openaq_client.clone() else {
        tracing::error!("No OpenAQ API key configured, sensor discovery will not run");
        return;
    };

    let interval_secs = state.config.sync_sensors_interval_seconds;
    let retry_delay_secs = state.config.sync_retry_delay_seconds;
    let max_retries = state.config.sync_retry_max;
    let radius_km = state.config.sensor_search_radius_km;

    tracing::info!(interval_secs, radius_km, "Starting sensor discovery scheduler");

    let mut ticker = interval(Duration::from_secs(interval_secs));

    // Run initial discovery immediately
    ticker.tick().await;

    loop {
        tracing::debug!("Running sensor discovery...");

        let mut retries = 0;
        loop {
            match sensors::sync_sensors(
                &state.db,
                &openaq,
                state.notifier.as_ref(),
                radius_km,
                None,
            )
            .await
            {
                Ok(stats) => {
                    tracing::debug!(
                        synced = stats.synced,
                        created = stats.created,
                        updated = stats.updated,
                        "Sensor discovery completed successfully"
                    );
                    break;
                }
                Err(e) => {
                    retries += 1;
                    if retries <= max_retries {
                        tracing::error!(
                            error = %e,
                            retry = retries,
                            max_retries,
                            "Sensor discovery failed, retrying"
                        );
                        tokio::time::sleep(Duration::from_secs(retry_delay_secs)).await;
                    } else {
                        tracing::error!(
                            error = %e,
                            max_retries,
                            "Sensor discovery failed after max retries"
                        );
                        break;
                    }
                }
            }
        }

        // Wait for next tick
        ticker.tick().await;
    }
}

/// Run the readings sync task on a schedule.
///
/// Refuses to start when no OpenAQ client is configured.
pub async fn run_readings_sync(state: AppState) {
    let Some(openaq) = state.openaq_client.clone() else {
        tracing::error!("No OpenAQ API key configured, readings sync will not run");
        return;
    };

    let interval_secs = state.config.sync_readings_interval_seconds;
    let retry_delay_secs = state.config.sync_retry_delay_seconds;
    let max_retries = state.config.sync_retry_max;

    tracing::info!(interval_secs, "Starting readings sync scheduler");

    let mut ticker = interval(Duration::from_secs(interval_secs));

    // Run initial sync immediately
    ticker.tick().await;

    loop {
        tracing::debug!("Running readings sync...");

        let mut retries = 0;
        loop {
            match readings::sync_readings(
                &state.db,
                &openaq,
                state.notifier.as_ref(),
                state.config.readings_lookback_hours,
                state.config.sync_concurrent_limit,
                state.config.max_sensors_per_run,
                None,
            )
            .await
            {
                Ok(stats) => {
                    tracing::debug!(
                        sensors = stats.sensors,
                        readings = stats.readings,
                        "Readings sync completed successfully"
                    );
                    break;
                }
                Err(e) => {
                    retries += 1;
                    if retries <= max_retries {
                        tracing::error!(
                            error = %e,
                            retry = retries,
                            max_retries,
                            "Readings sync failed, retrying"
                        );
                        tokio::time::sleep(Duration::from_secs(retry_delay_secs)).await;
                    } else {
                        tracing::error!(
                            error = %e,
                            max_retries,
                            "Readings sync failed after max retries"
                        );
                        break;
                    }
                }
            }
        }

        // Wait for next tick
        ticker.tick().await;
    }
}
