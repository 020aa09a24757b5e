use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::openaq::models::{
    self, LocationMetadata, Measurement, OpenAqEnvelope, RawLocation, RawMeasurement,
    SensorDescriptor,
};

/// Provider-side cap on radius searches (kilometers).
const MAX_RADIUS_KM: u32 = 25;

/// Provider-side cap on page size.
const MAX_PAGE_SIZE: u32 = 1000;

/// The key value shipped in .env.example; valid requests will never carry it.
const PLACEHOLDER_API_KEY: &str = "your_openaq_api_key_here";

/// Client for the OpenAQ v3 sensor-network API.
///
/// Authenticates every request with the `X-API-Key` header. Like the
/// weather client, upstream failures are recovered here and surface as
/// empty results plus an error log; only a missing API key is fatal, at
/// construction time.
pub struct OpenAqClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAqClient {
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no API key is configured. A
    /// placeholder key logs a warning but proceeds.
    pub fn new(config: &Config) -> AppResult<Self> {
        let api_key = config
            .openaq_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(crate::config::ConfigError::Missing("OPENAQ_API_KEY"))?;

        if api_key == PLACEHOLDER_API_KEY {
            tracing::warn!("OpenAQ API key appears to be a placeholder; requests will likely fail");
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            http_client,
            base_url: config.openaq_base_url.clone(),
            api_key,
        })
    }

    /// Find monitoring stations within `radius_km` of the coordinates,
    /// optionally filtered to specific parameters.
    ///
    /// Radius and limit are clamped to the provider caps (25 km, 1000 rows).
    pub async fn fetch_sensors_near_location(
        &self,
        lat: f64,
        lon: f64,
        radius_km: u32,
        parameters: Option<&[&str]>,
        limit: u32,
    ) -> Vec<SensorDescriptor> {
        let url = format!("{}/locations", self.base_url);
        let radius_m = radius_km.min(MAX_RADIUS_KM) * 1000;

        let mut query = vec![
            ("coordinates", format!("{lat},{lon}")),
            ("radius", radius_m.to_string()),
            ("limit", limit.min(MAX_PAGE_SIZE).to_string()),
        ];
        if let Some(params) = parameters.filter(|p| !p.is_empty()) {
            query.push(("parameters", params.join(",")));
        }

        let response: OpenAqEnvelope<RawLocation> = match self.get_json(&url, &query).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, lat, lon, radius_km, "Sensor search failed");
                return Vec::new();
            }
        };

        response
            .results
            .iter()
            .filter_map(models::normalize_location)
            .collect()
    }

    /// Fetch one station's metadata, including its per-parameter channel ids.
    pub async fn fetch_sensor_metadata(
        &self,
        provider_location_id: i64,
    ) -> Option<LocationMetadata> {
        let url = format!("{}/locations/{provider_location_id}", self.base_url);

        let response: OpenAqEnvelope<RawLocation> = match self.get_json(&url, &[]).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    provider_location_id,
                    "Sensor metadata fetch failed"
                );
                return None;
            }
        };

        response
            .results
            .first()
            .and_then(models::normalize_location_metadata)
    }

    /// Fetch a channel's measurements over a time range, newest-capped at
    /// `limit` (clamped to the provider page-size cap).
    pub async fn fetch_channel_measurements(
        &self,
        channel_id: i64,
        date_from: DateTime<Utc>,
        date_to: DateTime<Utc>,
        limit: u32,
    ) -> Vec<Measurement> {
        let url = format!("{}/sensors/{channel_id}/measurements", self.base_url);
        let query = [
            (
                "date_from",
                date_from.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("date_to", date_to.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("limit", limit.min(MAX_PAGE_SIZE).to_string()),
        ];

        let response: OpenAqEnvelope<RawMeasurement> = match self.get_json(&url, &query).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, channel_id, "Channel measurements fetch failed");
                return Vec::new();
            }
        };

        response
            .results
            .iter()
            .filter_map(models::normalize_measurement)
            .collect()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .header("X-API-Key", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::OpenAqApi(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::OpenAqApi(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::OpenAqApi(format!("Failed to get response text: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse OpenAQ response"
            );
            AppError::OpenAqApi(format!("Failed to parse response: {e}"))
        })
    }
}
