use chrono::{Duration, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::openmeteo::models::{
    self, AirQualityResponse, AirQualitySnapshot, ArchiveResponse, CurrentWeather, DailyHistory,
    ElevationResponse, FloodOutlook, FloodResponse, ForecastResponse, GeocodingResponse,
    GeocodingResult, HourlyForecastPoint, MarineConditions, MarineResponse,
};

/// Fields requested from the current-conditions endpoint.
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m,\
     wind_direction_10m,wind_gusts_10m,precipitation,cloud_cover,pressure_msl,visibility,\
     apparent_temperature";

const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m,\
     precipitation_probability,precipitation";

const DAILY_FIELDS: &str =
    "temperature_2m_max,temperature_2m_min,temperature_2m_mean,precipitation_sum,weather_code";

const MARINE_FIELDS: &str = "wave_height,wave_period,ocean_current_velocity";

const AIR_QUALITY_FIELDS: &str = "pm2_5,pm10,ozone,nitrogen_dioxide,sulphur_dioxide";

/// Client for the Open-Meteo API family (forecast, archive, marine,
/// air-quality, flood, elevation, geocoding).
///
/// Every fetch is one HTTP GET keyed by coordinates. Upstream failures are
/// recovered here: callers get `None`/`vec![]` and an error log, never an
/// error value. The weather sync must keep going when one product is down.
pub struct OpenMeteoClient {
    http_client: Client,
    forecast_url: String,
    archive_url: String,
    marine_url: String,
    air_quality_url: String,
    flood_url: String,
    geocoding_url: String,
}

impl OpenMeteoClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            forecast_url: config.openmeteo_forecast_url.clone(),
            archive_url: config.openmeteo_archive_url.clone(),
            marine_url: config.openmeteo_marine_url.clone(),
            air_quality_url: config.openmeteo_air_quality_url.clone(),
            flood_url: config.openmeteo_flood_url.clone(),
            geocoding_url: config.openmeteo_geocoding_url.clone(),
        }
    }

    /// Fetch current conditions (11 metrics) for the given coordinates.
    pub async fn fetch_current(&self, lat: f64, lon: f64) -> Option<CurrentWeather> {
        let url = format!("{}/forecast", self.forecast_url);
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("timezone", "UTC".to_string()),
        ];

        let response: ForecastResponse = match self.get_json(&url, &query).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, lat, lon, "Current weather fetch failed");
                return None;
            }
        };

        response.current.as_ref().map(models::normalize_current)
    }

    /// Fetch the next 24 hours of forecast data.
    pub async fn fetch_hourly_forecast(&self, lat: f64, lon: f64) -> Vec<HourlyForecastPoint> {
        let url = format!("{}/forecast", self.forecast_url);
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("forecast_days", "1".to_string()),
            ("timezone", "UTC".to_string()),
        ];

        let response: ForecastResponse = match self.get_json(&url, &query).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, lat, lon, "Hourly forecast fetch failed");
                return Vec::new();
            }
        };

        response
            .hourly
            .as_ref()
            .map(models::normalize_hourly)
            .unwrap_or_default()
    }

    /// Fetch daily history for the trailing 10-day window ending yesterday.
    pub async fn fetch_historical(&self, lat: f64, lon: f64) -> Vec<DailyHistory> {
        let today = Utc::now().date_naive();
        let start_date = today - Duration::days(10);
        let end_date = today - Duration::days(1);

        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("start_date", start_date.to_string()),
            ("end_date", end_date.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", "UTC".to_string()),
        ];

        let response: ArchiveResponse = match self.get_json(&self.archive_url, &query).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, lat, lon, "Historical weather fetch failed");
                return Vec::new();
            }
        };

        response
            .daily
            .as_ref()
            .map(models::normalize_daily)
            .unwrap_or_default()
    }

    /// Fetch current marine conditions (waves, water activity).
    pub async fn fetch_marine(&self, lat: f64, lon: f64) -> Option<MarineConditions> {
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current", MARINE_FIELDS.to_string()),
            ("timezone", "UTC".to_string()),
        ];

        let response: MarineResponse = match self.get_json(&self.marine_url, &query).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, lat, lon, "Marine weather fetch failed");
                return None;
            }
        };

        response.current.as_ref().map(models::normalize_marine)
    }

    /// Fetch the current air-quality snapshot with its derived AQI level.
    pub async fn fetch_air_quality(&self, lat: f64, lon: f64) -> Option<AirQualitySnapshot> {
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current", AIR_QUALITY_FIELDS.to_string()),
            ("timezone", "UTC".to_string()),
        ];

        let response: AirQualityResponse =
            match self.get_json(&self.air_quality_url, &query).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(error = %e, lat, lon, "Air quality fetch failed");
                    return None;
                }
            };

        response.current.as_ref().map(models::normalize_air_quality)
    }

    /// Fetch the 7-day river-discharge outlook and classify it.
    pub async fn fetch_flood_risk(&self, lat: f64, lon: f64) -> Option<FloodOutlook> {
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("daily", "river_discharge".to_string()),
            ("forecast_days", "7".to_string()),
            ("timezone", "UTC".to_string()),
        ];

        let response: FloodResponse = match self.get_json(&self.flood_url, &query).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, lat, lon, "Flood risk fetch failed");
                return None;
            }
        };

        response.daily.as_ref().and_then(models::normalize_flood)
    }

    /// Fetch elevation in meters for the given coordinates.
    pub async fn fetch_elevation(&self, lat: f64, lon: f64) -> Option<f64> {
        let url = format!("{}/elevation", self.forecast_url);
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
        ];

        let response: ElevationResponse = match self.get_json(&url, &query).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, lat, lon, "Elevation fetch failed");
                return None;
            }
        };

        response.elevation.first().copied()
    }

    /// Search locations by free-text query (geocoding). Stateless.
    pub async fn search_locations(&self, query_text: &str, limit: u32) -> Vec<GeocodingResult> {
        let query = [
            ("name", query_text.to_string()),
            ("count", limit.to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];

        let response: GeocodingResponse = match self.get_json(&self.geocoding_url, &query).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, query = query_text, "Geocoding search failed");
                return Vec::new();
            }
        };

        models::normalize_geocoding(&response)
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
            .send()
            .await
            .map_err(|e| AppError::WeatherApi(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::WeatherApi(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::WeatherApi(format!("Failed to get response text: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse Open-Meteo response"
            );
            AppError::WeatherApi(format!("Failed to parse response: {e}"))
        })
    }
}
