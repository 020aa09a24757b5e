use std::env;

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Open-Meteo API family (separate base endpoints per product)
    pub openmeteo_forecast_url: String,
    pub openmeteo_archive_url: String,
    pub openmeteo_marine_url: String,
    pub openmeteo_air_quality_url: String,
    pub openmeteo_flood_url: String,
    pub openmeteo_geocoding_url: String,

    // OpenAQ API
    pub openaq_base_url: String,
    pub openaq_api_key: Option<String>,

    // Sync settings
    pub sync_weather_interval_seconds: u64,
    pub sync_sensors_interval_seconds: u64,
    pub sync_readings_interval_seconds: u64,
    pub sync_retry_max: u32,
    pub sync_retry_delay_seconds: u64,
    pub sync_concurrent_limit: usize,
    pub sensor_search_radius_km: u32,
    pub readings_lookback_hours: i64,
    pub max_sensors_per_run: u64,

    // Upstream HTTP
    pub http_timeout_seconds: u64,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,

            // Open-Meteo API family
            openmeteo_forecast_url: env::var("OPENMETEO_FORECAST_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com/v1".to_string()),
            openmeteo_archive_url: env::var("OPENMETEO_ARCHIVE_URL")
                .unwrap_or_else(|_| "https://archive-api.open-meteo.com/v1/archive".to_string()),
            openmeteo_marine_url: env::var("OPENMETEO_MARINE_URL")
                .unwrap_or_else(|_| "https://marine-api.open-meteo.com/v1/marine".to_string()),
            openmeteo_air_quality_url: env::var("OPENMETEO_AIR_QUALITY_URL").unwrap_or_else(|_| {
                "https://air-quality-api.open-meteo.com/v1/air-quality".to_string()
            }),
            openmeteo_flood_url: env::var("OPENMETEO_FLOOD_URL")
                .unwrap_or_else(|_| "https://flood-api.open-meteo.com/v1/flood".to_string()),
            openmeteo_geocoding_url: env::var("OPENMETEO_GEOCODING_URL")
                .unwrap_or_else(|_| "https://geocoding-api.open-meteo.com/v1/search".to_string()),

            // OpenAQ API (key checked at client construction, not here, so the
            // weather sync can still start without one)
            openaq_base_url: env::var("OPENAQ_BASE_URL")
                .unwrap_or_else(|_| "https://api.openaq.org/v3".to_string()),
            openaq_api_key: env::var("OPENAQ_API_KEY").ok(),

            // Sync settings
            sync_weather_interval_seconds: env::var("SYNC_WEATHER_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .unwrap_or(900),
            sync_sensors_interval_seconds: env::var("SYNC_SENSORS_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "21600".to_string())
                .parse()
                .unwrap_or(21600),
            sync_readings_interval_seconds: env::var("SYNC_READINGS_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .unwrap_or(1800),
            sync_retry_max: env::var("SYNC_RETRY_MAX")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            sync_retry_delay_seconds: env::var("SYNC_RETRY_DELAY_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            sync_concurrent_limit: env::var("SYNC_CONCURRENT_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            sensor_search_radius_km: env::var("SENSOR_SEARCH_RADIUS_KM")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),
            readings_lookback_hours: env::var("READINGS_LOOKBACK_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()
                .unwrap_or(168),
            max_sensors_per_run: env::var("MAX_SENSORS_PER_RUN")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),

            // Upstream HTTP
            http_timeout_seconds: env::var("HTTP_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
