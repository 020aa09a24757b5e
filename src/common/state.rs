use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::notify::SharedNotifier;
use crate::openaq::OpenAqClient;
use crate::openmeteo::OpenMeteoClient;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub weather_client: Arc<OpenMeteoClient>,
    /// Absent when no OpenAQ API key is configured; the sensor and reading
    /// syncs refuse to start in that case, weather sync still runs.
    pub openaq_client: Option<Arc<OpenAqClient>>,
    pub notifier: SharedNotifier,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        config: Config,
        weather_client: OpenMeteoClient,
        openaq_client: Option<OpenAqClient>,
        notifier: SharedNotifier,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            weather_client: Arc::new(weather_client),
            openaq_client: openaq_client.map(Arc::new),
            notifier,
        }
    }
}
