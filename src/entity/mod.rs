pub mod air_qualities;
pub mod alerts;
pub mod enums;
pub mod flood_risks;
pub mod historical_weathers;
pub mod hourly_forecasts;
pub mod locations;
pub mod marine_weathers;
pub mod readings;
pub mod sensor_metadata;
pub mod sensors;
pub mod weather_metrics;
