//! Open-Meteo response shapes and their normalized domain forms.
//!
//! Raw structs mirror the provider JSON (nullable everywhere); the
//! `normalize_*` functions turn them into the typed records the sync
//! pipeline persists. Provider values can be null mid-array, so every
//! column slot is an `Option`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

/// Response from `/v1/forecast` (current and hourly blocks).
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub current: Option<CurrentBlock>,
    #[serde(default)]
    pub hourly: Option<HourlyBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentBlock {
    #[serde(default)]
    pub temperature_2m: Option<f64>,
    #[serde(default)]
    pub apparent_temperature: Option<f64>,
    #[serde(default)]
    pub relative_humidity_2m: Option<f64>,
    #[serde(default)]
    pub wind_speed_10m: Option<f64>,
    #[serde(default)]
    pub wind_direction_10m: Option<f64>,
    #[serde(default)]
    pub wind_gusts_10m: Option<f64>,
    #[serde(default)]
    pub precipitation: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<i32>,
    #[serde(default)]
    pub cloud_cover: Option<f64>,
    #[serde(default)]
    pub pressure_msl: Option<f64>,
    #[serde(default)]
    pub visibility: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
}

/// Response from the archive endpoint (daily block).
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveResponse {
    #[serde(default)]
    pub daily: Option<DailyBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
}

/// Response from the marine endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MarineResponse {
    #[serde(default)]
    pub current: Option<MarineBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarineBlock {
    #[serde(default)]
    pub wave_height: Option<f64>,
    #[serde(default)]
    pub wave_period: Option<f64>,
    #[serde(default)]
    pub ocean_current_velocity: Option<f64>,
}

/// Response from the air-quality endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AirQualityResponse {
    #[serde(default)]
    pub current: Option<AirQualityBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AirQualityBlock {
    #[serde(default)]
    pub pm2_5: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
    #[serde(default)]
    pub ozone: Option<f64>,
    #[serde(default)]
    pub nitrogen_dioxide: Option<f64>,
    #[serde(default)]
    pub sulphur_dioxide: Option<f64>,
}

/// Response from the flood endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FloodResponse {
    #[serde(default)]
    pub daily: Option<FloodDailyBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FloodDailyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub river_discharge: Vec<Option<f64>>,
}

/// Response from the elevation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ElevationResponse {
    #[serde(default)]
    pub elevation: Vec<f64>,
}

/// Response from the geocoding search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingResponse {
    #[serde(default)]
    pub results: Vec<GeocodingRawResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingRawResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub admin1: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

// ---------- normalized domain forms ----------

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_gust: Option<f64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<i32>,
    pub cloud_cover: Option<f64>,
    pub pressure: Option<f64>,
    pub visibility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecastPoint {
    pub forecast_time: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub weather_code: Option<i32>,
    pub wind_speed: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub precipitation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyHistory {
    pub weather_date: NaiveDate,
    pub max_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub total_precipitation: Option<f64>,
    pub weather_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarineConditions {
    pub wave_height: Option<f64>,
    pub wave_period: Option<f64>,
    /// Ocean current velocity, stored as the water activity proxy.
    pub water_temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AirQualitySnapshot {
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub o3: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    /// Coarse 1-5 index derived from PM2.5.
    pub aqi_level: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloodOutlook {
    pub flood_probability: f64,
    pub flood_severity: &'static str,
    pub flood_description: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodingResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub timezone: Option<String>,
}

// ---------- normalization ----------

/// Open-Meteo timestamps arrive as `2026-08-06T14:00` (no offset) because
/// all requests pin `timezone=UTC`.
fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}

#[must_use]
pub fn normalize_current(block: &CurrentBlock) -> CurrentWeather {
    CurrentWeather {
        temperature: block.temperature_2m,
        feels_like: block.apparent_temperature,
        humidity: block.relative_humidity_2m,
        wind_speed: block.wind_speed_10m,
        wind_direction: block.wind_direction_10m,
        wind_gust: block.wind_gusts_10m,
        precipitation: block.precipitation,
        weather_code: block.weather_code,
        cloud_cover: block.cloud_cover,
        pressure: block.pressure_msl,
        visibility: block.visibility,
    }
}

#[must_use]
pub fn normalize_hourly(block: &HourlyBlock) -> Vec<HourlyForecastPoint> {
    block
        .time
        .iter()
        .enumerate()
        .filter_map(|(idx, time)| {
            let forecast_time = parse_time(time)?;
            Some(HourlyForecastPoint {
                forecast_time,
                temperature: block.temperature_2m.get(idx).copied().flatten(),
                humidity: block.relative_humidity_2m.get(idx).copied().flatten(),
                weather_code: block.weather_code.get(idx).copied().flatten(),
                wind_speed: block.wind_speed_10m.get(idx).copied().flatten(),
                precipitation_probability: block
                    .precipitation_probability
                    .get(idx)
                    .copied()
                    .flatten(),
                precipitation: block.precipitation.get(idx).copied().flatten(),
            })
        })
        .collect()
}

#[must_use]
pub fn normalize_daily(block: &DailyBlock) -> Vec<DailyHistory> {
    block
        .time
        .iter()
        .enumerate()
        .filter_map(|(idx, date)| {
            let weather_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            Some(DailyHistory {
                weather_date,
                max_temperature: block.temperature_2m_max.get(idx).copied().flatten(),
                min_temperature: block.temperature_2m_min.get(idx).copied().flatten(),
                avg_temperature: block.temperature_2m_mean.get(idx).copied().flatten(),
                total_precipitation: block.precipitation_sum.get(idx).copied().flatten(),
                weather_code: block.weather_code.get(idx).copied().flatten(),
            })
        })
        .collect()
}

#[must_use]
pub fn normalize_marine(block: &MarineBlock) -> MarineConditions {
    MarineConditions {
        wave_height: block.wave_height,
        wave_period: block.wave_period,
        water_temperature: block.ocean_current_velocity,
    }
}

#[must_use]
pub fn normalize_air_quality(block: &AirQualityBlock) -> AirQualitySnapshot {
    AirQualitySnapshot {
        pm2_5: block.pm2_5,
        pm10: block.pm10,
        o3: block.ozone,
        no2: block.nitrogen_dioxide,
        so2: block.sulphur_dioxide,
        aqi_level: aqi_level(block.pm2_5.unwrap_or(0.0)),
    }
}

/// Coarse 1-5 air-quality index derived from PM2.5.
///
/// Distinct from the six-tier EPA health classification applied to sensor
/// readings; this scheme feeds the general air-quality snapshots.
#[must_use]
pub fn aqi_level(pm2_5: f64) -> i16 {
    if pm2_5 <= 12.0 {
        1
    } else if pm2_5 <= 35.4 {
        2
    } else if pm2_5 <= 55.4 {
        3
    } else if pm2_5 <= 150.4 {
        4
    } else {
        5
    }
}

/// Normalizer for converting river discharge (m³/s) into a 0-1 probability.
const DISCHARGE_NORMALIZER: f64 = 1000.0;

/// Derive the flood outlook from the first forward day of river discharge.
#[must_use]
pub fn normalize_flood(block: &FloodDailyBlock) -> Option<FloodOutlook> {
    let discharge = block.river_discharge.iter().copied().flatten().next()?;
    let probability = (discharge / DISCHARGE_NORMALIZER).min(1.0);

    let (severity, description) = if probability <= 0.2 {
        ("low", "Low flood probability")
    } else if probability <= 0.5 {
        ("moderate", "Moderate flood probability - Monitor situation")
    } else {
        ("high", "High flood probability - Take precautions")
    };

    Some(FloodOutlook {
        flood_probability: probability,
        flood_severity: severity,
        flood_description: description,
    })
}

#[must_use]
pub fn normalize_geocoding(response: &GeocodingResponse) -> Vec<GeocodingResult> {
    response
        .results
        .iter()
        .map(|raw| {
            let mut parts = vec![raw.name.clone()];
            if let Some(admin1) = &raw.admin1 {
                parts.push(admin1.clone());
            }
            if let Some(country) = &raw.country {
                parts.push(country.clone());
            }
            GeocodingResult {
                name: parts.join(", "),
                latitude: raw.latitude,
                longitude: raw.longitude,
                country: raw.country.clone(),
                timezone: raw.timezone.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_normalization_keeps_all_24_entries() {
        let times: Vec<String> = (0..24).map(|h| format!("2026-08-06T{h:02}:00")).collect();
        let block = HourlyBlock {
            time: times,
            temperature_2m: (0..24).map(|h| Some(f64::from(h))).collect(),
            relative_humidity_2m: vec![Some(50.0); 24],
            weather_code: vec![Some(3); 24],
            wind_speed_10m: vec![Some(12.5); 24],
            precipitation_probability: vec![None; 24],
            precipitation: vec![Some(0.0); 24],
        };

        let points = normalize_hourly(&block);
        assert_eq!(points.len(), 24);
        assert_eq!(points[5].temperature, Some(5.0));
        assert_eq!(points[0].precipitation_probability, None);
        assert!(points[23].forecast_time > points[0].forecast_time);
    }

    #[test]
    fn hourly_normalization_skips_unparseable_times() {
        let block = HourlyBlock {
            time: vec!["not-a-time".to_string(), "2026-08-06T01:00".to_string()],
            temperature_2m: vec![Some(1.0), Some(2.0)],
            ..Default::default()
        };
        let points = normalize_hourly(&block);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].temperature, Some(2.0));
    }

    #[test]
    fn aqi_level_buckets_match_pm25_breakpoints() {
        assert_eq!(aqi_level(0.0), 1);
        assert_eq!(aqi_level(12.0), 1);
        assert_eq!(aqi_level(12.1), 2);
        assert_eq!(aqi_level(35.4), 2);
        assert_eq!(aqi_level(55.4), 3);
        assert_eq!(aqi_level(150.4), 4);
        assert_eq!(aqi_level(150.5), 5);
    }

    #[test]
    fn flood_outlook_normalizes_and_classifies_discharge() {
        let block = FloodDailyBlock {
            time: vec!["2026-08-06".to_string()],
            river_discharge: vec![Some(150.0), Some(900.0)],
        };
        let outlook = normalize_flood(&block).unwrap();
        assert!((outlook.flood_probability - 0.15).abs() < 1e-9);
        assert_eq!(outlook.flood_severity, "low");

        let moderate = normalize_flood(&FloodDailyBlock {
            time: vec![],
            river_discharge: vec![Some(450.0)],
        })
        .unwrap();
        assert_eq!(moderate.flood_severity, "moderate");

        let high = normalize_flood(&FloodDailyBlock {
            time: vec![],
            river_discharge: vec![Some(2500.0)],
        })
        .unwrap();
        assert_eq!(high.flood_severity, "high");
        assert!((high.flood_probability - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn flood_outlook_requires_discharge_data() {
        assert!(normalize_flood(&FloodDailyBlock::default()).is_none());
        // Leading nulls are skipped, not treated as zero discharge
        let with_null = FloodDailyBlock {
            time: vec![],
            river_discharge: vec![None, Some(600.0)],
        };
        assert_eq!(normalize_flood(&with_null).unwrap().flood_severity, "high");
    }

    #[test]
    fn geocoding_name_includes_admin_region_and_country() {
        let response: GeocodingResponse = serde_json::from_str(
            r#"{"results": [{
                "name": "San Francisco",
                "latitude": 37.7749,
                "longitude": -122.4194,
                "country": "United States",
                "admin1": "California",
                "timezone": "America/Los_Angeles"
            }]}"#,
        )
        .unwrap();

        let results = normalize_geocoding(&response);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "San Francisco, California, United States");
        assert_eq!(results[0].timezone.as_deref(), Some("America/Los_Angeles"));
    }
}
