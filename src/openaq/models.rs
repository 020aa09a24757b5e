//! OpenAQ v3 response shapes and their normalized domain forms.
//!
//! The v3 API nests most interesting values (`country.name`,
//! `parameter.name`, `period.datetimeFrom.utc`) and has shipped two shapes
//! for a location's parameter list (`sensors` and `parameters` arrays), so
//! normalization takes the union of both.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Generic `{ results: [...] }` envelope around every v3 endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAqEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCountry {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProvider {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCoordinates {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInstrument {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawParameter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
}

/// Entry of a location's `sensors` array: one measurement channel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSensor {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub parameter: Option<RawParameter>,
}

/// Entry of the alternative `parameters` array shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawParameterEntry {
    #[serde(default)]
    pub parameter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDatetime {
    #[serde(default)]
    pub utc: Option<String>,
}

/// A location resource from `/locations` (radius search or by id).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub country: Option<RawCountry>,
    #[serde(default)]
    pub provider: Option<RawProvider>,
    #[serde(default, rename = "isMobile")]
    pub is_mobile: bool,
    #[serde(default, rename = "isMonitor")]
    pub is_monitor: bool,
    #[serde(default)]
    pub coordinates: Option<RawCoordinates>,
    #[serde(default)]
    pub instruments: Vec<RawInstrument>,
    #[serde(default)]
    pub sensors: Vec<RawSensor>,
    #[serde(default)]
    pub parameters: Vec<RawParameterEntry>,
    #[serde(default, rename = "datetimeFirst")]
    pub datetime_first: Option<RawDatetime>,
    #[serde(default, rename = "datetimeLast")]
    pub datetime_last: Option<RawDatetime>,
    #[serde(default)]
    pub distance: Option<f64>,
}

/// A measurement resource from `/sensors/{id}/measurements`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMeasurement {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub parameter: Option<RawParameter>,
    #[serde(default)]
    pub period: Option<RawPeriod>,
    #[serde(default, rename = "flagInfo")]
    pub flag_info: Option<RawFlagInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPeriod {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default, rename = "datetimeFrom")]
    pub datetime_from: Option<RawDatetime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFlagInfo {
    #[serde(default, rename = "hasFlags")]
    pub has_flags: bool,
}

// ---------- normalized domain forms ----------

/// A monitoring station near a location, as discovered by radius search.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorDescriptor {
    pub provider_id: i64,
    pub name: String,
    pub locality: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Parameter names the station exposes (e.g. "pm25", "o3").
    pub parameters: Vec<String>,
    pub manufacturer: String,
    pub is_mobile: bool,
    pub is_monitor: bool,
    pub first_updated: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Distance from the search point, in meters.
    pub distance_m: Option<f64>,
    pub timezone: Option<String>,
    pub instruments: Vec<String>,
}

/// One per-parameter measurement channel of a station.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorChannel {
    pub channel_id: i64,
    pub parameter: String,
    pub unit: Option<String>,
}

/// Station metadata including the channel list needed for measurement fetches.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationMetadata {
    pub provider_id: i64,
    pub name: Option<String>,
    pub locality: Option<String>,
    pub country: Option<String>,
    pub channels: Vec<SensorChannel>,
}

/// One normalized measurement from a channel's time series.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub parameter: String,
    pub unit: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub period_label: Option<String>,
    pub interval: Option<String>,
    pub has_flags: bool,
}

// ---------- normalization ----------

fn parse_datetime(raw: Option<&RawDatetime>) -> Option<DateTime<Utc>> {
    raw.and_then(|d| d.utc.as_deref())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Union of the two parameter-list shapes v3 has shipped.
#[must_use]
pub fn extract_parameters(location: &RawLocation) -> Vec<String> {
    let mut params: Vec<String> = location
        .sensors
        .iter()
        .filter_map(|s| s.parameter.as_ref().and_then(|p| p.name.clone()))
        .chain(
            location
                .parameters
                .iter()
                .filter_map(|p| p.parameter.clone()),
        )
        .collect();
    params.sort();
    params.dedup();
    params
}

#[must_use]
pub fn normalize_location(location: &RawLocation) -> Option<SensorDescriptor> {
    let provider_id = location.id?;
    let provider_name = location
        .provider
        .as_ref()
        .and_then(|p| p.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    Some(SensorDescriptor {
        provider_id,
        name: location
            .name
            .clone()
            .unwrap_or_else(|| format!("OpenAQ location {provider_id}")),
        locality: location.locality.clone(),
        country: location.country.as_ref().and_then(|c| c.name.clone()),
        country_code: location.country.as_ref().and_then(|c| c.code.clone()),
        latitude: location.coordinates.as_ref().and_then(|c| c.latitude),
        longitude: location.coordinates.as_ref().and_then(|c| c.longitude),
        parameters: extract_parameters(location),
        manufacturer: provider_name,
        is_mobile: location.is_mobile,
        is_monitor: location.is_monitor,
        first_updated: parse_datetime(location.datetime_first.as_ref()),
        last_updated: parse_datetime(location.datetime_last.as_ref()),
        distance_m: location.distance,
        timezone: location.timezone.clone(),
        instruments: location
            .instruments
            .iter()
            .filter_map(|i| i.name.clone())
            .collect(),
    })
}

#[must_use]
pub fn normalize_location_metadata(location: &RawLocation) -> Option<LocationMetadata> {
    let provider_id = location.id?;
    let channels = location
        .sensors
        .iter()
        .filter_map(|s| {
            let channel_id = s.id?;
            let parameter = s.parameter.as_ref().and_then(|p| p.name.clone())?;
            Some(SensorChannel {
                channel_id,
                parameter,
                unit: s.parameter.as_ref().and_then(|p| p.units.clone()),
            })
        })
        .collect();

    Some(LocationMetadata {
        provider_id,
        name: location.name.clone(),
        locality: location.locality.clone(),
        country: location.country.as_ref().and_then(|c| c.name.clone()),
        channels,
    })
}

#[must_use]
pub fn normalize_measurement(raw: &RawMeasurement) -> Option<Measurement> {
    let value = raw.value?;
    let parameter = raw.parameter.as_ref().and_then(|p| p.name.clone())?;

    Some(Measurement {
        value,
        parameter,
        unit: raw.parameter.as_ref().and_then(|p| p.units.clone()),
        recorded_at: parse_datetime(raw.period.as_ref().and_then(|p| p.datetime_from.as_ref())),
        period_label: raw.period.as_ref().and_then(|p| p.label.clone()),
        interval: raw.period.as_ref().and_then(|p| p.interval.clone()),
        has_flags: raw.flag_info.as_ref().is_some_and(|f| f.has_flags),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCATION_JSON: &str = r#"{
        "id": 2178,
        "name": "Del Norte",
        "locality": "Albuquerque",
        "timezone": "America/Denver",
        "country": {"code": "US", "name": "United States"},
        "provider": {"name": "AirNow"},
        "isMobile": false,
        "isMonitor": true,
        "coordinates": {"latitude": 35.1353, "longitude": -106.5847},
        "instruments": [{"name": "government monitor"}],
        "sensors": [
            {"id": 1001, "parameter": {"name": "pm25", "units": "µg/m³"}},
            {"id": 1002, "parameter": {"name": "o3", "units": "ppm"}}
        ],
        "datetimeFirst": {"utc": "2016-03-06T19:00:00Z"},
        "datetimeLast": {"utc": "2026-08-05T12:00:00Z"},
        "distance": 1243.7
    }"#;

    #[test]
    fn location_normalizes_to_descriptor() {
        let raw: RawLocation = serde_json::from_str(LOCATION_JSON).unwrap();
        let descriptor = normalize_location(&raw).unwrap();

        assert_eq!(descriptor.provider_id, 2178);
        assert_eq!(descriptor.name, "Del Norte");
        assert_eq!(descriptor.parameters, vec!["o3", "pm25"]);
        assert_eq!(descriptor.manufacturer, "AirNow");
        assert!(descriptor.is_monitor);
        assert_eq!(descriptor.country_code.as_deref(), Some("US"));
        assert_eq!(descriptor.distance_m, Some(1243.7));
        assert!(descriptor.first_updated.unwrap() < descriptor.last_updated.unwrap());
    }

    #[test]
    fn parameters_union_covers_both_v3_shapes() {
        let raw: RawLocation = serde_json::from_str(
            r#"{
                "id": 99,
                "sensors": [{"id": 5, "parameter": {"name": "pm25"}}],
                "parameters": [{"parameter": "pm10"}, {"parameter": "pm25"}]
            }"#,
        )
        .unwrap();

        assert_eq!(extract_parameters(&raw), vec!["pm10", "pm25"]);
    }

    #[test]
    fn location_metadata_yields_per_parameter_channels() {
        let raw: RawLocation = serde_json::from_str(LOCATION_JSON).unwrap();
        let metadata = normalize_location_metadata(&raw).unwrap();

        assert_eq!(metadata.provider_id, 2178);
        assert_eq!(metadata.channels.len(), 2);
        assert_eq!(metadata.channels[0].channel_id, 1001);
        assert_eq!(metadata.channels[0].parameter, "pm25");
        assert_eq!(metadata.channels[0].unit.as_deref(), Some("µg/m³"));
    }

    #[test]
    fn measurement_normalizes_period_fields() {
        let raw: RawMeasurement = serde_json::from_str(
            r#"{
                "value": 9.3,
                "parameter": {"name": "pm25", "units": "µg/m³"},
                "period": {
                    "label": "1hour",
                    "interval": "01:00:00",
                    "datetimeFrom": {"utc": "2026-08-05T11:00:00Z"}
                },
                "flagInfo": {"hasFlags": false}
            }"#,
        )
        .unwrap();

        let m = normalize_measurement(&raw).unwrap();
        assert_eq!(m.value, 9.3);
        assert_eq!(m.parameter, "pm25");
        assert_eq!(m.period_label.as_deref(), Some("1hour"));
        assert!(!m.has_flags);
        assert!(m.recorded_at.is_some());
    }

    #[test]
    fn measurement_without_value_or_parameter_is_dropped() {
        let no_value: RawMeasurement =
            serde_json::from_str(r#"{"parameter": {"name": "pm25"}}"#).unwrap();
        assert!(normalize_measurement(&no_value).is_none());

        let no_parameter: RawMeasurement = serde_json::from_str(r#"{"value": 4.2}"#).unwrap();
        assert!(normalize_measurement(&no_parameter).is_none());
    }

    #[test]
    fn envelope_tolerates_missing_results() {
        let envelope: OpenAqEnvelope<RawLocation> =
            serde_json::from_str(r#"{"meta": {"found": 0}}"#).unwrap();
        assert!(envelope.results.is_empty());
    }
}
