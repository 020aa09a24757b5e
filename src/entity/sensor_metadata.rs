//! Typed view of the `environmental_sensors.metadata` jsonb column.
//!
//! This is the single place provider identifiers are cached. Internal code
//! always works with this struct; serialization to the schemaless column
//! happens only at the persistence boundary. Updates must merge: channel
//! ids discovered on an earlier sync must survive later metadata refreshes.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::Json;
use serde::{Deserialize, Serialize};

/// Provider-assigned identifier for one (sensor, parameter) measurement
/// stream, required to fetch that stream's time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub channel_id: i64,
    pub parameter: String,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorMetadata {
    /// OpenAQ location id the sensor record was imported from.
    pub provider_id: Option<i64>,
    pub locality: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub timezone: Option<String>,
    pub parameters: Vec<String>,
    pub is_mobile: bool,
    pub is_monitor: bool,
    /// Distance from the monitored location at discovery time, in meters.
    pub distance_m: Option<f64>,
    pub first_updated: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub instruments: Vec<String>,
    /// Per-parameter measurement channels, resolved lazily after discovery.
    pub channels: Vec<ChannelRef>,
    pub channels_updated_at: Option<DateTime<Utc>>,
    pub discovered_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_readings_sync: Option<DateTime<Utc>>,
}

impl SensorMetadata {
    /// Deserialize from the stored jsonb value, tolerating missing fields
    /// and legacy shapes (anything unreadable becomes the default).
    #[must_use]
    pub fn from_json(value: &Json) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).unwrap_or_else(|_| Json::Object(serde_json::Map::new()))
    }

    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.channels.is_empty()
    }

    /// Merge a fresh discovery snapshot into the cached record.
    ///
    /// Discovery fields are overwritten with the latest values, but anything
    /// the snapshot cannot know (resolved channels, first discovery time,
    /// reading-sync stamps) is retained.
    pub fn merge_discovery(&mut self, fresh: Self, now: DateTime<Utc>) {
        let retained_channels = std::mem::take(&mut self.channels);
        let retained_channels_at = self.channels_updated_at.take();
        let retained_discovered = self.discovered_at.take();
        let retained_readings_sync = self.last_readings_sync.take();

        *self = fresh;

        if self.channels.is_empty() {
            self.channels = retained_channels;
            self.channels_updated_at = retained_channels_at;
        }
        self.discovered_at = retained_discovered.or(self.discovered_at);
        self.last_readings_sync = retained_readings_sync;
        self.last_synced_at = Some(now);
    }

    pub fn set_channels(&mut self, channels: Vec<ChannelRef>, now: DateTime<Utc>) {
        self.channels = channels;
        self.channels_updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: i64, parameter: &str) -> ChannelRef {
        ChannelRef {
            channel_id: id,
            parameter: parameter.to_string(),
            unit: Some("µg/m³".to_string()),
        }
    }

    #[test]
    fn json_round_trip_preserves_channels() {
        let mut meta = SensorMetadata {
            provider_id: Some(2178),
            parameters: vec!["pm25".to_string(), "pm10".to_string()],
            ..Default::default()
        };
        meta.set_channels(vec![channel(1001, "pm25")], Utc::now());

        let restored = SensorMetadata::from_json(&meta.to_json());
        assert_eq!(restored, meta);
    }

    #[test]
    fn from_json_tolerates_unknown_shapes() {
        let legacy = serde_json::json!({"openaq_id": "2178", "something": [1, 2]});
        let meta = SensorMetadata::from_json(&legacy);
        assert_eq!(meta, SensorMetadata::default());
    }

    #[test]
    fn merge_discovery_never_drops_cached_channels() {
        let now = Utc::now();
        let mut cached = SensorMetadata {
            provider_id: Some(2178),
            parameters: vec!["pm25".to_string()],
            discovered_at: Some(now - chrono::Duration::days(30)),
            ..Default::default()
        };
        cached.set_channels(vec![channel(1001, "pm25"), channel(1002, "pm10")], now);

        let fresh = SensorMetadata {
            provider_id: Some(2178),
            parameters: vec!["pm25".to_string(), "o3".to_string()],
            is_monitor: true,
            ..Default::default()
        };

        cached.merge_discovery(fresh, now);

        assert_eq!(cached.channels.len(), 2);
        assert!(cached.is_monitor);
        assert_eq!(cached.parameters, vec!["pm25", "o3"]);
        assert_eq!(cached.last_synced_at, Some(now));
        // First discovery timestamp survives refreshes
        assert!(cached.discovered_at.unwrap() < now);
    }
}
