//! Closed enums for string-backed domain columns.
//!
//! Values outside these sets are rejected at the domain-model boundary
//! instead of relying on free-form strings in the database.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    #[sea_orm(string_value = "air_quality")]
    AirQuality,
    #[sea_orm(string_value = "temperature")]
    Temperature,
    #[sea_orm(string_value = "humidity")]
    Humidity,
    #[sea_orm(string_value = "water_quality")]
    WaterQuality,
    #[sea_orm(string_value = "pm25")]
    Pm25,
    #[sea_orm(string_value = "pm10")]
    Pm10,
    #[sea_orm(string_value = "ozone")]
    Ozone,
    #[sea_orm(string_value = "no2")]
    No2,
    #[sea_orm(string_value = "so2")]
    So2,
    #[sea_orm(string_value = "co")]
    Co,
}

impl SensorType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AirQuality => "air_quality",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::WaterQuality => "water_quality",
            Self::Pm25 => "pm25",
            Self::Pm10 => "pm10",
            Self::Ozone => "ozone",
            Self::No2 => "no2",
            Self::So2 => "so2",
            Self::Co => "co",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "maintenance")]
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    #[sea_orm(string_value = "threshold_exceeded")]
    ThresholdExceeded,
    #[sea_orm(string_value = "anomaly")]
    Anomaly,
    #[sea_orm(string_value = "sensor_failure")]
    SensorFailure,
    #[sea_orm(string_value = "zone_alert")]
    ZoneAlert,
    #[sea_orm(string_value = "network_issue")]
    NetworkIssue,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "critical")]
    Critical,
}

impl AlertSeverity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_follows_escalation() {
        assert!(AlertSeverity::Low < AlertSeverity::Medium);
        assert!(AlertSeverity::Medium < AlertSeverity::High);
        assert!(AlertSeverity::High < AlertSeverity::Critical);
    }

    #[test]
    fn sensor_type_round_trips_through_string_value() {
        use sea_orm::ActiveEnum;

        for ty in [SensorType::AirQuality, SensorType::Pm25, SensorType::Co] {
            assert_eq!(SensorType::try_from_value(&ty.to_value()).unwrap(), ty);
            assert_eq!(ty.to_value(), ty.as_str());
        }
    }
}
