use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
    pub country: Option<String>,
    /// Backfilled lazily from the elevation endpoint; never overwritten once set.
    pub elevation: Option<f64>,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sensors::Entity")]
    Sensors,
    #[sea_orm(has_many = "super::weather_metrics::Entity")]
    WeatherMetrics,
    #[sea_orm(has_many = "super::hourly_forecasts::Entity")]
    HourlyForecasts,
    #[sea_orm(has_many = "super::historical_weathers::Entity")]
    HistoricalWeathers,
    #[sea_orm(has_many = "super::marine_weathers::Entity")]
    MarineWeathers,
    #[sea_orm(has_many = "super::air_qualities::Entity")]
    AirQualities,
    #[sea_orm(has_many = "super::flood_risks::Entity")]
    FloodRisks,
}

impl Related<super::sensors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sensors.def()
    }
}

impl Related<super::weather_metrics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeatherMetrics.def()
    }
}

impl Related<super::hourly_forecasts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HourlyForecasts.def()
    }
}

impl Related<super::historical_weathers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HistoricalWeathers.def()
    }
}

impl Related<super::marine_weathers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarineWeathers.def()
    }
}

impl Related<super::air_qualities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AirQualities.def()
    }
}

impl Related<super::flood_risks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FloodRisks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
