use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{SensorStatus, SensorType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "environmental_sensors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub location_id: Option<Uuid>,
    pub name: String,
    pub sensor_type: SensorType,
    pub manufacturer: String,
    pub installation_date: DateTimeWithTimeZone,
    pub status: SensorStatus,
    /// Required unless a parent location supplies coordinates.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Serialized `SensorMetadata`: provider id, channel ids, sync timestamps.
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: Json,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::locations::Entity",
        from = "Column::LocationId",
        to = "super::locations::Column::Id"
    )]
    Location,
    #[sea_orm(has_many = "super::readings::Entity")]
    Readings,
    #[sea_orm(has_many = "super::alerts::Entity")]
    Alerts,
}

impl Related<super::locations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::readings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Readings.def()
    }
}

impl Related<super::alerts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alerts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
