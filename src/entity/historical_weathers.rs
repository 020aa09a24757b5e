use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per (location, day); repeated syncs upsert-or-skip.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "historical_weathers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub location_id: Uuid,
    pub weather_date: Date,
    pub max_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub total_precipitation: Option<f64>,
    pub weather_code: Option<i32>,
    pub created_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::locations::Entity",
        from = "Column::LocationId",
        to = "super::locations::Column::Id"
    )]
    Location,
}

impl Related<super::locations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
