use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== LOCATIONS ==========
        manager
            .create_table(
                Table::create()
                    .table(Locations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Locations::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(Locations::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Locations::Latitude).double().not_null())
                    .col(ColumnDef::new(Locations::Longitude).double().not_null())
                    .col(ColumnDef::new(Locations::Timezone).string_len(64))
                    .col(ColumnDef::new(Locations::Country).string_len(64))
                    .col(ColumnDef::new(Locations::Elevation).double())
                    .col(
                        ColumnDef::new(Locations::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .col(ColumnDef::new(Locations::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Case-insensitive unique index on location name
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX locations_name_lower_idx ON locations (LOWER(name))",
            )
            .await?;

        // ========== ENVIRONMENTAL SENSORS ==========
        manager
            .create_table(
                Table::create()
                    .table(EnvironmentalSensors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EnvironmentalSensors::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(EnvironmentalSensors::LocationId).uuid())
                    .col(
                        ColumnDef::new(EnvironmentalSensors::Name)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalSensors::SensorType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalSensors::Manufacturer)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalSensors::InstallationDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalSensors::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(EnvironmentalSensors::Latitude).double())
                    .col(ColumnDef::new(EnvironmentalSensors::Longitude).double())
                    .col(
                        ColumnDef::new(EnvironmentalSensors::Metadata)
                            .json_binary()
                            .not_null()
                            .extra("DEFAULT '{}'::jsonb"),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalSensors::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalSensors::UpdatedAt)
                            .timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_environmental_sensors_location")
                            .from(
                                EnvironmentalSensors::Table,
                                EnvironmentalSensors::LocationId,
                            )
                            .to(Locations::Table, Locations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_environmental_sensors_status")
                    .table(EnvironmentalSensors::Table)
                    .col(EnvironmentalSensors::Status)
                    .to_owned(),
            )
            .await?;

        // Provider-id lookups go through the metadata column
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX idx_environmental_sensors_provider_id \
                 ON environmental_sensors ((metadata->>'provider_id'))",
            )
            .await?;

        // ========== ENVIRONMENTAL READINGS ==========
        manager
            .create_table(
                Table::create()
                    .table(EnvironmentalReadings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EnvironmentalReadings::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalReadings::SensorId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalReadings::ParameterName)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalReadings::Value)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalReadings::Unit)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalReadings::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EnvironmentalReadings::RawData).json_binary())
                    .col(
                        ColumnDef::new(EnvironmentalReadings::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_environmental_readings_sensor")
                            .from(
                                EnvironmentalReadings::Table,
                                EnvironmentalReadings::SensorId,
                            )
                            .to(EnvironmentalSensors::Table, EnvironmentalSensors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Natural-key backstop; write-time existence checks are the primary
        // duplicate guard because provider timestamps are coarse
        manager
            .create_index(
                Index::create()
                    .name("idx_environmental_readings_natural_key")
                    .table(EnvironmentalReadings::Table)
                    .col(EnvironmentalReadings::SensorId)
                    .col(EnvironmentalReadings::ParameterName)
                    .col(EnvironmentalReadings::RecordedAt)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX idx_environmental_readings_sensor_time \
                 ON environmental_readings (sensor_id, recorded_at DESC)",
            )
            .await?;

        // ========== ENVIRONMENTAL ALERTS ==========
        manager
            .create_table(
                Table::create()
                    .table(EnvironmentalAlerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EnvironmentalAlerts::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalAlerts::SensorId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EnvironmentalAlerts::ReadingId).uuid())
                    .col(
                        ColumnDef::new(EnvironmentalAlerts::AlertType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalAlerts::Severity)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(EnvironmentalAlerts::Message).text().not_null())
                    .col(
                        ColumnDef::new(EnvironmentalAlerts::ResolvedAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(ColumnDef::new(EnvironmentalAlerts::Metadata).json_binary())
                    .col(
                        ColumnDef::new(EnvironmentalAlerts::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_environmental_alerts_sensor")
                            .from(EnvironmentalAlerts::Table, EnvironmentalAlerts::SensorId)
                            .to(EnvironmentalSensors::Table, EnvironmentalSensors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_environmental_alerts_reading")
                            .from(EnvironmentalAlerts::Table, EnvironmentalAlerts::ReadingId)
                            .to(EnvironmentalReadings::Table, EnvironmentalReadings::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Active alerts are the hot query
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX idx_environmental_alerts_active \
                 ON environmental_alerts (sensor_id) WHERE resolved_at IS NULL",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_environmental_alerts_severity")
                    .table(EnvironmentalAlerts::Table)
                    .col(EnvironmentalAlerts::Severity)
                    .to_owned(),
            )
            .await?;

        // ========== WEATHER METRICS ==========
        manager
            .create_table(
                Table::create()
                    .table(WeatherMetrics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeatherMetrics::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(WeatherMetrics::LocationId).uuid().not_null())
                    .col(ColumnDef::new(WeatherMetrics::Temperature).double())
                    .col(ColumnDef::new(WeatherMetrics::FeelsLike).double())
                    .col(ColumnDef::new(WeatherMetrics::Humidity).double())
                    .col(ColumnDef::new(WeatherMetrics::WindSpeed).double())
                    .col(ColumnDef::new(WeatherMetrics::WindDirection).double())
                    .col(ColumnDef::new(WeatherMetrics::WindGust).double())
                    .col(ColumnDef::new(WeatherMetrics::Precipitation).double())
                    .col(ColumnDef::new(WeatherMetrics::WeatherCode).integer())
                    .col(ColumnDef::new(WeatherMetrics::CloudCover).double())
                    .col(ColumnDef::new(WeatherMetrics::Pressure).double())
                    .col(ColumnDef::new(WeatherMetrics::Visibility).double())
                    .col(
                        ColumnDef::new(WeatherMetrics::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeatherMetrics::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_weather_metrics_location")
                            .from(WeatherMetrics::Table, WeatherMetrics::LocationId)
                            .to(Locations::Table, Locations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_weather_metrics_location_time")
                    .table(WeatherMetrics::Table)
                    .col(WeatherMetrics::LocationId)
                    .col(WeatherMetrics::RecordedAt)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========== HOURLY FORECASTS ==========
        manager
            .create_table(
                Table::create()
                    .table(HourlyForecasts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HourlyForecasts::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(HourlyForecasts::LocationId).uuid().not_null())
                    .col(
                        ColumnDef::new(HourlyForecasts::ForecastTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HourlyForecasts::Temperature).double())
                    .col(ColumnDef::new(HourlyForecasts::Humidity).double())
                    .col(ColumnDef::new(HourlyForecasts::WeatherCode).integer())
                    .col(ColumnDef::new(HourlyForecasts::WindSpeed).double())
                    .col(ColumnDef::new(HourlyForecasts::PrecipitationProbability).double())
                    .col(ColumnDef::new(HourlyForecasts::Precipitation).double())
                    .col(
                        ColumnDef::new(HourlyForecasts::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_hourly_forecasts_location")
                            .from(HourlyForecasts::Table, HourlyForecasts::LocationId)
                            .to(Locations::Table, Locations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_hourly_forecasts_location_time")
                    .table(HourlyForecasts::Table)
                    .col(HourlyForecasts::LocationId)
                    .col(HourlyForecasts::ForecastTime)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========== HISTORICAL WEATHERS ==========
        manager
            .create_table(
                Table::create()
                    .table(HistoricalWeathers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HistoricalWeathers::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(
                        ColumnDef::new(HistoricalWeathers::LocationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HistoricalWeathers::WeatherDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HistoricalWeathers::MaxTemperature).double())
                    .col(ColumnDef::new(HistoricalWeathers::MinTemperature).double())
                    .col(ColumnDef::new(HistoricalWeathers::AvgTemperature).double())
                    .col(ColumnDef::new(HistoricalWeathers::TotalPrecipitation).double())
                    .col(ColumnDef::new(HistoricalWeathers::WeatherCode).integer())
                    .col(
                        ColumnDef::new(HistoricalWeathers::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_historical_weathers_location")
                            .from(HistoricalWeathers::Table, HistoricalWeathers::LocationId)
                            .to(Locations::Table, Locations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_historical_weathers_location_date")
                    .table(HistoricalWeathers::Table)
                    .col(HistoricalWeathers::LocationId)
                    .col(HistoricalWeathers::WeatherDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========== MARINE WEATHERS ==========
        manager
            .create_table(
                Table::create()
                    .table(MarineWeathers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MarineWeathers::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(MarineWeathers::LocationId).uuid().not_null())
                    .col(ColumnDef::new(MarineWeathers::WaveHeight).double())
                    .col(ColumnDef::new(MarineWeathers::WavePeriod).double())
                    .col(ColumnDef::new(MarineWeathers::WaterTemperature).double())
                    .col(
                        ColumnDef::new(MarineWeathers::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MarineWeathers::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_marine_weathers_location")
                            .from(MarineWeathers::Table, MarineWeathers::LocationId)
                            .to(Locations::Table, Locations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_marine_weathers_location_time")
                    .table(MarineWeathers::Table)
                    .col(MarineWeathers::LocationId)
                    .col(MarineWeathers::RecordedAt)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========== AIR QUALITIES ==========
        manager
            .create_table(
                Table::create()
                    .table(AirQualities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AirQualities::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(AirQualities::LocationId).uuid().not_null())
                    .col(ColumnDef::new(AirQualities::Pm25).double())
                    .col(ColumnDef::new(AirQualities::Pm10).double())
                    .col(ColumnDef::new(AirQualities::O3).double())
                    .col(ColumnDef::new(AirQualities::No2).double())
                    .col(ColumnDef::new(AirQualities::So2).double())
                    .col(ColumnDef::new(AirQualities::AqiLevel).small_integer())
                    .col(
                        ColumnDef::new(AirQualities::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AirQualities::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_air_qualities_location")
                            .from(AirQualities::Table, AirQualities::LocationId)
                            .to(Locations::Table, Locations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_air_qualities_location_time")
                    .table(AirQualities::Table)
                    .col(AirQualities::LocationId)
                    .col(AirQualities::RecordedAt)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========== FLOOD RISKS ==========
        manager
            .create_table(
                Table::create()
                    .table(FloodRisks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FloodRisks::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(FloodRisks::LocationId).uuid().not_null())
                    .col(
                        ColumnDef::new(FloodRisks::FloodProbability)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FloodRisks::FloodSeverity)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FloodRisks::FloodDescription)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FloodRisks::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FloodRisks::CreatedAt)
                            .timestamp_with_time_zone()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_flood_risks_location")
                            .from(FloodRisks::Table, FloodRisks::LocationId)
                            .to(Locations::Table, Locations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_flood_risks_location_time")
                    .table(FloodRisks::Table)
                    .col(FloodRisks::LocationId)
                    .col(FloodRisks::RecordedAt)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FloodRisks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AirQualities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MarineWeathers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HistoricalWeathers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HourlyForecasts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WeatherMetrics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EnvironmentalAlerts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EnvironmentalReadings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EnvironmentalSensors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Locations::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Locations {
    Table,
    Id,
    Name,
    Latitude,
    Longitude,
    Timezone,
    Country,
    Elevation,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum EnvironmentalSensors {
    Table,
    Id,
    LocationId,
    Name,
    SensorType,
    Manufacturer,
    InstallationDate,
    Status,
    Latitude,
    Longitude,
    Metadata,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum EnvironmentalReadings {
    Table,
    Id,
    SensorId,
    ParameterName,
    Value,
    Unit,
    RecordedAt,
    RawData,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum EnvironmentalAlerts {
    Table,
    Id,
    SensorId,
    ReadingId,
    AlertType,
    Severity,
    Message,
    ResolvedAt,
    Metadata,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum WeatherMetrics {
    Table,
    Id,
    LocationId,
    Temperature,
    FeelsLike,
    Humidity,
    WindSpeed,
    WindDirection,
    WindGust,
    Precipitation,
    WeatherCode,
    CloudCover,
    Pressure,
    Visibility,
    RecordedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum HourlyForecasts {
    Table,
    Id,
    LocationId,
    ForecastTime,
    Temperature,
    Humidity,
    WeatherCode,
    WindSpeed,
    PrecipitationProbability,
    Precipitation,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum HistoricalWeathers {
    Table,
    Id,
    LocationId,
    WeatherDate,
    MaxTemperature,
    MinTemperature,
    AvgTemperature,
    TotalPrecipitation,
    WeatherCode,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum MarineWeathers {
    Table,
    Id,
    LocationId,
    WaveHeight,
    WavePeriod,
    WaterTemperature,
    RecordedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum AirQualities {
    Table,
    Id,
    LocationId,
    #[sea_orm(iden = "pm2_5")]
    Pm25,
    Pm10,
    O3,
    No2,
    So2,
    AqiLevel,
    RecordedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum FloodRisks {
    Table,
    Id,
    LocationId,
    FloodProbability,
    FloodSeverity,
    FloodDescription,
    RecordedAt,
    CreatedAt,
}
