use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Singleton row (`id = 1`) holding the office rules used by clock-in/out.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_setting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub updated_at: DateTimeWithTimeZone,
    pub work_start_time: Time,
    pub work_end_time: Time,
    pub late_tolerance_minutes: i32,
    #[sea_orm(column_type = "Double")]
    pub office_latitude: f64,
    #[sea_orm(column_type = "Double")]
    pub office_longitude: f64,
    /// 0 disables the geofence check
    #[sea_orm(column_type = "Double")]
    pub geofence_radius_meters: f64,
    pub require_selfie: bool,
    pub utc_offset_minutes: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
