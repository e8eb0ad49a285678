use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AttendanceStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub user_id: Uuid,
    pub date: Date,
    pub clock_in: Option<DateTimeWithTimeZone>,
    pub clock_out: Option<DateTimeWithTimeZone>,
    pub status: AttendanceStatus,
    #[sea_orm(column_type = "Double", nullable)]
    pub clock_in_latitude: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub clock_in_longitude: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub clock_out_latitude: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub clock_out_longitude: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub selfie_in_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub selfie_out_url: Option<String>,
    pub late_minutes: i32,
    pub work_minutes: Option<i32>,
    pub leave_request_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
}

impl Model {
    /// Clocked in but not yet clocked out
    pub fn is_open(&self) -> bool {
        self.clock_in.is_some() && self.clock_out.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::leave_request::Entity",
        from = "Column::LeaveRequestId",
        to = "super::leave_request::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    LeaveRequest,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::leave_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
