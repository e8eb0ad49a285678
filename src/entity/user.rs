use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::RoleType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Text", unique)]
    pub username: String,
    #[sea_orm(column_type = "Text")]
    pub full_name: String,
    /// SHA-256 digest of `password:username`
    #[sea_orm(column_type = "VarBinary(StringLen::None)")]
    #[serde(skip_serializing, default)]
    pub password: Vec<u8>,
    pub role: RoleType,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub base_salary: Decimal,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecord,
    #[sea_orm(has_many = "super::leave_request::Entity")]
    LeaveRequest,
    #[sea_orm(has_many = "super::payslip::Entity")]
    Payslip,
    #[sea_orm(has_many = "super::user_allowance::Entity")]
    UserAllowance,
    #[sea_orm(has_many = "super::user_deduction::Entity")]
    UserDeduction,
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecord.def()
    }
}

impl Related<super::leave_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveRequest.def()
    }
}

impl Related<super::payslip::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payslip.def()
    }
}

impl Related<super::user_allowance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserAllowance.def()
    }
}

impl Related<super::user_deduction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserDeduction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
