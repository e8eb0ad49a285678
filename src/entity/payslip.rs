use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pay statement of one user inside a payroll run. The attendance counts are a
/// snapshot of the recap the amounts were computed from.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payslip")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub payroll_run_id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub base_salary: Decimal,
    pub working_days: i32,
    pub present_days: i32,
    pub late_days: i32,
    pub absent_days: i32,
    pub leave_days: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_allowances: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub total_deductions: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub net_salary: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payroll_run::Entity",
        from = "Column::PayrollRunId",
        to = "super::payroll_run::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    PayrollRun,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::payslip_item::Entity")]
    PayslipItem,
}

impl Related<super::payroll_run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayrollRun.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::payslip_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayslipItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
