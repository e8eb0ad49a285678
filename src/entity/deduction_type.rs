use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::DeductionCalculation;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "deduction_type")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Text", unique)]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub calculation: DeductionCalculation,
    /// A currency amount or a percentage, depending on `calculation`
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub default_value: Decimal,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_deduction::Entity")]
    UserDeduction,
}

impl Related<super::user_deduction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserDeduction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
