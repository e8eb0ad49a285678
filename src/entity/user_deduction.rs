use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_deduction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub user_id: Uuid,
    pub deduction_type_id: Uuid,
    /// Overrides `deduction_type.default_value` when set
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub value: Option<Decimal>,
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
        belongs_to = "super::deduction_type::Entity",
        from = "Column::DeductionTypeId",
        to = "super::deduction_type::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    DeductionType,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::deduction_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeductionType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
