use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_allowance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub user_id: Uuid,
    pub allowance_type_id: Uuid,
    /// Overrides `allowance_type.default_amount` when set
    #[sea_orm(column_type = "Decimal(Some((19, 2)))", nullable)]
    pub amount: Option<Decimal>,
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
        belongs_to = "super::allowance_type::Entity",
        from = "Column::AllowanceTypeId",
        to = "super::allowance_type::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    AllowanceType,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::allowance_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AllowanceType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
