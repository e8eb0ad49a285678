//! Allowance and deduction types, and which users they apply to.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::Admin,
    entity::{
        allowance_type, deduction_type,
        prelude::*,
        sea_orm_active_enums::{AllowanceCalculation, DeductionCalculation},
        user_allowance, user_deduction,
    },
    error::{AppError, AppResult},
    logic::payroll::{AssignedAllowance, AssignedDeduction},
    services::{now, user},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct NewAllowanceType {
    pub name: String,
    pub description: Option<String>,
    pub calculation: AllowanceCalculation,
    pub default_amount: Decimal,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AllowanceTypeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub calculation: Option<AllowanceCalculation>,
    pub default_amount: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewDeductionType {
    pub name: String,
    pub description: Option<String>,
    pub calculation: DeductionCalculation,
    pub default_value: Decimal,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeductionTypeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub calculation: Option<DeductionCalculation>,
    pub default_value: Option<Decimal>,
    pub is_active: Option<bool>,
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }

    Ok(name.to_owned())
}

fn validate_amount(amount: Decimal) -> AppResult<()> {
    if amount.is_sign_negative() {
        return Err(AppError::validation("amount cannot be negative"));
    }

    Ok(())
}

fn is_percentage(calculation: DeductionCalculation) -> bool {
    matches!(
        calculation,
        DeductionCalculation::Percentage | DeductionCalculation::PercentageOfAbsence | DeductionCalculation::MandatoryPercentage
    )
}

/// Percentages live in `0..=100`, amounts only need to be non-negative
fn validate_deduction_value(calculation: DeductionCalculation, value: Decimal) -> AppResult<()> {
    validate_amount(value)?;

    if is_percentage(calculation) && value > Decimal::ONE_HUNDRED {
        return Err(AppError::validation("percentage cannot exceed 100"));
    }

    Ok(())
}

pub async fn list_allowance_types(db: &DatabaseConnection) -> AppResult<Vec<allowance_type::Model>> {
    Ok(AllowanceType::find().order_by_asc(allowance_type::Column::Name).all(db).await?)
}

pub async fn list_deduction_types(db: &DatabaseConnection) -> AppResult<Vec<deduction_type::Model>> {
    Ok(DeductionType::find().order_by_asc(deduction_type::Column::Name).all(db).await?)
}

#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn create_allowance_type(db: &DatabaseConnection, admin: &Admin, new: NewAllowanceType) -> AppResult<allowance_type::Model> {
    let name = validate_name(&new.name)?;
    validate_amount(new.default_amount)?;

    let model = allowance_type::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now()),
        updated_at: Set(now()),
        name: Set(name),
        description: Set(new.description),
        calculation: Set(new.calculation),
        default_amount: Set(new.default_amount),
        is_active: Set(true),
    }
    .insert(db)
    .await?;

    info!(allowance_type_id = %model.id, "allowance type created");

    Ok(model)
}

#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn update_allowance_type(
    db: &DatabaseConnection,
    admin: &Admin,
    id: Uuid,
    update: AllowanceTypeUpdate,
) -> AppResult<allowance_type::Model> {
    AllowanceType::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("allowance type"))?;

    let mut model = allowance_type::ActiveModel {
        id: Unchanged(id),
        updated_at: Set(now()),
        ..Default::default()
    };

    if let Some(name) = update.name {
        model.name = Set(validate_name(&name)?);
    }
    if let Some(description) = update.description {
        model.description = Set(Some(description));
    }
    if let Some(calculation) = update.calculation {
        model.calculation = Set(calculation);
    }
    if let Some(default_amount) = update.default_amount {
        validate_amount(default_amount)?;
        model.default_amount = Set(default_amount);
    }
    if let Some(is_active) = update.is_active {
        model.is_active = Set(is_active);
    }

    Ok(model.update(db).await?)
}

/// Deleting a type also drops its assignments
#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn delete_allowance_type(db: &DatabaseConnection, admin: &Admin, id: Uuid) -> AppResult<()> {
    let res = AllowanceType::delete_by_id(id).exec(db).await?;

    if res.rows_affected == 0 {
        return Err(AppError::NotFound("allowance type"));
    }

    info!("allowance type deleted");

    Ok(())
}

#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn create_deduction_type(db: &DatabaseConnection, admin: &Admin, new: NewDeductionType) -> AppResult<deduction_type::Model> {
    let name = validate_name(&new.name)?;
    validate_deduction_value(new.calculation, new.default_value)?;

    let model = deduction_type::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now()),
        updated_at: Set(now()),
        name: Set(name),
        description: Set(new.description),
        calculation: Set(new.calculation),
        default_value: Set(new.default_value),
        is_active: Set(true),
    }
    .insert(db)
    .await?;

    info!(deduction_type_id = %model.id, "deduction type created");

    Ok(model)
}

#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn update_deduction_type(
    db: &DatabaseConnection,
    admin: &Admin,
    id: Uuid,
    update: DeductionTypeUpdate,
) -> AppResult<deduction_type::Model> {
    let existing = DeductionType::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("deduction type"))?;

    let calculation = update.calculation.unwrap_or(existing.calculation);
    let default_value = update.default_value.unwrap_or(existing.default_value);
    validate_deduction_value(calculation, default_value)?;

    let mut model = deduction_type::ActiveModel {
        id: Unchanged(id),
        updated_at: Set(now()),
        calculation: Set(calculation),
        default_value: Set(default_value),
        ..Default::default()
    };

    if let Some(name) = update.name {
        model.name = Set(validate_name(&name)?);
    }
    if let Some(description) = update.description {
        model.description = Set(Some(description));
    }
    if let Some(is_active) = update.is_active {
        model.is_active = Set(is_active);
    }

    Ok(model.update(db).await?)
}

#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn delete_deduction_type(db: &DatabaseConnection, admin: &Admin, id: Uuid) -> AppResult<()> {
    let res = DeductionType::delete_by_id(id).exec(db).await?;

    if res.rows_affected == 0 {
        return Err(AppError::NotFound("deduction type"));
    }

    info!("deduction type deleted");

    Ok(())
}

/// Gives `user_id` an allowance, replacing the override amount when already assigned
#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn assign_allowance(
    db: &DatabaseConnection,
    admin: &Admin,
    user_id: Uuid,
    allowance_type_id: Uuid,
    amount: Option<Decimal>,
) -> AppResult<user_allowance::Model> {
    if let Some(amount) = amount {
        validate_amount(amount)?;
    }

    user::get(db, user_id).await?;
    AllowanceType::find_by_id(allowance_type_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("allowance type"))?;

    let existing = UserAllowance::find()
        .filter(user_allowance::Column::UserId.eq(user_id))
        .filter(user_allowance::Column::AllowanceTypeId.eq(allowance_type_id))
        .one(db)
        .await?;

    let model = match existing {
        Some(existing) => {
            user_allowance::ActiveModel {
                id: Unchanged(existing.id),
                updated_at: Set(now()),
                amount: Set(amount),
                ..Default::default()
            }
            .update(db)
            .await?
        }
        None => {
            user_allowance::ActiveModel {
                id: Set(Uuid::new_v4()),
                created_at: Set(now()),
                updated_at: Set(now()),
                user_id: Set(user_id),
                allowance_type_id: Set(allowance_type_id),
                amount: Set(amount),
            }
            .insert(db)
            .await?
        }
    };

    info!("allowance assigned");

    Ok(model)
}

#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn unassign_allowance(db: &DatabaseConnection, admin: &Admin, user_id: Uuid, allowance_type_id: Uuid) -> AppResult<()> {
    let res = UserAllowance::delete_many()
        .filter(user_allowance::Column::UserId.eq(user_id))
        .filter(user_allowance::Column::AllowanceTypeId.eq(allowance_type_id))
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        return Err(AppError::NotFound("allowance assignment"));
    }

    Ok(())
}

/// Gives `user_id` a deduction, replacing the override value when already assigned
#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn assign_deduction(
    db: &DatabaseConnection,
    admin: &Admin,
    user_id: Uuid,
    deduction_type_id: Uuid,
    value: Option<Decimal>,
) -> AppResult<user_deduction::Model> {
    user::get(db, user_id).await?;
    let deduction = DeductionType::find_by_id(deduction_type_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("deduction type"))?;

    if let Some(value) = value {
        validate_deduction_value(deduction.calculation, value)?;
    }

    let existing = UserDeduction::find()
        .filter(user_deduction::Column::UserId.eq(user_id))
        .filter(user_deduction::Column::DeductionTypeId.eq(deduction_type_id))
        .one(db)
        .await?;

    let model = match existing {
        Some(existing) => {
            user_deduction::ActiveModel {
                id: Unchanged(existing.id),
                updated_at: Set(now()),
                value: Set(value),
                ..Default::default()
            }
            .update(db)
            .await?
        }
        None => {
            user_deduction::ActiveModel {
                id: Set(Uuid::new_v4()),
                created_at: Set(now()),
                updated_at: Set(now()),
                user_id: Set(user_id),
                deduction_type_id: Set(deduction_type_id),
                value: Set(value),
            }
            .insert(db)
            .await?
        }
    };

    info!("deduction assigned");

    Ok(model)
}

#[instrument(skip(db, admin), fields(admin = %admin.username))]
pub async fn unassign_deduction(db: &DatabaseConnection, admin: &Admin, user_id: Uuid, deduction_type_id: Uuid) -> AppResult<()> {
    let res = UserDeduction::delete_many()
        .filter(user_deduction::Column::UserId.eq(user_id))
        .filter(user_deduction::Column::DeductionTypeId.eq(deduction_type_id))
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        return Err(AppError::NotFound("deduction assignment"));
    }

    Ok(())
}

/// Assigned allowances of every user in `user_ids`, keyed by user
pub async fn allowances_by_user<C: ConnectionTrait>(db: &C, user_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<AssignedAllowance>>> {
    let rows = UserAllowance::find()
        .filter(user_allowance::Column::UserId.is_in(user_ids.iter().copied()))
        .find_also_related(AllowanceType)
        .all(db)
        .await?;

    let mut assigned: HashMap<Uuid, Vec<AssignedAllowance>> = HashMap::new();

    for (assignment, allowance) in rows {
        let Some(allowance) = allowance else { continue };

        assigned.entry(assignment.user_id).or_default().push(AssignedAllowance {
            allowance,
            amount: assignment.amount,
        });
    }

    Ok(assigned)
}

/// Assigned deductions of every user in `user_ids`, keyed by user
pub async fn deductions_by_user<C: ConnectionTrait>(db: &C, user_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<AssignedDeduction>>> {
    let rows = UserDeduction::find()
        .filter(user_deduction::Column::UserId.is_in(user_ids.iter().copied()))
        .find_also_related(DeductionType)
        .all(db)
        .await?;

    let mut assigned: HashMap<Uuid, Vec<AssignedDeduction>> = HashMap::new();

    for (assignment, deduction) in rows {
        let Some(deduction) = deduction else { continue };

        assigned.entry(assignment.user_id).or_default().push(AssignedDeduction {
            deduction,
            value: assignment.value,
        });
    }

    Ok(assigned)
}

pub async fn mandatory_deductions<C: ConnectionTrait>(db: &C) -> AppResult<Vec<deduction_type::Model>> {
    let deductions = DeductionType::find()
        .filter(deduction_type::Column::Calculation.eq(DeductionCalculation::MandatoryPercentage))
        .filter(deduction_type::Column::IsActive.eq(true))
        .all(db)
        .await?;

    Ok(deductions)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::{
        auth::tests::user as fixture,
        entity::sea_orm_active_enums::RoleType,
        logic::payroll::tests::{allowance, deduction},
    };

    use super::*;

    fn admin() -> Admin {
        Admin::try_from(fixture("root", RoleType::Admin)).unwrap()
    }

    #[test]
    fn test_validate_deduction_value() {
        assert!(validate_deduction_value(DeductionCalculation::Percentage, dec!(100)).is_ok());
        assert!(validate_deduction_value(DeductionCalculation::Percentage, dec!(100.5)).is_err());
        assert!(validate_deduction_value(DeductionCalculation::MandatoryPercentage, dec!(-1)).is_err());
        assert!(validate_deduction_value(DeductionCalculation::PerLateDay, dec!(150000)).is_ok());
    }

    #[tokio::test]
    async fn test_create_deduction_type_rejects_large_percentage() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let res = create_deduction_type(
            &db,
            &admin(),
            NewDeductionType {
                name: "BPJS Kesehatan".to_owned(),
                description: None,
                calculation: DeductionCalculation::MandatoryPercentage,
                default_value: dec!(120),
            },
        )
        .await;

        assert!(matches!(res, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_assign_allowance_inserts_when_missing() {
        let siti = fixture("siti", RoleType::Employee);
        let meal = allowance("Meal", AllowanceCalculation::PerPresentDay, dec!(25000));

        let assignment = user_allowance::Model {
            id: Uuid::new_v4(),
            created_at: now(),
            updated_at: now(),
            user_id: siti.id,
            allowance_type_id: meal.id,
            amount: Some(dec!(30000)),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![siti.clone()]])
            .append_query_results([vec![meal.clone()]])
            .append_query_results([Vec::<user_allowance::Model>::new(), vec![assignment.clone()]])
            .into_connection();

        let res = assign_allowance(&db, &admin(), siti.id, meal.id, Some(dec!(30000))).await.unwrap();
        assert_eq!(res, assignment);
    }

    #[tokio::test]
    async fn test_deductions_by_user_groups_rows() {
        let siti = Uuid::new_v4();
        let budi = Uuid::new_v4();
        let late = deduction("Late fine", DeductionCalculation::PerLateDay, dec!(50000));

        let row = |user_id, value| {
            (
                user_deduction::Model {
                    id: Uuid::new_v4(),
                    created_at: now(),
                    updated_at: now(),
                    user_id,
                    deduction_type_id: late.id,
                    value,
                },
                late.clone(),
            )
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row(siti, None), row(budi, Some(dec!(75000)))]])
            .into_connection();

        let grouped = deductions_by_user(&db, &[siti, budi]).await.unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&siti][0].value, None);
        assert_eq!(grouped[&budi][0].value, Some(dec!(75000)));
        assert_eq!(grouped[&budi][0].deduction.name, "Late fine");
    }
}
