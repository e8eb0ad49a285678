use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{self, Admin},
    entity::{prelude::*, sea_orm_active_enums::RoleType, user},
    error::{AppError, AppResult},
    services::now,
};

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub role: RoleType,
    pub base_salary: Decimal,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub role: Option<RoleType>,
    pub base_salary: Option<Decimal>,
    pub is_active: Option<bool>,
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::validation(format!("password must be at least {MIN_PASSWORD_LENGTH} characters")));
    }

    Ok(())
}

fn validate_salary(base_salary: Decimal) -> AppResult<()> {
    if base_salary.is_sign_negative() {
        return Err(AppError::validation("base_salary cannot be negative"));
    }

    Ok(())
}

/// Checks a username/password pair, the account must still be active
#[instrument(skip(db, password))]
pub async fn authenticate(db: &DatabaseConnection, username: &str, password: &str) -> AppResult<user::Model> {
    let Some(user) = User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
    else {
        warn!("unknown username");
        return Err(AppError::InvalidCredentials);
    };

    if !auth::verify_password(&user, password) {
        warn!("wrong password");
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        return Err(AppError::Forbidden("account is deactivated"));
    }

    Ok(user)
}

pub async fn get<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<user::Model> {
    User::find_by_id(id).one(db).await?.ok_or(AppError::NotFound("user"))
}

pub async fn list(db: &DatabaseConnection, include_inactive: bool) -> AppResult<Vec<user::Model>> {
    let mut query = User::find().order_by_asc(user::Column::Username);

    if !include_inactive {
        query = query.filter(user::Column::IsActive.eq(true));
    }

    Ok(query.all(db).await?)
}

/// Active users that are paid through payroll, everyone except admins
pub async fn active_employees<C: ConnectionTrait>(db: &C) -> AppResult<Vec<user::Model>> {
    let users = User::find()
        .filter(user::Column::IsActive.eq(true))
        .filter(user::Column::Role.ne(RoleType::Admin))
        .order_by_asc(user::Column::Username)
        .all(db)
        .await?;

    Ok(users)
}

#[instrument(skip(db, admin, new_user), fields(admin = %admin.username, username = %new_user.username))]
pub async fn create(db: &DatabaseConnection, admin: &Admin, new_user: NewUser) -> AppResult<user::Model> {
    let username = new_user.username.trim().to_owned();

    if username.is_empty() || username.contains(char::is_whitespace) {
        return Err(AppError::validation("username must be a single non-empty word"));
    }
    if new_user.full_name.trim().is_empty() {
        return Err(AppError::validation("full_name is required"));
    }
    validate_password(&new_user.password)?;
    validate_salary(new_user.base_salary)?;

    let taken = User::find()
        .filter(user::Column::Username.eq(&username))
        .one(db)
        .await?;

    if taken.is_some() {
        return Err(AppError::conflict(format!("username `{username}` is already taken")));
    }

    let user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(now()),
        updated_at: Set(now()),
        password: Set(auth::hash_password(&username, &new_user.password)),
        username: Set(username),
        full_name: Set(new_user.full_name.trim().to_owned()),
        role: Set(new_user.role),
        base_salary: Set(new_user.base_salary),
        is_active: Set(true),
    }
    .insert(db)
    .await?;

    info!(user_id = %user.id, "user created");

    Ok(user)
}

#[instrument(skip(db, admin, update), fields(admin = %admin.username))]
pub async fn update(db: &DatabaseConnection, admin: &Admin, id: Uuid, update: UserUpdate) -> AppResult<user::Model> {
    let existing = get(db, id).await?;

    if existing.id == admin.id && (update.is_active == Some(false) || update.role.is_some_and(|r| r != RoleType::Admin)) {
        return Err(AppError::Forbidden("admins cannot demote or deactivate themselves"));
    }

    let mut model = user::ActiveModel {
        id: sea_orm::ActiveValue::Unchanged(existing.id),
        updated_at: Set(now()),
        ..Default::default()
    };

    if let Some(full_name) = update.full_name {
        if full_name.trim().is_empty() {
            return Err(AppError::validation("full_name is required"));
        }
        model.full_name = Set(full_name.trim().to_owned());
    }
    if let Some(password) = update.password {
        validate_password(&password)?;
        model.password = Set(auth::hash_password(&existing.username, &password));
    }
    if let Some(role) = update.role {
        model.role = Set(role);
    }
    if let Some(base_salary) = update.base_salary {
        validate_salary(base_salary)?;
        model.base_salary = Set(base_salary);
    }
    if let Some(is_active) = update.is_active {
        model.is_active = Set(is_active);
    }

    let user = model.update(db).await?;

    info!("user updated");

    Ok(user)
}

pub async fn deactivate(db: &DatabaseConnection, admin: &Admin, id: Uuid) -> AppResult<user::Model> {
    update(
        db,
        admin,
        id,
        UserUpdate {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::auth::tests::user as fixture;

    use super::*;

    #[tokio::test]
    async fn test_authenticate() {
        let bob = fixture("bob", RoleType::Employee);

        let mut retired = fixture("retired", RoleType::Employee);
        retired.is_active = false;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![],
                vec![bob.clone()],
                vec![bob.clone()],
                vec![retired],
            ])
            .into_connection();

        assert!(matches!(authenticate(&db, "nobody", "secret").await, Err(AppError::InvalidCredentials)));
        assert!(matches!(authenticate(&db, "bob", "wrong").await, Err(AppError::InvalidCredentials)));
        assert_eq!(authenticate(&db, "bob", "secret").await.unwrap(), bob);
        assert!(matches!(authenticate(&db, "retired", "secret").await, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_user() {
        let admin = Admin::try_from(fixture("root", RoleType::Admin)).unwrap();
        let created = fixture("siti", RoleType::Employee);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![], vec![created.clone()]])
            .into_connection();

        let user = create(
            &db,
            &admin,
            NewUser {
                username: " siti ".to_owned(),
                full_name: "Siti Aminah".to_owned(),
                password: "correct horse".to_owned(),
                role: RoleType::Employee,
                base_salary: dec!(6500000),
            },
        )
        .await
        .unwrap();

        assert_eq!(user, created);
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let admin = Admin::try_from(fixture("root", RoleType::Admin)).unwrap();
        let taken = fixture("siti", RoleType::Employee);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![taken]])
            .into_connection();

        let new_user = |password: &str, base_salary| NewUser {
            username: "siti".to_owned(),
            full_name: "Siti Aminah".to_owned(),
            password: password.to_owned(),
            role: RoleType::Employee,
            base_salary,
        };

        assert!(matches!(create(&db, &admin, new_user("short", dec!(1))).await, Err(AppError::Validation(_))));
        assert!(matches!(create(&db, &admin, new_user("long enough", dec!(-1))).await, Err(AppError::Validation(_))));
        assert!(matches!(create(&db, &admin, new_user("long enough", dec!(1))).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_admin_cannot_deactivate_self() {
        let root = fixture("root", RoleType::Admin);
        let admin = Admin::try_from(root.clone()).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![root.clone()]])
            .into_connection();

        assert!(matches!(deactivate(&db, &admin, root.id).await, Err(AppError::Forbidden(_))));
    }
}
