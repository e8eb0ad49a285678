use std::ops::Deref;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    entity::{sea_orm_active_enums::RoleType, user},
    error::AppError,
};

/// Poor man's password storage, digest of `password:username`
pub fn hash_password(username: &str, password: &str) -> Vec<u8> {
    Sha256::digest(format!("{}:{}", password, username)).to_vec()
}

pub fn verify_password(user: &user::Model, password: &str) -> bool {
    hash_password(&user.username, password) == user.password
}

/// A user proven to hold the admin role
#[derive(Debug)]
pub struct Admin(pub user::Model);

impl Deref for Admin {
    type Target = user::Model;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<user::Model> for Admin {
    type Error = AppError;

    fn try_from(user: user::Model) -> Result<Self, Self::Error> {
        if user.role != RoleType::Admin {
            return Err(AppError::Forbidden("admin only"));
        }

        Ok(Self(user))
    }
}

/// A user allowed to review leave requests and attendance of others, admins and managers
#[derive(Debug)]
pub struct Approver(pub user::Model);

impl Deref for Approver {
    type Target = user::Model;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<user::Model> for Approver {
    type Error = AppError;

    fn try_from(user: user::Model) -> Result<Self, Self::Error> {
        if let RoleType::Admin | RoleType::Manager = user.role {
            return Ok(Self(user));
        }

        Err(AppError::Forbidden("admin or manager only"))
    }
}

/// Employees may only look at their own data
pub fn ensure_can_view(actor: &user::Model, user_id: Uuid) -> Result<(), AppError> {
    if actor.id == user_id || actor.role != RoleType::Employee {
        return Ok(());
    }

    Err(AppError::Forbidden("cannot access another employee's data"))
}
