use std::process::ExitCode;

use sea_orm::DbErr;
use thiserror::Error;

use crate::entity::sea_orm_active_enums::{LeaveStatus, PayrollStatus};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error")]
    Database(#[from] DbErr),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("outside of office area ({distance_meters:.0}m away, allowed {radius_meters:.0}m)")]
    OutsideGeofence {
        distance_meters: f64,
        radius_meters: f64,
    },

    #[error("leave request is {0:?}, only pending requests can be reviewed")]
    LeaveNotPending(LeaveStatus),

    #[error("payroll run is {0:?}, only runs pending approval can be reviewed")]
    PayrollNotPending(PayrollStatus),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to render output")]
    Output(#[from] serde_json::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Exit status reported by the command line front end
    pub fn code(&self) -> u8 {
        match self {
            AppError::Database(_) => 10,
            AppError::Config(_) | AppError::Output(_) => 11,
            AppError::InvalidCredentials => 20,
            AppError::Forbidden(_) => 21,
            AppError::NotFound(_) => 30,
            AppError::Validation(_) | AppError::OutsideGeofence { .. } => 40,
            AppError::Conflict(_) | AppError::LeaveNotPending(_) | AppError::PayrollNotPending(_) => 41,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}
