use std::{env, path::PathBuf};

use sea_orm::ConnectOptions;
use tracing::info;

use crate::{
    consts::DEFAULT_LOG_PATH,
    error::{AppError, AppResult},
};

pub struct Config {
    pub database_opt: ConnectOptions,
}

pub fn load() -> AppResult<Config> {
    Ok(Config {
        database_opt: load_database_opt()?,
    })
}

/// Read before the subscriber exists, so nothing is logged here
pub fn trace_log_path() -> PathBuf {
    env::var_os("TRACE_LOG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH))
}

fn load_database_opt() -> AppResult<ConnectOptions> {
    info!("Loading environment `DATABASE_URL`");

    let var = env::var("DATABASE_URL")
        .map_err(|_| AppError::Config("environment `DATABASE_URL` is required to be set".to_owned()))?;

    Ok(ConnectOptions::new(var))
}
