use std::{fs::OpenOptions, process::ExitCode};

use clap::Parser as _;
use sea_orm::Database;
use tracing::{error, Level};
use tracing_subscriber::{filter, fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::{cli::Cli, error::AppResult};

mod config;
mod consts;
mod utils;

mod auth;
mod cli;
mod entity;
mod error;
mod logic;
mod services;

fn setup_tracing() -> AppResult<()> {
    let log_path = config::trace_log_path();

    let log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
        .map_err(|e| error::AppError::Config(format!("unable to open `{}`: {e}", log_path.display())))?;

    let subscriber = Registry::default()
        .with(
            fmt::layer()
                .with_ansi(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(log_file)
                .with_filter(filter::LevelFilter::from_level(Level::TRACE))
        );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| error::AppError::Config(e.to_string()))
}

async fn run(cli: Cli) -> AppResult<serde_json::Value> {
    let config::Config { database_opt } = config::load()?;

    let database = Database::connect(database_opt).await?;

    cli::run(&database, cli).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = setup_tracing() {
        eprintln!("{e}");
        return e.exit_code();
    }

    match run(cli).await {
        Ok(output) => {
            match serde_json::to_string_pretty(&output) {
                Ok(output) => println!("{output}"),
                Err(e) => {
                    error!(error = %e, "unable to render output");
                    return error::AppError::from(e).exit_code();
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = ?e, "command failed");
            eprintln!("error: {e}");

            e.exit_code()
        }
    }
}
