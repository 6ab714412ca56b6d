//! ormlog command line host
//!
//! Installs a console layer and the SQL layer on a registry, then writes or reads rows of the
//! configured SQLite database.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use ormlog::{Log, SqlLoggingExt};
use ormlog_sqlite::SqliteDatabase;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

mod cli;
mod config;
mod sub_commands;

use cli::{Cli, Commands};
use config::Settings;

const DEFAULT_WORK_DIR: &str = ".ormlog";

fn work_dir(args: &Cli) -> Result<PathBuf> {
    match &args.work_dir {
        Some(work_dir) => Ok(work_dir.clone()),
        None => home::home_dir()
            .map(|home_dir| home_dir.join(DEFAULT_WORK_DIR))
            .ok_or_else(|| anyhow!("Unknown home directory, pass --work-dir")),
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    let work_dir = work_dir(&args)?;
    fs::create_dir_all(&work_dir)?;

    let settings = Settings::new(
        args.config
            .clone()
            .unwrap_or_else(|| work_dir.join("config.toml")),
    );

    let db = SqliteDatabase::new(settings.database.sqlite_config(&work_dir))?;
    if !matches!(args.command, Commands::Migrate) {
        db.migrate::<Log>()?;
    }

    let console_filter = EnvFilter::new(format!("{},ormlog_sqlite=warn", args.log_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(console_filter))
        .with_sql_logger_filtered::<Log, _>(db.clone(), settings.logging.targets())
        .init();

    tracing::debug!("Using work dir {}", work_dir.display());

    match &args.command {
        Commands::Migrate => sub_commands::migrate::migrate(&db),
        Commands::Emit(sub_command_args) => {
            sub_commands::emit::emit(&db, &settings.logging, sub_command_args)
        }
        Commands::List(sub_command_args) => sub_commands::list::list(&db, sub_command_args),
    }
}
