use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;

use crate::sub_commands;

/// Write log rows to SQLite and read them back
#[derive(Parser)]
#[command(name = "ormlog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to working dir
    #[arg(short, long, env = "ORMLOG_WORK_DIR")]
    pub work_dir: Option<PathBuf>,
    /// Path to the config file, `<work dir>/config.toml` by default
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Console logging level
    #[arg(short, long, default_value = "warn")]
    pub log_level: Level,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the log table
    Migrate,
    /// Write one row through the SQL logger
    Emit(sub_commands::emit::EmitSubCommand),
    /// Print stored rows
    List(sub_commands::list::ListSubCommand),
}
