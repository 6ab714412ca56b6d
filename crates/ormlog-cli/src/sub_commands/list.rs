use anyhow::Result;
use clap::Args;
use ormlog::{Log, LogLevel};
use ormlog_sqlite::SqliteDatabase;

#[derive(Args)]
pub struct ListSubCommand {
    /// Only the most recent rows
    #[arg(short, long)]
    limit: Option<usize>,
}

fn level_name(level: i32) -> String {
    LogLevel::try_from(level)
        .map(|level| level.to_string())
        .unwrap_or_else(|_| level.to_string())
}

pub fn list(db: &SqliteDatabase, sub_command_args: &ListSubCommand) -> Result<()> {
    let logs = db.context().all::<Log>()?;
    let skip = sub_command_args
        .limit
        .map(|limit| logs.len().saturating_sub(limit))
        .unwrap_or_default();

    for log in logs.iter().skip(skip) {
        println!(
            "{} {:>11} {} [{}] {}",
            log.time_stamp.to_rfc3339(),
            level_name(log.level),
            log.name,
            log.event_id,
            log.message
        );
    }

    Ok(())
}
