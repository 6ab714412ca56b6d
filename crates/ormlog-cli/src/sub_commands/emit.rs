use anyhow::{bail, Result};
use clap::Args;
use ormlog::{EventId, Log, LogLevel, Logger, LoggerProvider, LoggerSettings, SqlLoggerProvider};
use ormlog_sqlite::SqliteDatabase;

#[derive(Args)]
pub struct EmitSubCommand {
    /// Category of the record
    #[arg(long, default_value = "ormlog_cli")]
    category: String,
    /// Level: trace, debug, information, warning, error or critical
    #[arg(long, default_value = "information")]
    level: LogLevel,
    /// Event id
    #[arg(long, default_value_t = 0)]
    event_id: i32,
    /// Message
    message: String,
}

fn render(message: &str, _: Option<&(dyn std::error::Error + 'static)>) -> Option<String> {
    Some(message.to_owned())
}

pub fn emit(
    db: &SqliteDatabase,
    settings: &LoggerSettings,
    sub_command_args: &EmitSubCommand,
) -> Result<()> {
    let provider = SqlLoggerProvider::<_, Log>::builder(db.clone())
        .filter({
            let filter = settings.filter();
            move |category: &str, level| filter(category, level)
        })
        .build();
    let logger = provider.create_logger(&sub_command_args.category)?;

    if !logger.is_enabled(sub_command_args.level) {
        bail!(
            "{} records of {} are filtered out by the settings",
            sub_command_args.level,
            sub_command_args.category
        );
    }

    logger.log(
        sub_command_args.level,
        EventId::from(sub_command_args.event_id),
        sub_command_args.message.as_str(),
        None,
        Some(&render),
    )?;

    println!("Written");
    Ok(())
}
