use anyhow::Result;
use ormlog::Log;
use ormlog_sqlite::SqliteDatabase;

pub fn migrate(db: &SqliteDatabase) -> Result<()> {
    db.migrate::<Log>()?;
    tracing::info!("Log table is ready");
    println!("Log table is ready");
    Ok(())
}
