use std::time::Duration;

use migration::Migrator;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;

use crate::error::AppResult;

pub async fn connect_and_migrate(database_url: &str) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url);
    opts.sqlx_logging(false);
    if is_in_memory(database_url) {
        // Every pooled connection to :memory: would see its own empty database.
        opts.max_connections(1).min_connections(1).idle_timeout(Duration::from_secs(86_400));
    }

    let db = Database::connect(opts).await?;

    if !is_in_memory(database_url) {
        pragma(&db, "PRAGMA journal_mode=WAL").await?;
        pragma(&db, "PRAGMA synchronous=NORMAL").await?;
    }

    Migrator::up(&db, None).await?;
    tracing::debug!("migrations applied");

    Ok(db)
}

async fn pragma(db: &DatabaseConnection, sql: &str) -> AppResult<()> {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_string())).await?;
    Ok(())
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
