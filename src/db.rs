use anyhow::Context;
use migration::Migrator;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, SqlxSqliteConnector, Statement,
    sqlx::sqlite::SqlitePoolOptions,
};
use sea_orm_migration::MigratorTrait;

use crate::error::AppResult;

pub async fn connect_and_migrate(
    database_url: &str,
    max_connections: u32,
) -> AppResult<DatabaseConnection> {
    let db = if database_url.contains(":memory:") {
        let pool = in_memory_pool_options()
            .connect(database_url)
            .await
            .context("open in-memory sqlite database")?;
        SqlxSqliteConnector::from_sqlx_sqlite_pool(pool)
    } else {
        let mut options = ConnectOptions::new(database_url);
        options.max_connections(max_connections.max(1));
        Database::connect(options).await?
    };

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA journal_mode=WAL".to_string(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA synchronous=NORMAL".to_string(),
    ))
    .await?;

    Migrator::up(&db, None).await?;
    tracing::debug!("migrations applied");

    Ok(db)
}

// An in-memory database lives exactly as long as its one connection, so the
// pool must never open a second one or retire the first.
fn in_memory_pool_options() -> SqlitePoolOptions {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_pool_keeps_its_only_connection() {
        let options = in_memory_pool_options();
        assert_eq!(options.get_max_connections(), 1);
        assert_eq!(options.get_min_connections(), 1);
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);
    }

    #[tokio::test]
    async fn in_memory_database_survives_between_queries() {
        let db = connect_and_migrate("sqlite::memory:", 5).await.unwrap();
        for _ in 0..3 {
            db.execute(Statement::from_string(
                db.get_database_backend(),
                "SELECT count(*) FROM movie".to_string(),
            ))
            .await
            .unwrap();
        }
    }
}
