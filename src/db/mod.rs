use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;

/// Opens (creating if needed) the catalog database and applies pending migrations.
///
/// The `REGEXP` SQL function is registered on every connection so `*_regex`
/// filters can run server-side.
pub async fn connect(db_path: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .with_regexp();

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    migrate(&pool).await?;
    info!("Database ready at {db_path}");
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Removes an existing database file so the next `connect` starts empty.
pub async fn recreate(db_path: &str) -> Result<()> {
    match tokio::fs::remove_file(db_path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Single-connection in-memory pool with the schema applied.
///
/// The connection is never recycled, otherwise the database would vanish with it.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid in-memory url")
        .foreign_keys(true)
        .with_regexp();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<std::time::Duration>)
        .max_lifetime(None::<std::time::Duration>)
        .connect_with(options)
        .await
        .expect("open in-memory database");
    migrate(&pool).await.expect("apply migrations");
    pool
}
