use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

const MEMORY_URL: &str = "sqlite::memory:";

/// Open a pool, creating the database file on first use.
///
/// `:memory:` is shorthand for `sqlite::memory:`. In-memory databases are
/// per-connection, so their pools are pinned to a single connection.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let url = if database_url.trim() == ":memory:" { MEMORY_URL } else { database_url };
    let max_connections = if url.contains(":memory:") { 1 } else { max_connections.max(1) };
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect_with(options)
        .await
}
