use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

/// In-memory databases live per connection, so they get a single one.
pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let max_connections = if is_memory_url(database_url) { 1 } else { 5 };
    connect_with_settings(database_url, max_connections, 30).await
}

pub fn is_memory_url(database_url: &str) -> bool {
    let url = database_url.trim();
    url == ":memory:" || url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}

/// Opens (creating if needed) the database at `database_url`. The bare
/// `:memory:` form is accepted as an alias of `sqlite::memory:`.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let url = if database_url.trim() == ":memory:" { "sqlite::memory:" } else { database_url };
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)));
    if is_memory_url(url) {
        // Reaping the only connection would drop the database with it.
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    pool_options
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
