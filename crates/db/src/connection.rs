use std::str::FromStr;
use std::time::Duration;

use snapbill_core::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(database_url, 5, 30).await
}

pub async fn connect_with_config(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

/// File-backed databases are created on first connect. In-memory databases
/// live per connection, so their pool is pinned to a single connection.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let max_connections = if is_in_memory(database_url) { 1 } else { max_connections.max(1) };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect_with(options)
        .await
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

pub async fn ping(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::{connect_with_settings, is_in_memory, ping};

    #[tokio::test]
    async fn connections_enforce_foreign_keys() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");

        let enabled = sqlx::query("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("read pragma")
            .get::<i64, _>(0);

        assert_eq!(enabled, 1);
        ping(&pool).await.expect("ping");
    }

    #[tokio::test]
    async fn in_memory_pool_shares_one_database() {
        let pool = connect_with_settings("sqlite::memory:", 5, 30).await.expect("connect");
        sqlx::query("CREATE TABLE probe (id INTEGER)").execute(&pool).await.expect("create");

        let mut handles = Vec::new();
        for _ in 0..3 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                sqlx::query("SELECT COUNT(*) FROM probe").fetch_one(&pool).await.map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("probe table visible");
        }

        assert!(is_in_memory("sqlite::memory:"));
        assert!(!is_in_memory("sqlite://snapbill.db"));
    }
}
