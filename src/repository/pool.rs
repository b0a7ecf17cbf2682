//! SQLite connection factory.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! for SQLite. Since SQLite connections are lightweight and file-based, we
//! create a new connection per operation rather than pooling.

use std::path::Path;

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, SimpleAsyncConnection};

use super::util::to_diesel_error;

/// Per-connection settings. Page workers open connections concurrently, so a
/// writer waits on a held lock instead of failing with SQLITE_BUSY.
const CONNECTION_PRAGMAS: &str = "PRAGMA busy_timeout = 30000; PRAGMA synchronous = NORMAL;";

/// Diesel error type alias.
pub type DbError = diesel::result::Error;

/// Async SQLite connection type.
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// SQLite connection pool (lightweight - creates connections on demand).
#[derive(Clone, Debug)]
pub struct DbPool {
    database_url: String,
}

impl DbPool {
    /// Create a pool from a database URL or plain file path.
    pub fn new(database_url: &str) -> Self {
        // Strip sqlite: prefix if present
        let url = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
        let url = url.strip_prefix("//").unwrap_or(url);
        Self {
            database_url: url.to_string(),
        }
    }

    /// Create pool from a file path.
    pub fn from_path(path: &Path) -> Self {
        Self::new(&path.display().to_string())
    }

    /// Get a connection with the busy timeout applied.
    pub async fn get(&self) -> Result<SqliteConn, DbError> {
        let mut conn = SqliteConn::establish(&self.database_url)
            .await
            .map_err(to_diesel_error)?;
        conn.batch_execute(CONNECTION_PRAGMAS).await?;
        Ok(conn)
    }

    /// Get the database URL (without the `sqlite:` prefix).
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::sql_types::BigInt;
    use diesel::QueryableByName;
    use diesel_async::RunQueryDsl;
    use tempfile::tempdir;

    #[derive(QueryableByName)]
    struct Timeout {
        #[diesel(sql_type = BigInt)]
        timeout: i64,
    }

    #[tokio::test]
    async fn test_connections_wait_on_locks() {
        let dir = tempdir().unwrap();
        let pool = DbPool::from_path(&dir.path().join("test.db"));
        let mut conn = pool.get().await.unwrap();

        let row: Timeout = diesel::sql_query("PRAGMA busy_timeout")
            .get_result(&mut conn)
            .await
            .unwrap();
        assert_eq!(row.timeout, 30000);
    }

    #[test]
    fn test_prefix_stripping() {
        assert_eq!(DbPool::new("sqlite:/tmp/a.db").database_url(), "/tmp/a.db");
        assert_eq!(DbPool::new("sqlite:///tmp/a.db").database_url(), "/tmp/a.db");
        assert_eq!(DbPool::new("/tmp/a.db").database_url(), "/tmp/a.db");
        assert_eq!(DbPool::new(":memory:").database_url(), ":memory:");
    }
}
