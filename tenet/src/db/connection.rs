use std::sync::Arc;

use libsql::{Builder, Connection};

use crate::config::DatabaseConfig;
use crate::error::Result;

use super::schema;

/// Handle to the belief graph database. Clones share the underlying
/// libsql database object.
#[derive(Clone)]
pub struct Database {
    db: Arc<libsql::Database>,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let db = open(config).await?;
        let database = Self { db: Arc::new(db) };

        let conn = database.connect()?;
        apply_pragmas(&conn, config).await;
        schema::init_schema(&conn).await?;

        Ok(database)
    }

    pub fn connect(&self) -> Result<Connection> {
        Ok(self.db.connect()?)
    }

    /// Pull replica frames from the remote primary. No-op failures are
    /// logged rather than returned; local databases always succeed.
    pub async fn sync(&self) -> Result<()> {
        match self.db.sync().await {
            Ok(replicated) => tracing::info!(?replicated, "Database replica synced"),
            Err(error) => tracing::warn!(error = %error, "Database sync failed"),
        }
        Ok(())
    }
}

async fn open(config: &DatabaseConfig) -> Result<libsql::Database> {
    if config.url == ":memory:" {
        return Ok(Builder::new_local(":memory:").build().await?);
    }

    if config.url.starts_with("libsql://") || config.url.starts_with("https://") {
        let token = config.auth_token.clone().unwrap_or_default();
        let db = match config.local_path {
            Some(ref replica_path) => {
                Builder::new_remote_replica(replica_path, config.url.clone(), token)
                    .build()
                    .await?
            }
            None => Builder::new_remote(config.url.clone(), token).build().await?,
        };
        return Ok(db);
    }

    let path = config.url.strip_prefix("file:").unwrap_or(&config.url);
    Ok(Builder::new_local(path).build().await?)
}

/// Applied once at startup. Remote backends may reject SQLite pragmas,
/// so failures are warnings, not errors.
async fn apply_pragmas(conn: &Connection, config: &DatabaseConfig) {
    let pragmas = [
        ("busy_timeout", config.busy_timeout_ms.to_string()),
        ("journal_mode", config.journal_mode.clone()),
        ("synchronous", config.synchronous.clone()),
    ];

    for (pragma, value) in pragmas {
        let sql = format!("PRAGMA {pragma} = {value}");
        if let Err(error) = conn.execute_batch(&sql).await {
            tracing::warn!(pragma, value = %value, error = %error, "Failed to apply pragma");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_strips_file_prefix() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("graph.db");
        let config = DatabaseConfig {
            url: format!("file:{}", path.to_str().unwrap()),
            ..Default::default()
        };

        let db = Database::new(&config).await.unwrap();
        db.connect().unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_in_memory_database_initializes_schema() {
        let db = Database::new(&DatabaseConfig::default()).await.unwrap();
        let conn = db.connect().unwrap();

        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'claim_occurrences'",
                (),
            )
            .await
            .unwrap();
        assert!(rows.next().await.unwrap().is_some());
    }
}
