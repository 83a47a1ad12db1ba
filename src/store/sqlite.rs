//! SQLite backend
//!
//! rusqlite is synchronous, so every call that touches the database file
//! runs on the blocking thread pool. The connection is moved into the
//! blocking task and handed back with the result.

use async_trait::async_trait;
use rusqlite::params;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::{InsertTarget, Placeholder};
use crate::config::DatabaseConfig;
use crate::connection_error::{ConnectError, StoreError};
use crate::pool::Connector;
use crate::record::IngestionRecord;
use crate::types::{ConnectorId, TableName};

/// An open database file; `None` once a blocking task lost it
#[derive(Debug)]
pub struct SqliteConnection {
    owner: ConnectorId,
    conn: Option<rusqlite::Connection>,
}

#[derive(Debug, Clone)]
pub struct SqliteConnector {
    id: ConnectorId,
    name: String,
    path: PathBuf,
    table: TableName,
    timeout: Duration,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>, table: TableName, timeout: Duration) -> Self {
        let path = path.into();
        Self {
            id: ConnectorId::next(),
            name: format!("sqlite:{}", path.display()),
            path,
            table,
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(
            config.sqlite_path.clone(),
            config.table.clone(),
            config.connect_timeout,
        )
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// DDL for the link statistics table
    fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                os TEXT NOT NULL,
                os_version TEXT,
                browser TEXT NOT NULL,
                browser_version TEXT,
                client_ip TEXT,
                base_url TEXT NOT NULL,
                url_path TEXT NOT NULL,
                full_url TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            self.table
        )
    }

    fn open(path: &Path, timeout: Duration, ddl: &str) -> rusqlite::Result<rusqlite::Connection> {
        let conn = rusqlite::Connection::open(path)?;
        conn.busy_timeout(timeout)?;
        conn.execute_batch(ddl)?;
        Ok(conn)
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    type Connection = SqliteConnection;

    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<SqliteConnection, ConnectError> {
        let path = self.path.clone();
        let timeout = self.timeout;
        let ddl = self.create_table_sql();
        let task = tokio::task::spawn_blocking(move || Self::open(&path, timeout, &ddl));

        let conn = match tokio::time::timeout(self.timeout, task).await {
            Err(_) => {
                return Err(ConnectError::Timeout {
                    backend: self.name.clone(),
                    timeout: self.timeout,
                });
            }
            Ok(Err(source)) => {
                return Err(ConnectError::Join {
                    backend: self.name.clone(),
                    source,
                });
            }
            Ok(Ok(result)) => result.map_err(|source| ConnectError::Sqlite {
                path: self.path.display().to_string(),
                source,
            })?,
        };

        debug!(backend = %self.name, "Opened SQLite connection");
        Ok(SqliteConnection {
            owner: self.id,
            conn: Some(conn),
        })
    }

    async fn disconnect(&self, mut conn: SqliteConnection) {
        let Some(conn) = conn.conn.take() else {
            return;
        };
        let closed = tokio::task::spawn_blocking(move || conn.close().map_err(|(_, e)| e)).await;
        match closed {
            Ok(Ok(())) => debug!(backend = %self.name, "Closed SQLite connection"),
            Ok(Err(e)) => debug!(backend = %self.name, error = %e, "Error closing SQLite connection"),
            Err(e) => debug!(backend = %self.name, error = %e, "SQLite close task failed"),
        }
    }

    async fn is_connected(&self, conn: &mut SqliteConnection) -> bool {
        conn.conn.is_some()
    }

    async fn reset(&self, conn: &mut SqliteConnection) -> Result<(), StoreError> {
        let db = conn.conn.take().ok_or(StoreError::Disconnected)?;
        let (db, result) = tokio::task::spawn_blocking(move || {
            let result = if db.is_autocommit() {
                Ok(())
            } else {
                db.execute_batch("ROLLBACK")
            };
            (db, result)
        })
        .await?;

        conn.conn = Some(db);
        Ok(result?)
    }

    fn validate(&self, conn: &SqliteConnection) -> bool {
        conn.owner == self.id
    }

    async fn insert(
        &self,
        conn: &mut SqliteConnection,
        target: &InsertTarget,
        record: &IngestionRecord,
    ) -> Result<u64, StoreError> {
        let db = conn.conn.take().ok_or(StoreError::Disconnected)?;
        let sql = target.insert_sql(Placeholder::Numbered);
        let record = record.clone();

        let (db, result) = tokio::task::spawn_blocking(move || {
            let result = db.prepare_cached(&sql).and_then(|mut stmt| {
                stmt.execute(params![
                    record.os,
                    record.os_version,
                    record.browser,
                    record.browser_version,
                    record.client_ip,
                    record.base_url,
                    record.url_path,
                    record.full_url,
                    record.created_at_text(),
                ])
            });
            (db, result)
        })
        .await?;

        conn.conn = Some(db);
        Ok(result? as u64)
    }
}
