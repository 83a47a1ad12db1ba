//! PostgreSQL backend
//!
//! Each pooled handle is one `tokio_postgres::Client`; its connection future
//! runs on a spawned task and ends when the client is dropped.

use async_trait::async_trait;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Statement};
use tracing::debug;

use super::{InsertTarget, Placeholder};
use crate::config::DatabaseConfig;
use crate::connection_error::{ConnectError, StoreError};
use crate::pool::Connector;
use crate::record::IngestionRecord;
use crate::types::ConnectorId;

pub struct PostgresConnection {
    owner: ConnectorId,
    client: Client,
    /// Insert statement prepared on first use, with the SQL it was built from
    insert: Option<(String, Statement)>,
}

impl std::fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("owner", &self.owner)
            .field("closed", &self.client.is_closed())
            .field("prepared", &self.insert.is_some())
            .finish()
    }
}

impl PostgresConnection {
    async fn insert_statement(&mut self, sql: String) -> Result<Statement, tokio_postgres::Error> {
        if let Some((prepared_sql, statement)) = &self.insert {
            if *prepared_sql == sql {
                return Ok(statement.clone());
            }
        }
        let statement = self.client.prepare(&sql).await?;
        self.insert = Some((sql, statement.clone()));
        Ok(statement)
    }
}

#[derive(Clone)]
pub struct PostgresConnector {
    id: ConnectorId,
    name: String,
    host: String,
    port: u16,
    config: tokio_postgres::Config,
    timeout: Duration,
}

impl std::fmt::Debug for PostgresConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // tokio_postgres::Config redacts the password in its own Debug
        f.debug_struct("PostgresConnector")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PostgresConnector {
    #[must_use]
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let mut pg = tokio_postgres::Config::new();
        pg.host(config.host.as_str())
            .port(config.port.get())
            .dbname(&config.name)
            .user(&config.username)
            .application_name("linkstats")
            .connect_timeout(config.connect_timeout);
        if !config.password.is_empty() {
            pg.password(&config.password);
        }

        Self {
            id: ConnectorId::next(),
            name: format!("postgres:{}:{}/{}", config.host, config.port, config.name),
            host: config.host.to_string(),
            port: config.port.get(),
            config: pg,
            timeout: config.connect_timeout,
        }
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    type Connection = PostgresConnection;

    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<PostgresConnection, ConnectError> {
        let (client, connection) =
            match tokio::time::timeout(self.timeout, self.config.connect(NoTls)).await {
                Err(_) => {
                    return Err(ConnectError::Timeout {
                        backend: self.name.clone(),
                        timeout: self.timeout,
                    });
                }
                Ok(result) => result.map_err(|source| ConnectError::Postgres {
                    host: self.host.clone(),
                    port: self.port,
                    source,
                })?,
            };

        let backend = self.name.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!(backend = %backend, error = %e, "PostgreSQL connection ended with error");
            }
        });

        debug!(backend = %self.name, "Opened PostgreSQL connection");
        Ok(PostgresConnection {
            owner: self.id,
            client,
            insert: None,
        })
    }

    async fn disconnect(&self, conn: PostgresConnection) {
        // Dropping the client terminates the connection task
        drop(conn);
        debug!(backend = %self.name, "Closed PostgreSQL connection");
    }

    async fn is_connected(&self, conn: &mut PostgresConnection) -> bool {
        !conn.client.is_closed()
    }

    fn validate(&self, conn: &PostgresConnection) -> bool {
        conn.owner == self.id
    }

    async fn insert(
        &self,
        conn: &mut PostgresConnection,
        target: &InsertTarget,
        record: &IngestionRecord,
    ) -> Result<u64, StoreError> {
        if conn.client.is_closed() {
            return Err(StoreError::Disconnected);
        }
        let statement = conn
            .insert_statement(target.insert_sql(Placeholder::Dollar))
            .await?;

        let created_at = record.created_at.naive_utc();
        let params: [&(dyn ToSql + Sync); 9] = [
            &record.os,
            &record.os_version,
            &record.browser,
            &record.browser_version,
            &record.client_ip,
            &record.base_url,
            &record.url_path,
            &record.full_url,
            &created_at,
        ];
        Ok(conn.client.execute(&statement, &params).await?)
    }
}
