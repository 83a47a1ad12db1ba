//! Storage backends
//!
//! Each backend provides a [`Connector`](crate::pool::Connector) that the
//! resource pool drives. The write itself is one fixed parameterized insert
//! into the table named by an [`InsertTarget`].

mod postgres;
mod sqlite;

pub use postgres::{PostgresConnection, PostgresConnector};
pub use sqlite::{SqliteConnection, SqliteConnector};

use crate::config::{DatabaseConfig, StorageBackend};
use crate::types::{SchemaName, TableName};

/// Columns written for every record, in bind order
pub const COLUMNS: [&str; 9] = [
    "os",
    "os_version",
    "browser",
    "browser_version",
    "client_ip",
    "base_url",
    "url_path",
    "full_url",
    "created_at",
];

/// Placeholder syntax of a backend's statements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `?1, ?2, ...`
    Numbered,
    /// `$1, $2, ...`
    Dollar,
}

/// The table records are inserted into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTarget {
    schema: Option<SchemaName>,
    table: TableName,
}

impl InsertTarget {
    #[must_use]
    pub fn new(schema: Option<SchemaName>, table: TableName) -> Self {
        Self { schema, table }
    }

    /// Target for the configured backend
    ///
    /// SQLite has no schemas (a dotted prefix names an attached database),
    /// so the schema only qualifies the table on PostgreSQL.
    #[must_use]
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let schema = match config.backend {
            StorageBackend::Postgres => Some(config.schema.clone()),
            StorageBackend::Sqlite => None,
        };
        Self::new(schema, config.table.clone())
    }

    #[must_use]
    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// `schema.table`, or `table` alone without a schema
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.table),
            None => self.table.to_string(),
        }
    }

    /// The insert statement for this target
    ///
    /// Identifiers are validated at construction, so interpolating them is safe.
    #[must_use]
    pub fn insert_sql(&self, placeholder: Placeholder) -> String {
        let values: Vec<String> = (1..=COLUMNS.len())
            .map(|i| match placeholder {
                Placeholder::Numbered => format!("?{}", i),
                Placeholder::Dollar => format!("${}", i),
            })
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.qualified_name(),
            COLUMNS.join(", "),
            values.join(", ")
        )
    }
}
