//! Storage connector abstraction
//!
//! This module defines the `Connector` trait the resource pool is generic
//! over. A connector knows how to open, probe, reset and close one physical
//! storage connection and how to run the record insert through it. This
//! abstraction enables:
//! - Swapping the SQLite and PostgreSQL backends without touching the pool
//! - Testing the pool against in-memory test doubles

use async_trait::async_trait;
use std::fmt::Debug;

use crate::connection_error::{ConnectError, StoreError};
use crate::record::IngestionRecord;
use crate::store::InsertTarget;

/// Strategy for managing one kind of storage connection
///
/// # Examples
///
/// ```no_run
/// use linkstats::pool::{Connector, ResourcePool};
///
/// async fn example<C: Connector>(pool: ResourcePool<C>) -> anyhow::Result<()> {
///     let handle = pool.borrow().await?;
///     // Use handle.connection()...
///     pool.return_handle(handle)?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Connector: Send + Sync + Debug + 'static {
    /// The physical connection this connector produces
    type Connection: Send + 'static;

    /// Name used in logs
    fn name(&self) -> &str;

    /// Open a new connection
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the connection or does not
    /// answer within the connector's timeout.
    async fn connect(&self) -> Result<Self::Connection, ConnectError>;

    /// Close a connection, swallowing any error
    async fn disconnect(&self, conn: Self::Connection);

    /// Cheap liveness probe
    async fn is_connected(&self, conn: &mut Self::Connection) -> bool;

    /// Clear session state before the connection is handed to a borrower
    ///
    /// The default does nothing.
    async fn reset(&self, _conn: &mut Self::Connection) -> Result<(), StoreError> {
        Ok(())
    }

    /// Check that `conn` was produced by this connector instance
    fn validate(&self, conn: &Self::Connection) -> bool;

    /// Insert one record into `target`, returning the affected row count
    async fn insert(
        &self,
        conn: &mut Self::Connection,
        target: &InsertTarget,
        record: &IngestionRecord,
    ) -> Result<u64, StoreError>;
}
