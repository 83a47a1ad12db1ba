//! Storage connection pooling
//!
//! [`ResourcePool`] is generic over a [`Connector`], so the same pool drives
//! the SQLite and PostgreSQL backends as well as the in-memory
//! [`MockConnector`] used by tests.

mod balancer;
mod connector;
mod error;
mod handle;
mod idle_queue;
pub mod mock;
mod prewarming;
mod resource_pool;
mod stats;

pub use connector::Connector;
pub use error::PoolError;
pub use handle::Handle;
pub use idle_queue::{IdleQueue, PopError};
pub use mock::{MockConnection, MockConnector};
pub use resource_pool::ResourcePool;
pub use stats::{QueryStats, QueryStatsSnapshot};
