//! In-memory connector for exercising the pool without a database
//!
//! Every connector clone shares one [`MockState`], so a test can keep a copy
//! to kill connections, inject failures and inspect what was written.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::connector::Connector;
use crate::connection_error::{ConnectError, StoreError};
use crate::record::IngestionRecord;
use crate::store::InsertTarget;
use crate::types::ConnectorId;

/// Connection produced by [`MockConnector`]
#[derive(Debug, PartialEq, Eq)]
pub struct MockConnection {
    owner: ConnectorId,
    serial: u64,
}

impl MockConnection {
    /// Connection number, starting at 1 in connect order
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

#[derive(Debug, Default)]
struct MockState {
    connects: AtomicU64,
    fail_connects: AtomicBool,
    fail_inserts: AtomicBool,
    lose_on_insert: AtomicBool,
    kill_all: AtomicBool,
    dead: Mutex<HashSet<u64>>,
    disconnected: Mutex<Vec<u64>>,
    inserted: Mutex<Vec<IngestionRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
pub struct MockConnector {
    id: ConnectorId,
    name: String,
    state: Arc<MockState>,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl MockConnector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ConnectorId::next(),
            name: name.into(),
            state: Arc::default(),
        }
    }

    /// Make every existing and future connection report itself dead
    pub fn kill_all(&self) {
        self.state.kill_all.store(true, Ordering::Release);
    }

    /// Make one connection report itself dead
    pub fn kill(&self, serial: u64) {
        lock(&self.state.dead).insert(serial);
    }

    pub fn set_fail_connects(&self, fail: bool) {
        self.state.fail_connects.store(fail, Ordering::Release);
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.state.fail_inserts.store(fail, Ordering::Release);
    }

    /// Fail inserts with a lost connection while liveness checks still pass
    pub fn set_lose_on_insert(&self, lose: bool) {
        self.state.lose_on_insert.store(lose, Ordering::Release);
    }

    /// Connections opened so far
    #[must_use]
    pub fn connects(&self) -> u64 {
        self.state.connects.load(Ordering::Acquire)
    }

    /// Serials of disconnected connections, in disconnect order
    #[must_use]
    pub fn disconnected(&self) -> Vec<u64> {
        lock(&self.state.disconnected).clone()
    }

    #[must_use]
    pub fn inserted(&self) -> Vec<IngestionRecord> {
        lock(&self.state.inserted).clone()
    }

    fn is_dead(&self, serial: u64) -> bool {
        self.state.kill_all.load(Ordering::Acquire) || lock(&self.state.dead).contains(&serial)
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Connection = MockConnection;

    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<MockConnection, ConnectError> {
        if self.state.fail_connects.load(Ordering::Acquire) {
            return Err(ConnectError::Refused {
                backend: self.name.clone(),
                reason: "connects disabled".to_string(),
            });
        }
        let serial = self.state.connects.fetch_add(1, Ordering::AcqRel) + 1;
        Ok(MockConnection {
            owner: self.id,
            serial,
        })
    }

    async fn disconnect(&self, conn: MockConnection) {
        lock(&self.state.disconnected).push(conn.serial);
    }

    async fn is_connected(&self, conn: &mut MockConnection) -> bool {
        !self.is_dead(conn.serial)
    }

    fn validate(&self, conn: &MockConnection) -> bool {
        conn.owner == self.id
    }

    async fn insert(
        &self,
        conn: &mut MockConnection,
        _target: &InsertTarget,
        record: &IngestionRecord,
    ) -> Result<u64, StoreError> {
        if self.is_dead(conn.serial) || self.state.lose_on_insert.load(Ordering::Acquire) {
            return Err(StoreError::Disconnected);
        }
        if self.state.fail_inserts.load(Ordering::Acquire) {
            return Err(StoreError::Rejected("inserts disabled".to_string()));
        }
        lock(&self.state.inserted).push(record.clone());
        Ok(1)
    }
}
