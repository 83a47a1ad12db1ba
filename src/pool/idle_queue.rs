//! Bounded FIFO of idle handles
//!
//! A lock-free `ArrayQueue` holds the items and a semaphore counts how many
//! are queued. Every pop first takes a permit and every push adds one after
//! the item is in place, so the permit count never exceeds the queue length
//! and a held permit always has an item behind it.

use crossbeam::queue::ArrayQueue;
use tokio::sync::Semaphore;
use tokio::time::Duration;

/// Why a timed pop returned without an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    Timeout,
    Closed,
}

#[derive(Debug)]
pub struct IdleQueue<T> {
    items: ArrayQueue<T>,
    queued: Semaphore,
}

impl<T> IdleQueue<T> {
    /// Create a queue holding at most `capacity` items (at least one)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            items: ArrayQueue::new(capacity.max(1)),
            queued: Semaphore::new(0),
        }
    }

    /// Pop the oldest item without waiting
    pub fn try_pop(&self) -> Option<T> {
        let permit = self.queued.try_acquire().ok()?;
        permit.forget();
        self.items.pop()
    }

    /// Pop the oldest item, waiting up to `timeout` for one to arrive
    pub async fn pop(&self, timeout: Duration) -> Result<T, PopError> {
        match tokio::time::timeout(timeout, self.queued.acquire()).await {
            Err(_) => Err(PopError::Timeout),
            Ok(Err(_)) => Err(PopError::Closed),
            Ok(Ok(permit)) => {
                permit.forget();
                self.items.pop().ok_or(PopError::Closed)
            }
        }
    }

    /// Push an item, handing it back when the queue is full or closed
    pub fn push(&self, item: T) -> Result<(), T> {
        if self.is_closed() {
            return Err(item);
        }
        self.items.push(item)?;
        self.queued.add_permits(1);
        Ok(())
    }

    /// Wake every waiting popper with [`PopError::Closed`] and refuse new pushes
    pub fn close(&self) {
        self.queued.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.queued.is_closed()
    }

    /// Remove every queued item regardless of permits
    ///
    /// Only meaningful once the queue is closed.
    pub fn drain(&self) -> Vec<T> {
        std::iter::from_fn(|| self.items.pop()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }
}
