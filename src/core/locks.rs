//! Per-apartment mutual exclusion for booking writes.
//!
//! Booking creation and date changes run check-then-insert. Holding the
//! apartment's guard for that whole sequence stops two overlapping requests
//! from both passing the check. Different apartments never contend.
//! An apartment's entry is dropped from the registry once nobody holds or
//! waits on its mutex.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Registry of one async mutex per apartment id.
#[derive(Debug, Default, Clone)]
pub struct ApartmentLocks {
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl ApartmentLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `apartment_id`'s booking calendar.
    ///
    /// The guard releases the apartment when dropped.
    pub async fn acquire(&self, apartment_id: i64) -> ApartmentGuard {
        // Clone the Arc out so the shard lock is not held across the await
        let mutex = Arc::clone(
            self.locks
                .entry(apartment_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        trace!("Waiting for booking lock on apartment {}", apartment_id);
        ApartmentGuard {
            apartment_id,
            guard: Some(mutex.lock_owned().await),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of apartments currently locked or waited on.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive hold on one apartment's calendar.
#[derive(Debug)]
pub struct ApartmentGuard {
    apartment_id: i64,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl Drop for ApartmentGuard {
    fn drop(&mut self) {
        // Release first so the registry holds the last reference
        self.guard.take();
        // Waiters keep their own clone, so an entry with one reference is idle
        self.locks
            .remove_if(&self.apartment_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_apartment_is_exclusive() {
        let locks = ApartmentLocks::new();
        let guard = locks.acquire(1).await;

        let contender = locks.clone();
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), contender.acquire(1)).await;
        assert!(blocked.is_err());

        drop(guard);
        let reacquired =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(1)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_different_apartments_do_not_contend() {
        let locks = ApartmentLocks::new();
        let _first = locks.acquire(1).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(2)).await;
        assert!(second.is_ok());
        assert_eq!(locks.tracked(), 2);
    }

    #[tokio::test]
    async fn test_released_apartments_leave_the_registry() {
        let locks = ApartmentLocks::new();
        let first = locks.acquire(1).await;

        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            let _second = contender.acquire(1).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The waiter still needs the entry after the first holder leaves
        drop(first);
        waiter.await.unwrap();
        assert_eq!(locks.tracked(), 0);

        drop(locks.acquire(2).await);
        assert_eq!(locks.tracked(), 0);
    }
}
