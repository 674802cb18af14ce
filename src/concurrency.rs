//! Bounded request pool.
//!
//! The pool meters how many fetches may be outstanding at once. It knows
//! nothing about the requests themselves: callers `acquire` a [`PoolPermit`]
//! before fetching and give it back afterwards.
//!
//! A permit is released exactly once: explicitly through
//! [`PoolPermit::release`], or implicitly when it is dropped (early return,
//! error path, panic unwinding a task). Admission order is whatever the
//! underlying semaphore grants; only the bound is guaranteed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

/// Caps the number of concurrent fetches.
#[derive(Debug)]
pub struct RequestPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    counters: Arc<PoolCounters>,
}

#[derive(Debug, Default)]
struct PoolCounters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl RequestPool {
    /// Creates a pool admitting at most `capacity` concurrent units of work.
    ///
    /// A capacity of zero is rejected by the engine builder; the pool itself
    /// would simply never admit anything.
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            counters: Arc::new(PoolCounters::default()),
        }
    }

    /// Waits until a slot is free and takes it.
    pub async fn acquire(&self) -> PoolPermit {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("request pool semaphore is never closed");
        self.admit(permit)
    }

    /// Takes a slot if one is free right now.
    pub fn try_acquire(&self) -> Option<PoolPermit> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .ok()
            .map(|permit| self.admit(permit))
    }

    fn admit(&self, permit: OwnedSemaphorePermit) -> PoolPermit {
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);
        trace!(in_flight = now, capacity = self.capacity, "pool slot acquired");
        PoolPermit {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Configured bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of slots ever held at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

/// One admitted unit of work. Returns its slot to the pool when released or dropped.
#[derive(Debug)]
pub struct PoolPermit {
    _permit: OwnedSemaphorePermit,
    counters: Arc<PoolCounters>,
}

impl PoolPermit {
    /// Gives the slot back.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PoolPermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is dropped.
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_and_release_restore_capacity() {
        let pool = RequestPool::new(2);
        assert_eq!(pool.available(), 2);

        let a = pool.acquire().await;
        let b = pool.acquire().await;
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.in_flight(), 2);
        assert!(pool.try_acquire().is_none());

        a.release();
        assert_eq!(pool.available(), 1);
        drop(b);
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.in_flight(), 0);
        assert_eq!(pool.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let pool = Arc::new(RequestPool::new(1));
        let held = pool.acquire().await;

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let _permit = pool.acquire().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        held.release();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bound_holds_for_many_tasks() {
        for capacity in [1, 3, 5] {
            let pool = Arc::new(RequestPool::new(capacity));
            let mut tasks = tokio::task::JoinSet::new();
            for _ in 0..20 {
                let pool = Arc::clone(&pool);
                tasks.spawn(async move {
                    let _permit = pool.acquire().await;
                    assert!(pool.in_flight() <= capacity);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                });
            }
            while let Some(res) = tasks.join_next().await {
                res.unwrap();
            }
            assert!(pool.peak_in_flight() <= capacity);
            assert_eq!(pool.available(), capacity);
        }
    }

    #[tokio::test]
    async fn test_panicking_holder_still_releases() {
        let pool = Arc::new(RequestPool::new(1));
        let task = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let _permit = pool.acquire().await;
                panic!("fetch blew up");
            })
        };
        assert!(task.await.is_err());
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.in_flight(), 0);
    }
}
