//! Counting gate bounding the number of in-flight fetch tasks.
//!
//! A [`Gate`] hands out at most `capacity` [`GatePermit`]s at a time.
//! Acquiring suspends the caller until a permit is free; dropping the permit
//! releases it. Because release is tied to the permit's lifetime, every
//! successful acquire is matched by exactly one release on every exit path.
//!
//! Closing the gate wakes every waiter empty-handed and refuses later
//! acquires. Permits already handed out stay valid until dropped.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Fixed-capacity counting semaphore shared by the tasks of one run.
#[derive(Debug, Clone)]
pub struct Gate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// One unit of gate capacity. Released when dropped.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl Gate {
    /// Create a gate with `capacity` permits.
    ///
    /// A zero capacity would never admit anything; callers validate the
    /// limit before building a gate.
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free permit and take it.
    ///
    /// Returns `None` once the gate is closed, including when it closes while
    /// the caller is waiting.
    pub async fn acquire(&self) -> Option<GatePermit> {
        if self.semaphore.available_permits() == 0 {
            tracing::trace!(capacity = self.capacity, "gate full, waiting for a permit");
        }
        match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => Some(GatePermit { _permit: permit }),
            Err(_) => {
                tracing::trace!("gate closed, refusing permit");
                None
            }
        }
    }

    /// Stop admitting. Pending and future acquires return `None`.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Whether [`close`](Self::close) has been called on this gate or a clone.
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Total number of permits.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held (`capacity - available`).
    pub fn occupied(&self) -> usize {
        self.capacity - self.available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_new_gate_has_full_capacity() {
        let gate = Gate::new(5);
        assert_eq!(gate.capacity(), 5);
        assert_eq!(gate.available(), 5);
        assert_eq!(gate.occupied(), 0);
    }

    #[tokio::test]
    async fn test_acquire_and_release_adjust_occupancy() {
        let gate = Gate::new(1);

        let permit = gate.acquire().await.unwrap();
        assert_eq!(gate.occupied(), 1);
        assert_eq!(gate.available(), 0);

        drop(permit);
        assert_eq!(gate.occupied(), 0);
        assert_eq!(gate.available(), 1);
    }

    #[test]
    fn test_second_acquire_waits_for_release() {
        let gate = Gate::new(1);

        let mut first = task::spawn(gate.acquire());
        let held = assert_ready!(first.poll()).unwrap();

        let mut second = task::spawn(gate.acquire());
        assert_pending!(second.poll());
        assert_pending!(second.poll());

        drop(held);
        assert!(second.is_woken());
        let permit = assert_ready!(second.poll()).unwrap();
        assert_eq!(gate.occupied(), 1);
        drop(permit);
        assert_eq!(gate.available(), 1);
    }

    #[test]
    fn test_capacity_bounds_concurrent_holders() {
        let gate = Gate::new(3);

        let mut held = Vec::new();
        for _ in 0..3 {
            let mut acquire = task::spawn(gate.acquire());
            held.push(assert_ready!(acquire.poll()).unwrap());
        }

        let mut fourth = task::spawn(gate.acquire());
        assert_pending!(fourth.poll());

        held.pop();
        assert_ready!(fourth.poll()).unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_permits() {
        let gate = Gate::new(2);
        let other = gate.clone();

        let _a = gate.acquire().await.unwrap();
        let _b = other.acquire().await.unwrap();
        assert_eq!(gate.available(), 0);
        assert_eq!(other.available(), 0);
    }

    #[tokio::test]
    async fn test_closed_gate_admits_nothing() {
        let gate = Gate::new(2);
        let held = gate.acquire().await.unwrap();

        gate.close();
        assert!(gate.is_closed());
        assert!(gate.acquire().await.is_none());

        // A permit taken before closing stays held.
        assert_eq!(gate.occupied(), 1);
        drop(held);
    }

    #[test]
    fn test_close_wakes_waiting_acquire() {
        let gate = Gate::new(1);
        let mut first = task::spawn(gate.acquire());
        let _held = assert_ready!(first.poll()).unwrap();

        let mut waiting = task::spawn(gate.acquire());
        assert_pending!(waiting.poll());

        gate.clone().close();
        assert!(waiting.is_woken());
        assert!(assert_ready!(waiting.poll()).is_none());
    }
}
