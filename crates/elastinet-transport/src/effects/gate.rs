//! Admission control for asynchronous requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting gate bounding the number of requests in flight.
///
/// Clones share the same counter. A capacity of `0` makes the gate
/// unbounded: every acquire succeeds immediately. Capacities above
/// [`Semaphore::MAX_PERMITS`] are clamped to it.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    permits: Option<Arc<Semaphore>>,
    capacity: usize,
}

/// One unit of capacity, held until dropped or [released](Self::release).
#[derive(Debug)]
#[must_use = "dropping the slot releases it immediately"]
pub struct AdmissionSlot {
    _permit: Option<OwnedSemaphorePermit>,
}

impl AdmissionSlot {
    /// Return the slot to the gate.
    pub fn release(self) {}
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        let permits = (capacity > 0).then(|| Arc::new(Semaphore::new(capacity)));
        Self { permits, capacity }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    pub fn is_bounded(&self) -> bool {
        self.permits.is_some()
    }

    /// Configured capacity, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.is_bounded().then_some(self.capacity)
    }

    /// Slots currently free, `None` when unbounded.
    pub fn available(&self) -> Option<usize> {
        self.permits.as_ref().map(|p| p.available_permits())
    }

    /// Wait up to `timeout` for a slot.
    ///
    /// Returns `None` if no slot became free in time.
    pub async fn acquire(&self, timeout: Duration) -> Option<AdmissionSlot> {
        let Some(permits) = &self.permits else {
            return Some(AdmissionSlot { _permit: None });
        };

        match tokio::time::timeout(timeout, Arc::clone(permits).acquire_owned()).await {
            Ok(Ok(permit)) => Some(AdmissionSlot {
                _permit: Some(permit),
            }),
            // The semaphore is never closed; treat it like a timeout if it is.
            Ok(Err(_)) | Err(_) => None,
        }
    }

    /// Take a slot without waiting.
    pub fn try_acquire(&self) -> Option<AdmissionSlot> {
        let Some(permits) = &self.permits else {
            return Some(AdmissionSlot { _permit: None });
        };
        Arc::clone(permits)
            .try_acquire_owned()
            .ok()
            .map(|permit| AdmissionSlot {
                _permit: Some(permit),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_unbounded_always_admits() {
        let gate = ConcurrencyGate::unbounded();
        assert!(!gate.is_bounded());
        assert_eq!(gate.capacity(), None);
        assert_eq!(gate.available(), None);

        let slots: Vec<_> = (0..100).filter_map(|_| gate.try_acquire()).collect();
        assert_eq!(slots.len(), 100);
        assert!(gate.acquire(Duration::ZERO).await.is_some());
    }

    #[tokio::test]
    async fn test_bounded_capacity() {
        let gate = ConcurrencyGate::new(2);
        assert_eq!(gate.capacity(), Some(2));

        let a = gate.acquire(Duration::from_millis(10)).await;
        let b = gate.acquire(Duration::from_millis(10)).await;
        assert!(a.is_some() && b.is_some());
        assert_eq!(gate.available(), Some(0));
        assert!(gate.try_acquire().is_none());
    }

    #[tokio::test]
    async fn test_acquire_times_out_when_saturated() {
        let gate = ConcurrencyGate::new(1);
        let _held = gate.try_acquire().unwrap();

        let started = Instant::now();
        let slot = gate.acquire(Duration::from_millis(50)).await;
        assert!(slot.is_none());
        assert!(started.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn test_oversized_capacity_is_clamped() {
        let gate = ConcurrencyGate::new(usize::MAX);
        assert!(gate.is_bounded());
        assert_eq!(gate.capacity(), Some(Semaphore::MAX_PERMITS));
        assert_eq!(gate.available(), Some(Semaphore::MAX_PERMITS));
        assert!(gate.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_release_frees_capacity() {
        let gate = ConcurrencyGate::new(1);
        let slot = gate.try_acquire().unwrap();
        assert_eq!(gate.available(), Some(0));

        slot.release();
        assert_eq!(gate.available(), Some(1));
        assert!(gate.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_waiter_is_admitted_on_release() {
        let gate = ConcurrencyGate::new(1);
        let held = gate.try_acquire().unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire(Duration::from_secs(5)).await.is_some() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);

        assert!(waiter.await.unwrap());
    }
}
