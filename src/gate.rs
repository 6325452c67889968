//! # Device Gates
//!
//! One [`DeviceGate`] per physical bus arbitrates exclusive access to a
//! peripheral. The gate *owns* the device: the only way to touch hardware
//! is through a lock guard, and the guard's drop is the release, so every
//! exit path — including early returns and panics — gives the device back
//! exactly once.
//!
//! Two acquisition policies coexist:
//! - [`DeviceGate::acquire`] blocks without a timeout. Used by HTTP
//!   handlers, whose contract is that an accepted request eventually runs.
//! - [`DeviceGate::acquire_retry`] makes a small fixed number of short
//!   waits with a backoff between them, then gives up. Used by the clock
//!   loop, which must skip a tick's sub-update rather than ever stall.
//!
//! [`DeviceGate::is_held`] is a racy snapshot: the answer can be stale by
//! the time the caller acts on it. It is only ever used to decide whether
//! to skip non-critical work, never for mutual exclusion itself.

use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::RetryConfig;

/// Bounded-retry tuning for the clock loop's lock attempts.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Number of acquisition attempts before giving up
    pub attempts: u32,
    /// How long each attempt waits for the lock
    pub poll_timeout: Duration,
    /// Sleep between attempts, yielding to whoever holds the gate
    pub backoff: Duration,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        RetryPolicy {
            attempts: cfg.attempts,
            poll_timeout: Duration::from_millis(cfg.poll_timeout_ms),
            backoff: Duration::from_millis(cfg.backoff_ms),
        }
    }
}

/// Exclusive owner of one peripheral. Created once at startup and shared
/// (`Arc`) between the clock loop and the HTTP handlers for the process
/// lifetime.
pub struct DeviceGate<T> {
    name: &'static str,
    inner: Mutex<T>,
}

impl<T> DeviceGate<T> {
    pub fn new(name: &'static str, device: T) -> Self {
        DeviceGate {
            name,
            inner: Mutex::new(device),
        }
    }

    /// Wait indefinitely for exclusive access.
    ///
    /// No timeout by intent: a request that was accepted must run, and
    /// back-to-back requests serialize here. If a defect ever leaked a
    /// guard this would wedge all future callers; the clock loop is
    /// shielded from that by never using this path.
    pub async fn acquire(&self) -> MutexGuard<'_, T> {
        self.inner.lock().await
    }

    /// Wait up to `timeout` for exclusive access.
    pub async fn acquire_timeout(&self, timeout: Duration) -> Option<MutexGuard<'_, T>> {
        tokio::time::timeout(timeout, self.inner.lock()).await.ok()
    }

    /// Bounded retry: `attempts` short waits separated by a backoff.
    /// Returns `None` once exhausted, logging a single warning — the
    /// caller abandons that sub-update, not its whole loop.
    pub async fn acquire_retry(&self, policy: &RetryPolicy) -> Option<MutexGuard<'_, T>> {
        for attempt in 1..=policy.attempts {
            if let Some(guard) = self.acquire_timeout(policy.poll_timeout).await {
                return Some(guard);
            }
            if attempt < policy.attempts {
                tokio::time::sleep(policy.backoff).await;
            }
        }
        tracing::warn!(
            gate = self.name,
            attempts = policy.attempts,
            "gate busy after bounded retry, skipping update"
        );
        None
    }

    /// Racy "is someone in there" snapshot. Stale by the time it returns;
    /// use only as a skip-vs-write heuristic.
    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// The marquee behind its gate, shared by the clock loop and handlers.
pub type SharedMarquee = std::sync::Arc<DeviceGate<Box<dyn crate::device::Marquee>>>;

/// The beat display behind its gate. One gate covers both channels — they
/// share a physical bus.
pub type SharedBeat = std::sync::Arc<DeviceGate<Box<dyn crate::device::BeatDisplay>>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 4,
            poll_timeout: Duration::from_millis(10),
            backoff: Duration::from_millis(500),
        }
    }

    #[tokio::test]
    async fn guard_release_frees_the_gate() {
        let gate = DeviceGate::new("test", ());
        assert!(!gate.is_held());
        {
            let _guard = gate.acquire().await;
            assert!(gate.is_held());
        }
        assert!(!gate.is_held());
    }

    #[tokio::test]
    async fn mutual_exclusion_holds_under_contention() {
        // Successful acquisitions never outnumber releases by more than
        // one: tracked with a held-counter that must stay in {0, 1}.
        let gate = Arc::new(DeviceGate::new("test", ()));
        let held = Arc::new(AtomicU32::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            let held = held.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let _guard = gate.acquire().await;
                    assert_eq!(held.fetch_add(1, Ordering::SeqCst), 0);
                    tokio::task::yield_now().await;
                    assert_eq!(held.fetch_sub(1, Ordering::SeqCst), 1);
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert!(!gate.is_held());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_succeeds_when_holder_releases_within_window() {
        let gate = Arc::new(DeviceGate::new("test", ()));
        let holder = gate.clone();

        tokio::spawn(async move {
            let _guard = holder.acquire().await;
            // Release during the second retry attempt's backoff
            tokio::time::sleep(Duration::from_millis(700)).await;
        });
        tokio::task::yield_now().await;
        assert!(gate.is_held());

        let guard = gate.acquire_retry(&quick_policy()).await;
        assert!(guard.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_gives_up_when_holder_outlasts_the_window() {
        let gate = Arc::new(DeviceGate::new("test", ()));
        let holder = gate.clone();

        tokio::spawn(async move {
            let _guard = holder.acquire().await;
            // Longer than 4 x (10ms + 500ms)
            tokio::time::sleep(Duration::from_secs(10)).await;
        });
        tokio::task::yield_now().await;

        let guard = gate.acquire_retry(&quick_policy()).await;
        assert!(guard.is_none());
        // The gate itself is still healthy once the holder finishes
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!gate.is_held());
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_timeout_zero_is_a_poll() {
        let gate = DeviceGate::new("test", ());
        let held = gate.acquire().await;
        assert!(gate
            .acquire_timeout(Duration::from_millis(0))
            .await
            .is_none());
        drop(held);
        assert!(gate
            .acquire_timeout(Duration::from_millis(0))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn gate_owns_and_hands_out_the_device() {
        let gate = DeviceGate::new("test", vec![1, 2, 3]);
        {
            let mut device = gate.acquire().await;
            device.push(4);
        }
        assert_eq!(*gate.acquire().await, vec![1, 2, 3, 4]);
    }
}
