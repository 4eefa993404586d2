//! In-flight attempt deduplication.
//!
//! [`InFlight`] maps a key to the shared future of the attempt currently
//! running for it. A second caller with the same key joins that future
//! instead of starting its own. The attempt runs on its own tokio task, so
//! it completes even when every caller stops polling, and its entry is
//! removed as soon as it finishes. Nothing is cached past completion.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

/// The attempt's task ended without producing a value (panic or abort).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("attempt task aborted: {0}")]
pub struct AttemptAborted(pub String);

type SharedAttempt<T> = Shared<BoxFuture<'static, Result<T, AttemptAborted>>>;

/// Registry of running attempts keyed by `K`.
pub struct InFlight<K, T>
where
    T: Clone,
{
    attempts: Arc<Mutex<HashMap<K, SharedAttempt<T>>>>,
}

impl<K, T> Default for InFlight<K, T>
where
    T: Clone,
{
    fn default() -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Removes the key when the attempt's task finishes, however it finishes.
struct Deregister<K: Eq + Hash, T: Clone> {
    key: K,
    attempts: Arc<Mutex<HashMap<K, SharedAttempt<T>>>>,
}

impl<K: Eq + Hash, T: Clone> Drop for Deregister<K, T> {
    fn drop(&mut self) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

impl<K, T> InFlight<K, T>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the attempt running for `key`, or start `attempt` when none is.
    ///
    /// Returns the attempt's output and whether this caller joined an
    /// existing attempt. `attempt` is dropped unpolled when joining.
    pub async fn run_or_join<F>(&self, key: K, attempt: F) -> (Result<T, AttemptAborted>, bool)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (shared, joined) = {
            let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
            match attempts.get(&key) {
                Some(existing) => (existing.clone(), true),
                None => {
                    let guard = Deregister {
                        key: key.clone(),
                        attempts: Arc::clone(&self.attempts),
                    };
                    // The guard's drop takes this lock, so it cannot remove
                    // the entry before it is inserted below.
                    let handle = tokio::spawn(async move {
                        let _guard = guard;
                        attempt.await
                    });
                    let shared = handle
                        .map(|joined| joined.map_err(|e| AttemptAborted(e.to_string())))
                        .boxed()
                        .shared();
                    attempts.insert(key, shared.clone());
                    (shared, false)
                }
            }
        };
        (shared.await, joined)
    }

    /// Whether an attempt is running for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Number of attempts currently running.
    pub fn len(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn should_panic() -> bool {
        true
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_attempt() {
        let inflight: Arc<InFlight<i64, usize>> = Arc::new(InFlight::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let inflight = Arc::clone(&inflight);
            let runs = Arc::clone(&runs);
            handles.push(tokio::spawn(async move {
                inflight
                    .run_or_join(7, async move {
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        runs.fetch_add(1, Ordering::SeqCst) + 1
                    })
                    .await
            }));
        }

        let mut joined = 0;
        for handle in handles {
            let (result, was_joined) = handle.await.unwrap();
            assert_eq!(result.unwrap(), 1);
            joined += usize::from(was_joined);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(joined, 4);
        assert!(inflight.is_empty());
    }

    #[tokio::test]
    async fn finished_attempts_are_not_cached() {
        let inflight: InFlight<&'static str, u32> = InFlight::new();

        let (first, _) = inflight.run_or_join("k", async { 1 }).await;
        let (second, joined) = inflight.run_or_join("k", async { 2 }).await;

        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 2);
        assert!(!joined);
        assert!(!inflight.contains(&"k"));
    }

    #[tokio::test]
    async fn panicking_attempt_is_reported_and_deregistered() {
        let inflight: InFlight<u8, u8> = InFlight::new();

        let (result, _) = inflight
            .run_or_join(1, async {
                if should_panic() {
                    panic!("boom");
                }
                0
            })
            .await;

        assert!(result.is_err());
        assert!(inflight.is_empty());
    }

    #[tokio::test]
    async fn different_keys_run_independently() {
        let inflight: Arc<InFlight<u8, u8>> = Arc::new(InFlight::new());
        let a = inflight.run_or_join(1, async { 10 });
        let b = inflight.run_or_join(2, async { 20 });
        let ((ra, ja), (rb, jb)) = tokio::join!(a, b);
        assert_eq!((ra.unwrap(), rb.unwrap()), (10, 20));
        assert!(!ja && !jb);
    }
}
