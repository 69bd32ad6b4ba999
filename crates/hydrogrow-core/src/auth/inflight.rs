use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

/// `None` output means the spawned work panicked or was aborted.
type Pending<T> = Option<(u64, Shared<BoxFuture<'static, Option<T>>>)>;

fn lock<T>(slot: &Mutex<Pending<T>>) -> MutexGuard<'_, Pending<T>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Empties the slot when the spawned work ends, including by panic.
struct ClearSlot<T> {
    slot: Arc<Mutex<Pending<T>>>,
    id: u64,
}

impl<T> Drop for ClearSlot<T> {
    fn drop(&mut self) {
        let mut pending = lock(&self.slot);
        if matches!(pending.as_ref(), Some((current, _)) if *current == self.id) {
            *pending = None;
        }
    }
}

/// At most one pending run of an operation; overlapping callers share its result.
///
/// The work runs on a spawned task that keeps the slot occupied until it
/// finishes, whether or not anyone is still awaiting it.
pub(crate) struct InFlight<T> {
    pending: Arc<Mutex<Pending<T>>>,
    next_id: AtomicU64,
}

impl<T> InFlight<T> {
    pub(crate) fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        lock(&self.pending).is_some()
    }
}

impl<T> InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Join the pending run if there is one, otherwise spawn `start()`.
    pub(crate) async fn run<F, Fut>(&self, label: &'static str, start: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let fut = {
            let mut pending = lock(&self.pending);
            match pending.as_ref() {
                Some((_, fut)) => {
                    debug!(operation = label, "Joining in-flight operation");
                    fut.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let work = start();
                    let clear = ClearSlot {
                        slot: Arc::clone(&self.pending),
                        id,
                    };
                    // Spawned while the slot is locked, so the clear always
                    // runs after the entry is installed
                    let task = tokio::spawn(async move {
                        let _clear = clear;
                        work.await
                    });
                    let fut = async move {
                        task.await
                            .map_err(|e| warn!(operation = label, error = %e, "In-flight task failed"))
                            .ok()
                    }
                    .boxed()
                    .shared();
                    *pending = Some((id, fut.clone()));
                    fut
                }
            }
        };

        fut.await
    }
}
