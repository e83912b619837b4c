//! Quiescence-based debouncing of a changing value.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Publishes a value only after it has stopped changing for `interval`.
///
/// Each [`push`](Self::push) replaces the pending publication, so at most one
/// timer is ever outstanding. Dropping the debouncer cancels it.
pub struct Debouncer<T> {
    interval: Duration,
    output: Arc<watch::Sender<T>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, interval: Duration) -> Self {
        let (tx, _) = watch::channel(initial);
        Self {
            interval,
            output: Arc::new(tx),
            pending: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record a new source value, restarting the quiet period.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn push(&self, value: T) {
        let output = Arc::clone(&self.output);
        let interval = self.interval;

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            output.send_if_modified(|current| {
                if *current == value {
                    false
                } else {
                    *current = value;
                    true
                }
            });
        }));
    }

    /// Receiver for published values. The current value is marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.subscribe()
    }

    /// Last published value.
    pub fn current(&self) -> T {
        self.output.borrow().clone()
    }

    /// Whether a publication is scheduled but has not fired yet.
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Drop the pending publication, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}
