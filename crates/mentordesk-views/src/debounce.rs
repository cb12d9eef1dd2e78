//! Trailing-edge debounce for progress writes, one timer per task row.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Defers a write until `delay` has passed without another input for the
/// same key. Scheduling again cancels the previous timer instead of stacking
/// a second one.
///
/// Cancelling only stops a timer that hasn't fired; a write already in
/// flight runs to completion and is told apart by its sequence number.
pub struct ProgressDebouncer {
    delay: Duration,
    runtime: Handle,
    pending: HashMap<String, CancellationToken>,
    latest_seq: HashMap<String, u64>,
}

impl ProgressDebouncer {
    pub fn new(delay: Duration, runtime: Handle) -> Self {
        Self {
            delay,
            runtime,
            pending: HashMap::new(),
            latest_seq: HashMap::new(),
        }
    }

    /// (Re)start the timer for `key`. When it fires, `write(seq)` is awaited.
    /// Returns the sequence number handed to `write`.
    pub fn schedule<F, Fut>(&mut self, key: &str, write: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.pending.remove(key) {
            previous.cancel();
        }

        let seq = self.latest_seq.entry(key.to_string()).or_insert(0);
        *seq += 1;
        let seq = *seq;

        let token = CancellationToken::new();
        self.pending.insert(key.to_string(), token.clone());

        let delay = self.delay;
        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!("Debounced write #{} superseded", seq);
                }
                _ = tokio::time::sleep(delay) => {
                    write(seq).await;
                }
            }
        });

        seq
    }

    /// Whether `seq` is the most recent write scheduled for `key`.
    pub fn is_latest(&self, key: &str, seq: u64) -> bool {
        self.latest_seq.get(key) == Some(&seq)
    }

    /// Record that write `seq` for `key` finished. Returns false for a
    /// superseded write, whose result should be discarded.
    pub fn complete(&mut self, key: &str, seq: u64) -> bool {
        if !self.is_latest(key, seq) {
            return false;
        }
        self.pending.remove(key);
        true
    }

    /// Drop the pending timer for `key`, if any. Later completions for the
    /// key are treated as stale.
    pub fn cancel(&mut self, key: &str) {
        if let Some(token) = self.pending.remove(key) {
            token.cancel();
        }
        if let Some(seq) = self.latest_seq.get_mut(key) {
            *seq += 1;
        }
    }

    pub fn cancel_all(&mut self) {
        let keys: Vec<String> = self.pending.keys().cloned().collect();
        for key in keys {
            self.cancel(&key);
        }
    }

    /// Rows with a write that is scheduled or still in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl Drop for ProgressDebouncer {
    fn drop(&mut self) {
        for token in self.pending.values() {
            token.cancel();
        }
    }
}
