//! Registry of in-flight trace writes

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, join_all};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Tracks writes that have started but not yet settled.
///
/// Each write holds a [`PendingWrite`] guard; the entry disappears when the
/// guard drops, whether the write succeeded, failed, or was abandoned.
#[derive(Clone, Default)]
pub struct PendingWrites {
    entries: Arc<DashMap<u64, watch::Receiver<()>>>,
    next_id: Arc<AtomicU64>,
}

/// Guard for one in-flight write
pub struct PendingWrite {
    id: u64,
    entries: Arc<DashMap<u64, watch::Receiver<()>>>,
    // Dropping the sender wakes every drain waiting on this entry
    _settled: watch::Sender<()>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a write that is starting now.
    pub fn register(&self) -> PendingWrite {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (settled, waiter) = watch::channel(());
        self.entries.insert(id, waiter);

        PendingWrite {
            id,
            entries: Arc::clone(&self.entries),
            _settled: settled,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wait for every write registered before this call to settle.
    ///
    /// Writes registered after the snapshot are not waited for.
    pub fn drain(&self) -> BoxFuture<'static, ()> {
        let waiters: Vec<watch::Receiver<()>> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        async move {
            join_all(waiters.into_iter().map(|mut waiter| async move {
                // Only ever resolves with an error, once the guard is gone
                let _ = waiter.changed().await;
            }))
            .await;
        }
        .boxed()
    }
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        self.entries.remove(&self.id);
    }
}
