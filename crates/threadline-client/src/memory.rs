//! In-memory trace sink
//!
//! Behaves like the remote store (last write wins per `(external_id,
//! project_id)`, stable numeric ids) without any network. Useful for tests
//! and local demos.

use crate::pending::PendingWrites;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use threadline_core::{Error, Result, Thread, ThreadResponse, TraceSink};

/// Trace sink that keeps every thread in memory
#[derive(Clone)]
pub struct RecordingSink {
    inner: Arc<Inner>,
}

struct Inner {
    project_id: u64,
    threads: DashMap<(String, u64), (u64, Thread)>,
    attempts: Mutex<Vec<Thread>>,
    next_id: AtomicU64,
    failing: AtomicBool,
    delay: Option<Duration>,
    pending: PendingWrites,
}

impl RecordingSink {
    pub fn new(project_id: u64) -> Self {
        Self::build(project_id, None)
    }

    /// Each write takes `delay` to settle.
    pub fn with_delay(project_id: u64, delay: Duration) -> Self {
        Self::build(project_id, Some(delay))
    }

    fn build(project_id: u64, delay: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                project_id,
                threads: DashMap::new(),
                attempts: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                failing: AtomicBool::new(false),
                delay,
                pending: PendingWrites::new(),
            }),
        }
    }

    /// Make subsequent writes fail with a delivery error.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Latest stored version of a thread in this sink's project
    pub fn thread(&self, external_id: &str) -> Option<Thread> {
        self.inner
            .threads
            .get(&(external_id.to_string(), self.inner.project_id))
            .map(|entry| entry.value().1.clone())
    }

    /// Number of distinct stored threads
    pub fn thread_count(&self) -> usize {
        self.inner.threads.len()
    }

    /// Every write attempt, in the order the writes were issued
    pub fn attempts(&self) -> Vec<Thread> {
        self.inner
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Write attempts for one thread, in issue order
    pub fn attempts_for(&self, external_id: &str) -> Vec<Thread> {
        self.attempts()
            .into_iter()
            .filter(|thread| thread.external_id == external_id)
            .collect()
    }

    pub fn pending_writes(&self) -> usize {
        self.inner.pending.len()
    }
}

impl Inner {
    fn store(&self, thread: Thread) -> Result<ThreadResponse> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::delivery("recording sink is set to fail"));
        }

        let key = (thread.external_id.clone(), thread.project_id);
        let mut entry = self
            .threads
            .entry(key)
            .or_insert_with(|| (self.next_id.fetch_add(1, Ordering::SeqCst), thread.clone()));
        entry.1 = thread;
        Ok(ThreadResponse { id: Some(entry.0) })
    }
}

impl TraceSink for RecordingSink {
    fn project_id(&self) -> u64 {
        self.inner.project_id
    }

    fn create_or_update_thread(&self, thread: Thread) -> BoxFuture<'static, Result<ThreadResponse>> {
        let guard = self.inner.pending.register();
        self.inner
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(thread.clone());

        let inner = Arc::clone(&self.inner);
        async move {
            let _guard = guard;
            if let Some(delay) = inner.delay {
                tokio::time::sleep(delay).await;
            }
            inner.store(thread)
        }
        .boxed()
    }

    fn flush(&self) -> BoxFuture<'static, ()> {
        self.inner.pending.drain()
    }

    fn shutdown(&self) -> BoxFuture<'static, ()> {
        self.inner.pending.drain()
    }
}
