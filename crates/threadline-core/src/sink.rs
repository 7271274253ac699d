//! Trace sink abstraction

use crate::{Result, Thread, ThreadResponse};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Delivery target for canonical threads.
///
/// Methods return boxed futures rather than being `async`: an implementation
/// must register a write as pending when `create_or_update_thread` is
/// called, and `flush` must snapshot the pending set when it is called, not
/// when the returned future is first polled.
pub trait TraceSink: Send + Sync {
    /// Project that threads written through this sink belong to
    fn project_id(&self) -> u64;

    /// Idempotent upsert keyed by `(external_id, project_id)`.
    fn create_or_update_thread(&self, thread: Thread) -> BoxFuture<'static, Result<ThreadResponse>>;

    /// Resolves once every write pending at call time has settled.
    fn flush(&self) -> BoxFuture<'static, ()>;

    /// Flush, then release held resources.
    fn shutdown(&self) -> BoxFuture<'static, ()>;
}

/// An existing trace whose sink should receive writes instead of the
/// process-wide default
#[derive(Clone)]
pub struct TraceParent {
    pub id: String,
    pub client: Arc<dyn TraceSink>,
}

impl TraceParent {
    pub fn new(id: impl Into<String>, client: Arc<dyn TraceSink>) -> Self {
        Self {
            id: id.into(),
            client,
        }
    }
}

impl fmt::Debug for TraceParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceParent")
            .field("id", &self.id)
            .field("project_id", &self.client.project_id())
            .finish()
    }
}
