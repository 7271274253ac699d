//! Identifier synthesis for threads and messages
//!
//! Ids combine the wall-clock millisecond with a process-local counter, so two
//! ids minted in the same millisecond still differ.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

static THREAD_COUNTER: AtomicU64 = AtomicU64::new(0);
static MESSAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// New thread id of the form `thread-<millis>-<n>`
pub fn thread_id() -> String {
    let n = THREAD_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("thread-{}-{}", Utc::now().timestamp_millis(), n)
}

/// New message id of the form `msg-<millis>-<n>`
pub fn message_id() -> String {
    let n = MESSAGE_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("msg-{}-{}", Utc::now().timestamp_millis(), n)
}
