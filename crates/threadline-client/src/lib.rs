//! Trace delivery for Threadline
//!
//! [`ThreadlineClient`] upserts canonical threads into the remote trace
//! store and keeps a registry of in-flight writes so callers can drain them
//! before shutdown. The [`locator`] module holds the process-wide default
//! client.

pub mod client;
pub mod locator;
pub mod memory;
pub mod pending;

pub use client::ThreadlineClient;
pub use locator::{default_sink, reset_default_sink, resolve_sink, set_default_sink};
pub use memory::RecordingSink;
pub use pending::{PendingWrite, PendingWrites};
