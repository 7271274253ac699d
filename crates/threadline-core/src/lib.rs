//! Core types for Threadline
//!
//! This crate holds the canonical thread/message model, the pure transform
//! layer that maps OpenAI-style payloads onto it, and the `TraceSink`
//! abstraction the delivery layer implements.

pub mod config;
pub mod error;
pub mod ids;
pub mod shapes;
pub mod sink;
pub mod thread;
pub mod transform;

// Re-exports
pub use config::ThreadlineConfig;
pub use error::{Error, Result};
pub use shapes::{
    ApiContext, ChunkShape, OutputText, RequestShape, ResponseShape, StreamAccumulator, Usage,
};
pub use sink::{TraceParent, TraceSink};
pub use thread::{
    ExternalUser, Message, MessageType, Metadata, MetadataValue, Thread, ThreadResponse,
};
