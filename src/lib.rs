//! # Threadline
//!
//! Transparent conversation tracing for OpenAI-style client SDKs.
//!
//! Wrap an SDK object with [`observe_openai`]; every method call made
//! through the wrapper is recorded as a thread in the trace store, and every
//! streaming call is observed chunk by chunk without changing what the
//! caller receives.
//!
//! The pieces live in separate crates:
//! - `threadline-core`: canonical thread model, transforms, configuration
//! - `threadline-client`: HTTP trace sink, pending writes, default sink
//! - `threadline-telemetry`: `tracing` and OpenTelemetry wiring
//! - `threadline-openai`: the SDK proxy, call interceptor and stream observer

pub use threadline_client::{
    RecordingSink, ThreadlineClient, default_sink, reset_default_sink, set_default_sink,
};
pub use threadline_core::{
    Error, ExternalUser, Message, MessageType, Metadata, MetadataValue, Result, Thread,
    ThreadlineConfig, TraceParent, TraceSink,
};
pub use threadline_openai::{
    ChunkStream, Member, ObserveConfig, ObservedObject, Output, SdkMethod, SdkObject,
    SdkObjectExt, observe_openai,
};
pub use threadline_telemetry::init_telemetry;
