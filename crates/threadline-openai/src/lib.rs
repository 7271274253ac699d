//! OpenAI-style SDK instrumentation for Threadline
//!
//! [`observe_openai`] wraps an SDK object tree so that every method call is
//! recorded as a conversation thread, while callers keep receiving exactly
//! what the SDK produced.
//!
//! ```rust,ignore
//! use threadline_openai::{observe_openai, ObserveConfig, SdkObjectExt};
//!
//! let client = observe_openai(sdk, Some(ObserveConfig::new().with_user_id("user-1")));
//! let reply = client
//!     .call("chat.completions.create", json!({"model": "gpt-4o", "messages": messages}))
//!     .await?;
//! client.flush().await?;
//! ```

pub mod context;
pub mod interceptor;
pub mod proxy;
pub mod sdk;
mod stream;
mod trace;

pub use context::ObserveConfig;
pub use interceptor::TracedMethod;
pub use proxy::{FLUSH_MEMBER, ObservedObject, SHUTDOWN_MEMBER};
pub use sdk::{ChunkStream, Member, Output, SdkMethod, SdkObject, SdkObjectExt};

use std::sync::Arc;

/// Instrument an SDK object.
///
/// Wrapping is lazy and performs no I/O. Calls made through the returned
/// object write to `config.parent`'s sink when one is given, else to the
/// process-wide default sink.
pub fn observe_openai(sdk: Arc<dyn SdkObject>, config: Option<ObserveConfig>) -> ObservedObject {
    ObservedObject::new(sdk, config.unwrap_or_default())
}
