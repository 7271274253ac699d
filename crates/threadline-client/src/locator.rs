//! Process-wide default trace sink
//!
//! The default sink is built lazily from the environment the first time a
//! traced call needs it. Per-call overrides come through a [`TraceParent`].

use crate::client::ThreadlineClient;
use std::sync::{Arc, Mutex, PoisonError};
use threadline_core::{Result, ThreadlineConfig, TraceParent, TraceSink};

static DEFAULT_SINK: Mutex<Option<Arc<dyn TraceSink>>> = Mutex::new(None);

/// The default sink, constructing it from the environment on first use.
///
/// Fails with a configuration error when `THREADLINE_API_KEY` or
/// `THREADLINE_PROJECT_ID` is missing; nothing is cached in that case.
pub fn default_sink() -> Result<Arc<dyn TraceSink>> {
    let mut slot = DEFAULT_SINK.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(sink) = slot.as_ref() {
        return Ok(Arc::clone(sink));
    }

    let client = ThreadlineClient::from_config(&ThreadlineConfig::from_env())?;
    tracing::debug!(base_url = %client.base_url(), "Created default trace client");

    let sink: Arc<dyn TraceSink> = Arc::new(client);
    *slot = Some(Arc::clone(&sink));
    Ok(sink)
}

/// Install a specific sink as the process-wide default.
pub fn set_default_sink(sink: Arc<dyn TraceSink>) {
    *DEFAULT_SINK.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
}

/// Discard the cached default; the next access rebuilds it.
pub fn reset_default_sink() {
    DEFAULT_SINK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
}

/// The parent's sink when one is given, else the default.
pub fn resolve_sink(parent: Option<&TraceParent>) -> Result<Arc<dyn TraceSink>> {
    match parent {
        Some(parent) => Ok(Arc::clone(&parent.client)),
        None => default_sink(),
    }
}
