//! Pass-through observation of streaming results

use crate::sdk::ChunkStream;
use crate::trace::CallTrace;
use async_stream::stream;
use futures::StreamExt;
use std::sync::Arc;
use threadline_core::{StreamAccumulator, transform};

/// Wrap a live chunk stream so every item reaches the consumer unchanged
/// while deltas and usage are accumulated on the side.
///
/// When the inner stream ends without error the completed thread is
/// scheduled. The first error item schedules an error thread instead and
/// suppresses the completed one; items after it are still forwarded. A
/// consumer that stops early triggers neither write.
pub(crate) fn observe_stream(mut inner: ChunkStream, trace: Arc<CallTrace>) -> ChunkStream {
    Box::pin(stream! {
        let mut accumulator = StreamAccumulator::default();
        let mut failed = false;

        while let Some(item) = inner.next().await {
            match &item {
                Ok(chunk) => accumulator.observe(chunk),
                Err(err) if !failed => {
                    failed = true;
                    tracing::warn!(parent: trace.span(), error = %err, "Stream failed mid-flight");
                    trace.spawn_write(trace.error_thread(&format!("{err:#}")), "stream_error");
                }
                Err(_) => {}
            }
            yield item;
        }

        if !failed {
            if trace.debug() {
                tracing::info!(
                    parent: trace.span(),
                    chunks = accumulator.chunks(),
                    content_len = accumulator.content().len(),
                    "Stream drained"
                );
            }
            let messages = transform::streamed_to_canonical(accumulator.content(), trace.prompt());
            trace.spawn_write(trace.completed_thread(messages, accumulator.usage()), "stream_final");
        }
    })
}
