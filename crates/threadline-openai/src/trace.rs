//! State shared by the writes of one intercepted call

use crate::context::ObserveConfig;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use threadline_client::resolve_sink;
use threadline_core::shapes::{extract_model_name, extract_provider};
use threadline_core::thread::metadata_from_json;
use threadline_core::{
    ApiContext, ExternalUser, Message, Metadata, RequestShape, Result, Thread, ThreadResponse,
    TraceSink, Usage, ids, transform,
};
use threadline_telemetry::{CallSpanAttributes, call_span, record_error, record_usage};
use tracing::{Instrument, Span};

/// Everything needed to write the initial, final, or error version of one
/// call's thread. Every version shares the same `external_id`.
pub(crate) struct CallTrace {
    sink: Arc<dyn TraceSink>,
    thread_id: String,
    project_id: u64,
    metadata: Metadata,
    prompt: Vec<Message>,
    external_user: Option<ExternalUser>,
    span: Span,
    debug: bool,
}

impl CallTrace {
    /// Resolve the sink and canonicalize the request.
    ///
    /// Fails only when no sink can be resolved.
    pub(crate) fn prepare(context: &ObserveConfig, request: &Value, streaming: bool) -> Result<Self> {
        let sink = resolve_sink(context.parent.as_ref())?;
        let thread_id = context
            .session_id
            .clone()
            .unwrap_or_else(ids::thread_id);

        let model = extract_model_name(request);
        let provider = extract_provider(request);
        let trace_name = context.trace_name.as_deref().unwrap_or_default();

        let mut metadata = metadata_from_json(&context.metadata);
        metadata.insert("model".to_string(), model.as_str().into());
        metadata.insert("provider".to_string(), provider.into());
        if !trace_name.is_empty() {
            metadata.insert("traceName".to_string(), trace_name.into());
        }
        if !context.tags.is_empty() {
            metadata.insert("tags".to_string(), context.tags.join(",").into());
        }

        let api_context = context.api_context();
        let prompt = transform::prompt_messages(&RequestShape::classify(request, api_context));

        let span = call_span(&CallSpanAttributes {
            operation: match api_context {
                ApiContext::Chat => "chat",
                ApiContext::Responses => "responses",
            },
            provider,
            model: &model,
            trace_name,
            thread_id: &thread_id,
            streaming,
        });

        let debug = context.is_debug_enabled();
        if debug {
            tracing::info!(
                parent: &span,
                thread_id = %thread_id,
                prompt_messages = prompt.len(),
                streaming,
                "Prepared traced call"
            );
        }

        Ok(Self {
            project_id: context.project_id.unwrap_or_else(|| sink.project_id()),
            sink,
            thread_id,
            metadata,
            prompt,
            external_user: context.user_id.clone().map(ExternalUser::new),
            span,
            debug,
        })
    }

    pub(crate) fn prompt(&self) -> &[Message] {
        &self.prompt
    }

    pub(crate) fn span(&self) -> &Span {
        &self.span
    }

    pub(crate) fn debug(&self) -> bool {
        self.debug
    }

    fn thread(&self, messages: Vec<Message>, metadata: Metadata) -> Thread {
        Thread {
            external_id: self.thread_id.clone(),
            project_id: self.project_id,
            messages,
            metadata,
            external_user: self.external_user.clone(),
            created_at: None,
        }
    }

    /// Prompt only, before the underlying call runs
    pub(crate) fn initial_thread(&self) -> Thread {
        self.thread(self.prompt.clone(), self.metadata.clone())
    }

    /// Full conversation with token counts folded into metadata
    pub(crate) fn completed_thread(&self, messages: Vec<Message>, usage: Usage) -> Thread {
        record_usage(&self.span, usage.prompt_tokens, usage.completion_tokens);

        let mut metadata = self.metadata.clone();
        usage.fold_into(&mut metadata);
        self.thread(messages, metadata)
    }

    /// Prompt plus the stringified failure
    pub(crate) fn error_thread(&self, error: &str) -> Thread {
        record_error(&self.span, &error);

        let mut metadata = self.metadata.clone();
        metadata.insert("error".to_string(), error.into());
        self.thread(self.prompt.clone(), metadata)
    }

    /// Issue a write whose outcome the caller awaits.
    pub(crate) fn write(&self, thread: Thread) -> BoxFuture<'static, Result<ThreadResponse>> {
        self.sink.create_or_update_thread(thread)
    }

    /// Issue a write and let it settle in the background.
    ///
    /// The write is registered with the sink before this returns, so a
    /// `flush` issued afterwards waits for it. Failures are logged only.
    pub(crate) fn spawn_write(&self, thread: Thread, stage: &'static str) {
        let write = self.sink.create_or_update_thread(thread);
        let thread_id = self.thread_id.clone();
        let debug = self.debug;

        tokio::spawn(
            async move {
                match write.await {
                    Ok(response) if debug => {
                        tracing::info!(thread_id = %thread_id, stage, id = ?response.id, "Trace write settled");
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::error!(thread_id = %thread_id, stage, error = %err, "Trace write failed");
                    }
                }
            }
            .instrument(self.span.clone()),
        );
    }
}
