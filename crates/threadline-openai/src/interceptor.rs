//! Tracing wrapper around a single SDK method

use crate::context::ObserveConfig;
use crate::sdk::{Output, SdkMethod};
use crate::stream::observe_stream;
use crate::trace::CallTrace;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use threadline_core::shapes::is_streaming_request;
use threadline_core::{Usage, transform};
use tracing::Instrument;

/// An SDK method whose calls are written to the trace sink.
///
/// The caller always gets back exactly what the wrapped method produced.
pub struct TracedMethod {
    inner: Arc<dyn SdkMethod>,
    context: ObserveConfig,
}

impl TracedMethod {
    pub fn new(inner: Arc<dyn SdkMethod>, context: ObserveConfig) -> Self {
        Self { inner, context }
    }

    pub fn context(&self) -> &ObserveConfig {
        &self.context
    }

    async fn call_streaming(&self, request: Value) -> anyhow::Result<Output> {
        let trace = Arc::new(self.prepare(&request, true)?);
        trace.spawn_write(trace.initial_thread(), "initial");

        let span = trace.span().clone();
        match self.inner.call(request).instrument(span).await {
            Ok(Output::Stream(stream)) => Ok(Output::Stream(observe_stream(stream, trace))),
            Ok(Output::Response(response)) => {
                // Upstream ignored `stream: true`
                let messages = transform::response_to_canonical(&response, trace.prompt());
                let usage = Usage::from_response(&response);
                trace.spawn_write(trace.completed_thread(messages, usage), "final");
                Ok(Output::Response(response))
            }
            Err(err) => {
                trace.spawn_write(trace.error_thread(&format!("{err:#}")), "error");
                Err(err)
            }
        }
    }

    async fn call_blocking(&self, request: Value) -> anyhow::Result<Output> {
        let trace = Arc::new(self.prepare(&request, false)?);
        let span = trace.span().clone();

        let result = self
            .run_blocking(&trace, request)
            .instrument(span.clone())
            .await;

        if let Err(err) = &result {
            let error_thread = trace.error_thread(&format!("{err:#}"));
            if let Err(write_err) = trace.write(error_thread).instrument(span).await {
                tracing::error!(error = %write_err, "Failed to record call error");
            }
        }

        result
    }

    async fn run_blocking(&self, trace: &Arc<CallTrace>, request: Value) -> anyhow::Result<Output> {
        trace.write(trace.initial_thread()).await?;

        match self.inner.call(request).await? {
            Output::Response(response) => {
                let messages = transform::response_to_canonical(&response, trace.prompt());
                let usage = Usage::from_response(&response);
                trace.write(trace.completed_thread(messages, usage)).await?;
                Ok(Output::Response(response))
            }
            Output::Stream(stream) => Ok(Output::Stream(observe_stream(stream, Arc::clone(trace)))),
        }
    }

    fn prepare(&self, request: &Value, streaming: bool) -> anyhow::Result<CallTrace> {
        CallTrace::prepare(&self.context, request, streaming).map_err(|err| {
            tracing::error!(error = %err, "Trace sink unavailable");
            anyhow::Error::new(err)
        })
    }
}

#[async_trait]
impl SdkMethod for TracedMethod {
    async fn call(&self, request: Value) -> anyhow::Result<Output> {
        if is_streaming_request(&request) {
            self.call_streaming(request).await
        } else {
            self.call_blocking(request).await
        }
    }
}
