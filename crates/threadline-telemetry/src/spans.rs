//! Span helpers for intercepted SDK calls

use crate::attributes::*;
use std::fmt::Display;
use tracing::Span;

/// Attributes for tracing one intercepted call
#[derive(Debug, Clone, Copy)]
pub struct CallSpanAttributes<'a> {
    pub operation: &'a str,
    pub provider: &'a str,
    pub model: &'a str,
    pub trace_name: &'a str,
    pub thread_id: &'a str,
    pub streaming: bool,
}

/// Create the span an intercepted call runs in.
///
/// Usage and error fields start empty and are filled in with
/// [`record_usage`] and [`record_error`] once the call settles.
pub fn call_span(attrs: &CallSpanAttributes<'_>) -> Span {
    tracing::info_span!(
        "traced_call",
        { GEN_AI_OPERATION_NAME } = attrs.operation,
        { GEN_AI_SYSTEM } = %attrs.provider,
        { GEN_AI_REQUEST_MODEL } = %attrs.model,
        { THREADLINE_TRACE_NAME } = %attrs.trace_name,
        { THREADLINE_THREAD_ID } = %attrs.thread_id,
        { THREADLINE_STREAMING } = attrs.streaming,
        { GEN_AI_USAGE_INPUT_TOKENS } = tracing::field::Empty,
        { GEN_AI_USAGE_OUTPUT_TOKENS } = tracing::field::Empty,
        { THREADLINE_ERROR } = tracing::field::Empty,
    )
}

pub fn record_usage(span: &Span, input_tokens: u64, output_tokens: u64) {
    span.record(GEN_AI_USAGE_INPUT_TOKENS, input_tokens);
    span.record(GEN_AI_USAGE_OUTPUT_TOKENS, output_tokens);
}

pub fn record_error(span: &Span, error: &dyn Display) {
    span.record(THREADLINE_ERROR, tracing::field::display(error));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_span_accepts_late_fields() {
        let attrs = CallSpanAttributes {
            operation: "chat",
            provider: "openai",
            model: "gpt-4o",
            trace_name: "OpenAI.chat",
            thread_id: "thread-1",
            streaming: false,
        };

        let span = call_span(&attrs);
        record_usage(&span, 12, 3);
        record_error(&span, &"upstream timed out");
        let _guard = span.enter();
    }
}
