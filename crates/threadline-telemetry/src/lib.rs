//! # Threadline Telemetry
//!
//! Logging and OpenTelemetry wiring for traced SDK calls.
//!
//! Every intercepted call runs inside a `traced_call` span carrying GenAI
//! semantic attributes, so the local `tracing` output lines up with the
//! threads sent to the trace store.

mod spans;
mod tracer;

pub use spans::{CallSpanAttributes, call_span, record_error, record_usage};
pub use tracer::{init_telemetry, register_span_processor, tracer_provider};

/// Span attribute names.
///
/// These follow the OpenTelemetry semantic conventions for generative AI,
/// plus a few `threadline.*` attributes for the trace store linkage.
pub mod attributes {
    // Generic AI attributes
    pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";
    pub const GEN_AI_SYSTEM: &str = "gen_ai.system";
    pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";
    pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";
    pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

    // Trace store linkage
    pub const THREADLINE_TRACE_NAME: &str = "threadline.trace_name";
    pub const THREADLINE_THREAD_ID: &str = "threadline.thread_id";
    pub const THREADLINE_STREAMING: &str = "threadline.streaming";
    pub const THREADLINE_ERROR: &str = "threadline.error";

    // Instrumentation scope name
    pub const SYSTEM_NAME: &str = "threadline";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_constants() {
        assert_eq!(attributes::GEN_AI_OPERATION_NAME, "gen_ai.operation.name");
        assert_eq!(attributes::GEN_AI_SYSTEM, "gen_ai.system");
        assert_eq!(attributes::SYSTEM_NAME, "threadline");
    }
}
