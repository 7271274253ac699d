//! Per-wrapper and per-call tracing configuration

use serde_json::{Map, Value};
use threadline_core::config::debug_env_enabled;
use threadline_core::{ApiContext, TraceParent};

/// Options for [`observe_openai`](crate::observe_openai).
///
/// The same value doubles as the call context: the proxy derives one per
/// member access, with the trace name and API convention filled in.
#[derive(Debug, Clone, Default)]
pub struct ObserveConfig {
    /// Overrides the default `<type>.<member>` trace name
    pub trace_name: Option<String>,
    /// Used as the thread id, so calls in one session share a thread
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    /// Caller metadata; only string and number values are kept
    pub metadata: Map<String, Value>,
    pub tags: Vec<String>,
    /// Write into this trace's sink instead of the process-wide default
    pub parent: Option<TraceParent>,
    pub api_context: Option<ApiContext>,
    /// Overrides the sink's project id on written threads
    pub project_id: Option<u64>,
    /// Log each traced call, write and drained stream at `info` level, so
    /// the default filter shows them. `THREADLINE_DEBUG_LOG=1` has the same
    /// effect. Nothing is printed unless a subscriber is installed, e.g. via
    /// `init_telemetry`.
    pub debug: bool,
}

impl ObserveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace_name(mut self, trace_name: impl Into<String>) -> Self {
        self.trace_name = Some(trace_name.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parent(mut self, parent: TraceParent) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_project_id(mut self, project_id: u64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Context for a member accessed on an object of type `type_name`.
    ///
    /// The first derived trace name sticks, so nested members keep the name
    /// of the top-level member they were reached through.
    pub fn for_member(&self, type_name: &str, member: &str) -> Self {
        let mut context = self.clone();
        if context.trace_name.is_none() {
            context.trace_name = Some(format!("{}.{}", type_name, member));
        }
        if let Some(api_context) = ApiContext::for_member(member) {
            context.api_context = Some(api_context);
        }
        context
    }

    pub fn api_context(&self) -> ApiContext {
        self.api_context.unwrap_or_default()
    }

    /// Whether per-call diagnostics are logged, from the flag or the environment
    pub fn is_debug_enabled(&self) -> bool {
        self.debug || debug_env_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_member_derives_trace_name_once() {
        let root = ObserveConfig::new();
        let chat = root.for_member("OpenAI", "chat");
        assert_eq!(chat.trace_name.as_deref(), Some("OpenAI.chat"));

        let completions = chat.for_member("Chat", "completions");
        assert_eq!(completions.trace_name.as_deref(), Some("OpenAI.chat"));
        assert_eq!(completions.api_context(), ApiContext::Chat);
    }

    #[test]
    fn test_explicit_trace_name_wins() {
        let config = ObserveConfig::new().with_trace_name("support-bot");
        let derived = config.for_member("OpenAI", "chat");
        assert_eq!(derived.trace_name.as_deref(), Some("support-bot"));
    }

    #[test]
    fn test_responses_member_switches_convention() {
        let responses = ObserveConfig::new().for_member("OpenAI", "responses");
        assert_eq!(responses.api_context(), ApiContext::Responses);

        let create = responses.for_member("Responses", "create");
        assert_eq!(create.api_context(), ApiContext::Responses);
    }

    #[test]
    fn test_builder_methods() {
        let config = ObserveConfig::new()
            .with_session_id("session-1")
            .with_user_id("user-1")
            .with_metadata("team", "search")
            .with_metadata("attempt", 2)
            .with_tags(["beta", "eu"])
            .with_project_id(5)
            .with_debug(true);

        assert_eq!(config.session_id.as_deref(), Some("session-1"));
        assert_eq!(config.user_id.as_deref(), Some("user-1"));
        assert_eq!(config.metadata.len(), 2);
        assert_eq!(config.tags, vec!["beta", "eu"]);
        assert_eq!(config.project_id, Some(5));
        assert!(config.is_debug_enabled());
    }
}
