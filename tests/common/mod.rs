//! Common test utilities: a scripted OpenAI-style SDK

#![allow(dead_code)]

use async_stream::stream;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt;
use std::sync::{Arc, Mutex};
use threadline::{Member, Output, RecordingSink, SdkMethod, SdkObject, TraceParent};

/// Error type the fake SDK fails with, so tests can check identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    pub status: u16,
    pub message: String,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for UpstreamError {}

/// Script shared by every object of one fake SDK instance
#[derive(Default)]
pub struct Script {
    pub requests: Mutex<Vec<Value>>,
    pub fail_with: Mutex<Option<UpstreamError>>,
    /// Yield this many chunks, then an error item
    pub fail_stream_after: Mutex<Option<usize>>,
    /// Sink whose write attempts are counted when a call starts
    pub watched_sink: Mutex<Option<RecordingSink>>,
    pub writes_at_call: Mutex<Vec<usize>>,
}

impl Script {
    pub fn fail_with(&self, status: u16, message: &str) {
        *self.fail_with.lock().unwrap() = Some(UpstreamError {
            status,
            message: message.to_string(),
        });
    }

    pub fn fail_stream_after(&self, chunks: usize) {
        *self.fail_stream_after.lock().unwrap() = Some(chunks);
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn watch_sink(&self, sink: &RecordingSink) {
        *self.watched_sink.lock().unwrap() = Some(sink.clone());
    }

    /// Write attempts the watched sink had seen as each call started
    pub fn writes_at_call(&self) -> Vec<usize> {
        self.writes_at_call.lock().unwrap().clone()
    }

    fn record(&self, request: &Value) -> Result<(), UpstreamError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(sink) = self.watched_sink.lock().unwrap().as_ref() {
            self.writes_at_call.lock().unwrap().push(sink.attempts().len());
        }
        match self.fail_with.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn stream_failure(&self) -> Option<usize> {
        *self.fail_stream_after.lock().unwrap()
    }
}

/// Root `OpenAI` object with `chat.completions.create` and `responses.create`
pub struct FakeOpenAI {
    pub script: Arc<Script>,
}

impl FakeOpenAI {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Script::default()),
        }
    }
}

impl SdkObject for FakeOpenAI {
    fn type_name(&self) -> &str {
        "OpenAI"
    }

    fn member(&self, name: &str) -> Option<Member> {
        let script = Arc::clone(&self.script);
        match name {
            "chat" => Some(Member::Object(Arc::new(Chat { script }))),
            "responses" => Some(Member::Object(Arc::new(Responses { script }))),
            "base_url" => Some(Member::Value(json!("https://api.openai.com/v1"))),
            "max_retries" => Some(Member::Value(json!(2))),
            _ => None,
        }
    }
}

struct Chat {
    script: Arc<Script>,
}

impl SdkObject for Chat {
    fn type_name(&self) -> &str {
        "Chat"
    }

    fn member(&self, name: &str) -> Option<Member> {
        match name {
            "completions" => Some(Member::Object(Arc::new(Completions {
                script: Arc::clone(&self.script),
            }))),
            _ => None,
        }
    }
}

struct Completions {
    script: Arc<Script>,
}

impl SdkObject for Completions {
    fn type_name(&self) -> &str {
        "Completions"
    }

    fn member(&self, name: &str) -> Option<Member> {
        match name {
            "create" => Some(Member::Method(Arc::new(CreateCompletion {
                script: Arc::clone(&self.script),
            }))),
            _ => None,
        }
    }
}

struct Responses {
    script: Arc<Script>,
}

impl SdkObject for Responses {
    fn type_name(&self) -> &str {
        "Responses"
    }

    fn member(&self, name: &str) -> Option<Member> {
        match name {
            "create" => Some(Member::Method(Arc::new(CreateResponse {
                script: Arc::clone(&self.script),
            }))),
            _ => None,
        }
    }
}

/// Answers arithmetic with "4" and streams "Hel" + "lo"
struct CreateCompletion {
    script: Arc<Script>,
}

#[async_trait]
impl SdkMethod for CreateCompletion {
    async fn call(&self, request: Value) -> anyhow::Result<Output> {
        self.script.record(&request)?;

        if request["stream"] == json!(true) {
            let fail_after = self.script.stream_failure();
            return Ok(Output::Stream(Box::pin(stream! {
                for (index, piece) in ["Hel", "lo"].into_iter().enumerate() {
                    if fail_after == Some(index) {
                        yield Err(anyhow::Error::new(UpstreamError {
                            status: 500,
                            message: "stream interrupted".to_string(),
                        }));
                    }
                    yield Ok(json!({
                        "id": "chatcmpl-stream",
                        "object": "chat.completion.chunk",
                        "choices": [{"index": 0, "delta": {"content": piece}}]
                    }));
                }
                yield Ok(json!({
                    "id": "chatcmpl-stream",
                    "object": "chat.completion.chunk",
                    "choices": [],
                    "usage": {"prompt_tokens": 9, "completion_tokens": 2, "total_tokens": 11}
                }));
            })));
        }

        Ok(Output::Response(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": request["model"],
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "4"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 1, "total_tokens": 13}
        })))
    }
}

/// Answers "pong" in the responses convention
struct CreateResponse {
    script: Arc<Script>,
}

#[async_trait]
impl SdkMethod for CreateResponse {
    async fn call(&self, request: Value) -> anyhow::Result<Output> {
        self.script.record(&request)?;

        if request["stream"] == json!(true) {
            return Ok(Output::Stream(Box::pin(stream! {
                for piece in ["po", "ng"] {
                    yield Ok(json!({"type": "response.output_text.delta", "delta": piece}));
                }
                yield Ok(json!({
                    "type": "response.completed",
                    "response": {"usage": {"input_tokens": 3, "output_tokens": 1, "total_tokens": 4}}
                }));
            })));
        }

        Ok(Output::Response(json!({
            "id": "resp_1",
            "object": "response",
            "output_text": "pong",
            "output_text_id": "msg_out_1",
            "usage": {"input_tokens": 3, "output_tokens": 1, "total_tokens": 4}
        })))
    }
}

/// A fresh recording sink plus a parent pointing at it
pub fn recording_parent(project_id: u64) -> (RecordingSink, TraceParent) {
    let sink = RecordingSink::new(project_id);
    let parent = TraceParent::new("test-parent", Arc::new(sink.clone()));
    (sink, parent)
}

pub fn arithmetic_request() -> Value {
    json!({
        "model": "gpt-4o-mini",
        "messages": [
            {"role": "system", "content": "Answer with a single number."},
            {"role": "user", "content": "What is 2+2?"}
        ]
    })
}

pub fn streaming_request() -> Value {
    json!({
        "model": "gpt-4o-mini",
        "stream": true,
        "messages": [{"role": "user", "content": "Say hello"}]
    })
}
