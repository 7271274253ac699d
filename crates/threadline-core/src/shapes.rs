//! Classification of OpenAI-style payloads
//!
//! Requests, responses, and stream chunks arrive as untyped JSON. Each is
//! classified once into one of the shapes below; the transform layer only
//! ever looks at these.

use crate::thread::Metadata;
use serde::Deserialize;
use serde_json::Value;

/// Which upstream calling convention a call uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiContext {
    /// `chat.completions`-style: `messages` in, `choices` out
    #[default]
    Chat,
    /// `responses`-style: `input` in, `output_text` out
    Responses,
}

impl ApiContext {
    /// Member name that switches nested calls to the responses convention
    pub const RESPONSES_MEMBER: &'static str = "responses";

    pub fn for_member(name: &str) -> Option<Self> {
        (name == Self::RESPONSES_MEMBER).then_some(ApiContext::Responses)
    }
}

/// True when the request asks for a streamed result.
pub fn is_streaming_request(request: &Value) -> bool {
    matches!(request.get("stream"), Some(Value::Bool(true)))
}

/// Model name from the request, `unknown` when absent.
pub fn extract_model_name(request: &Value) -> String {
    request
        .get("model")
        .and_then(Value::as_str)
        .filter(|model| !model.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// `azure` when the request carries an Azure endpoint, else `openai`.
pub fn extract_provider(request: &Value) -> &'static str {
    if request.get("azure_endpoint").is_some() {
        "azure"
    } else {
        "openai"
    }
}

/// Prompt side of a call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestShape<'a> {
    Chat(&'a [Value]),
    ResponsesInput(&'a Value),
    Unrecognized,
}

impl<'a> RequestShape<'a> {
    pub fn classify(request: &'a Value, api_context: ApiContext) -> Self {
        if api_context == ApiContext::Responses {
            if let Some(input) = request.get("input").filter(|input| is_truthy(input)) {
                return RequestShape::ResponsesInput(input);
            }
        }

        match request.get("messages") {
            Some(Value::Array(messages)) => RequestShape::Chat(messages),
            _ => RequestShape::Unrecognized,
        }
    }
}

/// A chat message as found in requests and `choices[].message`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub tool_calls: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default, rename = "externalId")]
    pub external_id: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
}

impl ChatMessage {
    /// Parse leniently; non-object values become an empty message.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_ref().and_then(Value::as_str).filter(|r| !r.is_empty())
    }

    /// Caller-supplied id, only when it is a string.
    pub fn provided_id(&self) -> Option<&str> {
        self.external_id
            .as_ref()
            .filter(|id| is_truthy(id))
            .or(self.id.as_ref())
            .and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str).filter(|n| !n.is_empty())
    }

    pub fn tool_calls(&self) -> Option<&Value> {
        self.tool_calls.as_ref().filter(|calls| is_truthy(calls))
    }
}

/// Result side of a non-streaming call
///
/// Chat choices and a flattened `output_text` are read independently; a
/// result may carry both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseShape<'a> {
    /// `choices[].message` entries (choices without a message are skipped)
    pub choices: Vec<&'a Value>,
    pub output_text: Option<OutputText<'a>>,
}

/// Flattened `output_text` of a responses-style result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputText<'a> {
    pub id: Option<&'a str>,
    pub text: &'a str,
}

impl<'a> ResponseShape<'a> {
    pub fn classify(response: &'a Value) -> Self {
        let choices = match response.get("choices") {
            Some(Value::Array(choices)) => choices
                .iter()
                .filter_map(|choice| choice.get("message"))
                .filter(|message| is_truthy(message))
                .collect(),
            _ => Vec::new(),
        };

        let output_text = response
            .get("output_text")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(|text| OutputText {
                id: response.get("output_text_id").and_then(Value::as_str),
                text,
            });

        Self {
            choices,
            output_text,
        }
    }

    /// Nothing the transform layer can turn into messages
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty() && self.output_text.is_none()
    }
}

/// Token usage, with absent counts read as zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Deserialize)]
struct RawUsage {
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
    #[serde(default)]
    input_tokens: Option<u64>,
    #[serde(default)]
    output_tokens: Option<u64>,
    #[serde(default)]
    total_tokens: Option<u64>,
}

impl Usage {
    /// Parse a `usage` block. Returns `None` unless it is an object.
    pub fn from_block(block: &Value) -> Option<Self> {
        if !block.is_object() {
            return None;
        }
        let raw: RawUsage = serde_json::from_value(block.clone()).ok()?;
        Some(Self {
            prompt_tokens: raw.prompt_tokens.or(raw.input_tokens).unwrap_or(0),
            completion_tokens: raw.completion_tokens.or(raw.output_tokens).unwrap_or(0),
            total_tokens: raw.total_tokens.unwrap_or(0),
        })
    }

    /// Usage of a complete result, zero when the result has none.
    pub fn from_response(response: &Value) -> Self {
        response
            .get("usage")
            .and_then(Self::from_block)
            .unwrap_or_default()
    }

    /// Write the three token counters into thread metadata.
    pub fn fold_into(&self, metadata: &mut Metadata) {
        metadata.insert("prompt_tokens".to_string(), self.prompt_tokens.into());
        metadata.insert("completion_tokens".to_string(), self.completion_tokens.into());
        metadata.insert("total_tokens".to_string(), self.total_tokens.into());
    }
}

/// What a single stream chunk contributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkShape<'a> {
    pub delta: Option<&'a str>,
    pub usage: Option<Usage>,
}

impl<'a> ChunkShape<'a> {
    pub fn classify(chunk: &'a Value) -> Self {
        let chat_delta = chunk
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str);
        let flat_delta = chunk.get("output_text_delta").and_then(Value::as_str);
        let event_delta = match chunk.get("type").and_then(Value::as_str) {
            Some("response.output_text.delta") => chunk.get("delta").and_then(Value::as_str),
            _ => None,
        };

        let usage = chunk
            .get("usage")
            .and_then(Usage::from_block)
            .or_else(|| match chunk.get("type").and_then(Value::as_str) {
                Some("response.completed") => {
                    chunk.pointer("/response/usage").and_then(Usage::from_block)
                }
                _ => None,
            });

        Self {
            delta: chat_delta.or(flat_delta).or(event_delta),
            usage,
        }
    }
}

/// Running state of an observed stream
#[derive(Debug, Clone, Default)]
pub struct StreamAccumulator {
    content: String,
    usage: Option<Usage>,
    chunks: usize,
}

impl StreamAccumulator {
    pub fn observe(&mut self, chunk: &Value) {
        let shape = ChunkShape::classify(chunk);
        if let Some(delta) = shape.delta {
            self.content.push_str(delta);
        }
        if let Some(usage) = shape.usage {
            self.usage = Some(usage);
        }
        self.chunks += 1;
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Last usage block seen, zero when the stream carried none.
    pub fn usage(&self) -> Usage {
        self.usage.unwrap_or_default()
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }
}

/// Loose JSON truthiness: null, false, empty strings and zero are "absent".
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_streaming_flag_must_be_true() {
        assert!(is_streaming_request(&json!({"stream": true})));
        assert!(!is_streaming_request(&json!({"stream": "true"})));
        assert!(!is_streaming_request(&json!({"stream": false})));
        assert!(!is_streaming_request(&json!({})));
    }

    #[test]
    fn test_model_and_provider() {
        assert_eq!(extract_model_name(&json!({"model": "gpt-4o"})), "gpt-4o");
        assert_eq!(extract_model_name(&json!({})), "unknown");
        assert_eq!(extract_provider(&json!({})), "openai");
        assert_eq!(
            extract_provider(&json!({"azure_endpoint": "https://x.openai.azure.com"})),
            "azure"
        );
    }

    #[test]
    fn test_request_classification() {
        let chat = json!({"messages": [{"role": "user", "content": "hi"}], "input": "x"});
        assert!(matches!(
            RequestShape::classify(&chat, ApiContext::Chat),
            RequestShape::Chat(m) if m.len() == 1
        ));

        let responses = json!({"input": "ping"});
        assert_eq!(
            RequestShape::classify(&responses, ApiContext::Responses),
            RequestShape::ResponsesInput(&json!("ping"))
        );
        assert_eq!(
            RequestShape::classify(&responses, ApiContext::Chat),
            RequestShape::Unrecognized
        );

        // Responses context falls back to messages when input is empty
        let fallback = json!({"input": "", "messages": []});
        assert!(matches!(
            RequestShape::classify(&fallback, ApiContext::Responses),
            RequestShape::Chat(_)
        ));
    }

    #[test]
    fn test_response_classification() {
        let completion = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "4"}},
                {"finish_reason": "length"}
            ]
        });
        let shape = ResponseShape::classify(&completion);
        assert_eq!(shape.choices.len(), 1);
        assert!(shape.output_text.is_none());

        let responses = json!({"output_text": "pong", "output_text_id": "out-1"});
        assert_eq!(
            ResponseShape::classify(&responses).output_text,
            Some(OutputText {
                id: Some("out-1"),
                text: "pong"
            })
        );

        let both = json!({"choices": [], "output_text": "pong"});
        let shape = ResponseShape::classify(&both);
        assert!(shape.choices.is_empty());
        assert_eq!(shape.output_text.map(|out| out.text), Some("pong"));

        assert!(ResponseShape::classify(&json!({"data": []})).is_empty());
    }

    #[test]
    fn test_usage_parsing() {
        let usage = Usage::from_response(&json!({
            "usage": {"prompt_tokens": 5, "completion_tokens": 1, "total_tokens": 6}
        }));
        assert_eq!(
            usage,
            Usage {
                prompt_tokens: 5,
                completion_tokens: 1,
                total_tokens: 6
            }
        );

        let responses = Usage::from_block(&json!({"input_tokens": 3, "output_tokens": 2}));
        assert_eq!(responses.map(|u| u.prompt_tokens), Some(3));
        assert_eq!(responses.map(|u| u.completion_tokens), Some(2));

        assert_eq!(Usage::from_response(&json!({})), Usage::default());
        assert_eq!(Usage::from_block(&Value::Null), None);
    }

    #[test]
    fn test_usage_fold_into_metadata() {
        let mut metadata = Metadata::new();
        Usage {
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 3,
        }
        .fold_into(&mut metadata);
        assert_eq!(metadata["prompt_tokens"].as_u64(), Some(1));
        assert_eq!(metadata["completion_tokens"].as_u64(), Some(2));
        assert_eq!(metadata["total_tokens"].as_u64(), Some(3));
    }

    #[test]
    fn test_chunk_shapes() {
        let chat = json!({"choices": [{"delta": {"content": "Hel"}}]});
        assert_eq!(ChunkShape::classify(&chat).delta, Some("Hel"));

        let flat = json!({"output_text_delta": "lo"});
        assert_eq!(ChunkShape::classify(&flat).delta, Some("lo"));

        let event = json!({"type": "response.output_text.delta", "delta": "!"});
        assert_eq!(ChunkShape::classify(&event).delta, Some("!"));

        let usage_only = json!({"choices": [], "usage": {"total_tokens": 9}});
        let shape = ChunkShape::classify(&usage_only);
        assert_eq!(shape.delta, None);
        assert_eq!(shape.usage.map(|u| u.total_tokens), Some(9));
    }

    #[test]
    fn test_accumulator_keeps_last_usage() {
        let mut acc = StreamAccumulator::default();
        acc.observe(&json!({"choices": [{"delta": {"content": "Hel"}}], "usage": {"total_tokens": 1}}));
        acc.observe(&json!({"choices": [{"delta": {"content": "lo"}}]}));
        acc.observe(&json!({"choices": [], "usage": {"total_tokens": 7}}));

        assert_eq!(acc.content(), "Hello");
        assert_eq!(acc.usage().total_tokens, 7);
        assert_eq!(acc.chunks(), 3);
    }
}
