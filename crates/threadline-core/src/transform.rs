//! Pure conversions from OpenAI-style payloads into canonical messages
//!
//! Nothing here performs I/O or mutates its input. Apart from synthesized
//! message ids, equal inputs give equal outputs.

use crate::ids::message_id;
use crate::shapes::{ChatMessage, OutputText, RequestShape, ResponseShape, is_truthy};
use crate::thread::{Message, Metadata};
use serde_json::{Value, json};

/// Content block types that carry prompt text
const TEXT_BLOCK_TYPES: [&str; 2] = ["input_text", "text"];

/// Canonical prompt messages for a classified request.
pub fn prompt_messages(shape: &RequestShape<'_>) -> Vec<Message> {
    match shape {
        RequestShape::Chat(messages) => chat_messages_to_canonical(messages),
        RequestShape::ResponsesInput(input) => responses_input_to_canonical(input),
        RequestShape::Unrecognized => Vec::new(),
    }
}

/// Convert `messages` of a chat-style request.
pub fn chat_messages_to_canonical(messages: &[Value]) -> Vec<Message> {
    messages
        .iter()
        .map(|message| chat_message_to_canonical(&ChatMessage::from_value(message), "user"))
        .collect()
}

fn chat_message_to_canonical(message: &ChatMessage, default_role: &str) -> Message {
    let external_id = message
        .provided_id()
        .map(str::to_string)
        .unwrap_or_else(message_id);
    let role = message.role().unwrap_or(default_role);
    let content = message.content.as_ref().and_then(content_text);

    let mut canonical = match message.tool_calls() {
        Some(tool_calls) => {
            let mut payload = json!({ "tool_calls": tool_calls });
            if let Some(text) = content {
                payload["content"] = Value::String(text);
            }
            Message::json(external_id, role, payload)
        }
        None => Message::text(external_id, role, content),
    };

    if let Some(name) = message.name() {
        let mut metadata = Metadata::new();
        metadata.insert("name".to_string(), name.into());
        canonical = canonical.with_metadata(metadata);
    }

    canonical
}

/// Convert the `input` of a responses-style request.
pub fn responses_input_to_canonical(input: &Value) -> Vec<Message> {
    match input {
        Value::String(text) => vec![Message::text(message_id(), "user", Some(text.clone()))],
        Value::Array(items) => items.iter().map(responses_item_to_canonical).collect(),
        other => vec![serialized_user_message(other)],
    }
}

fn responses_item_to_canonical(item: &Value) -> Message {
    let role = item.get("role").and_then(Value::as_str).filter(|r| !r.is_empty());
    let content = item.get("content").filter(|c| is_truthy(c));

    match (role, content) {
        (Some(role), Some(content)) => {
            Message::text(message_id(), role, content_text(content))
        }
        _ => serialized_user_message(item),
    }
}

/// An unrecognized input item, kept verbatim as JSON text.
fn serialized_user_message(item: &Value) -> Message {
    let external_id = item
        .get("externalId")
        .filter(|id| is_truthy(id))
        .or_else(|| item.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(message_id);

    Message::text(external_id, "user", Some(item.to_string()))
}

/// Text of a message content value.
///
/// Strings pass through, lists of typed blocks keep only their text blocks
/// joined by newlines, anything else is serialized. Empty results are `None`.
fn content_text(content: &Value) -> Option<String> {
    let text = match content {
        Value::Null => return None,
        Value::String(text) => text.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter(|block| {
                block
                    .get("type")
                    .and_then(Value::as_str)
                    .is_some_and(|kind| TEXT_BLOCK_TYPES.contains(&kind))
            })
            .filter_map(|block| {
                block
                    .get("text")
                    .filter(|text| is_truthy(text))
                    .or_else(|| block.get("input_text"))
                    .and_then(Value::as_str)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    };

    (!text.is_empty()).then_some(text)
}

/// Prompt messages followed by whatever the result adds.
pub fn response_to_canonical(response: &Value, prompt: &[Message]) -> Vec<Message> {
    let mut messages = prompt.to_vec();

    let shape = ResponseShape::classify(response);
    messages.extend(
        shape
            .choices
            .into_iter()
            .map(|message| chat_message_to_canonical(&ChatMessage::from_value(message), "assistant")),
    );

    if let Some(OutputText { id, text }) = shape.output_text {
        let external_id = id.map(str::to_string).unwrap_or_else(message_id);
        messages.push(Message::text(external_id, "assistant", Some(text.to_string())));
    }

    messages
}

/// Prompt messages followed by one assistant message holding streamed text.
pub fn streamed_to_canonical(content: &str, prompt: &[Message]) -> Vec<Message> {
    let mut messages = prompt.to_vec();
    messages.push(Message::text(
        message_id(),
        "assistant",
        Some(content.to_string()),
    ));
    messages
}
