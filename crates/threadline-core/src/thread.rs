//! Canonical thread and message model sent to the trace store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};

/// Metadata attached to threads and messages. Only string and number values
/// are representable.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A single metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Number(Number),
    Text(String),
}

impl MetadataValue {
    /// Convert a JSON value, dropping anything that is not a string or number.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(MetadataValue::Text(text.clone())),
            Value::Number(number) => Some(MetadataValue::Number(number.clone())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(text) => Some(text),
            MetadataValue::Number(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            MetadataValue::Number(number) => number.as_u64(),
            MetadataValue::Text(_) => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        MetadataValue::Number(value.into())
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Number(value.into())
    }
}

/// Keep the string and number entries of a JSON object.
pub fn metadata_from_json(map: &Map<String, Value>) -> Metadata {
    map.iter()
        .filter_map(|(key, value)| MetadataValue::from_json(value).map(|v| (key.clone(), v)))
        .collect()
}

/// Content discriminator for a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Markdown,
    Json,
}

impl MessageType {
    fn is_markdown(&self) -> bool {
        matches!(self, MessageType::Markdown)
    }
}

/// One turn within a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub external_id: String,
    #[serde(rename = "type", default, skip_serializing_if = "MessageType::is_markdown")]
    pub kind: MessageType,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Message {
    /// A markdown message with optional text content.
    pub fn text(
        external_id: impl Into<String>,
        role: impl Into<String>,
        content: Option<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            kind: MessageType::Markdown,
            role: role.into(),
            content,
            json_content: None,
            metadata: None,
        }
    }

    /// A structured message carrying a JSON payload.
    pub fn json(external_id: impl Into<String>, role: impl Into<String>, payload: Value) -> Self {
        Self {
            external_id: external_id.into(),
            kind: MessageType::Json,
            role: role.into(),
            content: None,
            json_content: Some(payload),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Reference to the end user a thread belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalUser {
    pub external_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<HashMap<String, String>>,
}

impl ExternalUser {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            email: None,
            name: None,
            segments: None,
        }
    }
}

/// One traced conversation, upserted by `(external_id, project_id)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub external_id: String,
    pub project_id: u64,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_user: Option<ExternalUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Thread {
    pub fn new(external_id: impl Into<String>, project_id: u64) -> Self {
        Self {
            external_id: external_id.into(),
            project_id,
            messages: Vec::new(),
            metadata: Metadata::new(),
            external_user: None,
            created_at: None,
        }
    }
}

/// Store reply to an upsert
///
/// A 2xx reply counts as delivered even when the body carries no id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadResponse {
    #[serde(default)]
    pub id: Option<u64>,
}
