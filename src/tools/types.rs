//! Tool boundary types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Static description of one callable tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    /// Read tools are safe to retry after a persistence failure
    pub read_only: bool,
}

/// Outcome marker carried in every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Why a tool call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Persistence,
    InvalidArguments,
    UnknownTool,
    Diary,
    Internal,
}

impl ErrorKind {
    /// Map a crate error classification onto the boundary kinds
    pub fn from_error(error: &crate::error::Error) -> Self {
        match error.kind() {
            "validation" => Self::Validation,
            "persistence" => Self::Persistence,
            "diary" => Self::Diary,
            _ => Self::Internal,
        }
    }
}

/// JSON envelope returned by every tool call.
///
/// Serializes flat: `{"status": "success", "count": 2, "resources": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: ToolStatus,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ToolResponse {
    /// Successful call with the given payload fields
    pub fn success(payload: Map<String, Value>) -> Self {
        Self {
            status: ToolStatus::Success,
            payload,
        }
    }

    /// Successful lookup that matched nothing
    pub fn not_found(entity: &str, id: &str) -> Self {
        let mut payload = Map::new();
        payload.insert("found".to_string(), Value::Bool(false));
        payload.insert(
            "message".to_string(),
            Value::String(format!("No {} with id {}", entity, id)),
        );
        Self::success(payload)
    }

    /// Failed call
    pub fn error(kind: ErrorKind, message: impl Into<String>, error: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("message".to_string(), Value::String(message.into()));
        payload.insert("error".to_string(), Value::String(error.into()));
        payload.insert(
            "kind".to_string(),
            serde_json::to_value(kind).unwrap_or(Value::Null),
        );
        Self {
            status: ToolStatus::Error,
            payload,
        }
    }

    /// Flag a failed read as safe to repeat
    pub fn retryable(mut self) -> Self {
        self.payload.insert("retryable".to_string(), Value::Bool(true));
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    /// Failure classification, if this is an error response
    pub fn error_kind(&self) -> Option<ErrorKind> {
        if self.is_success() {
            return None;
        }
        self.payload
            .get("kind")
            .and_then(|k| serde_json::from_value(k.clone()).ok())
    }

    /// Payload field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}
