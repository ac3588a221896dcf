//! Provider-agnostic conversation types.

use std::fmt;

use serde_json::Value;
use tracing::warn;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationRequest {
    /// Correlation id assigned by the provider.
    pub id: String,
    pub name: String,
    /// Arguments the model supplied. Always a JSON value, `{}` when absent.
    pub arguments: Value,
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationMessage {
    System(String),
    User(String),
    /// A model turn: optional text plus the tool calls it asked for.
    Assistant {
        text: Option<String>,
        tool_invocations: Vec<ToolInvocationRequest>,
    },
    /// The result of a tool call, correlated by the invocation id.
    Tool {
        invocation_id: String,
        content: String,
    },
}

impl ConversationMessage {
    pub fn role(&self) -> Role {
        match self {
            ConversationMessage::System(_) => Role::System,
            ConversationMessage::User(_) => Role::User,
            ConversationMessage::Assistant { .. } => Role::Assistant,
            ConversationMessage::Tool { .. } => Role::Tool,
        }
    }
}

/// Whether the model may pick freely or must call a specific tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
    Force(String),
}

impl ToolChoice {
    pub fn force(name: impl Into<String>) -> Self {
        ToolChoice::Force(name.into())
    }

    /// Name of the forced tool, if any.
    pub fn forced_tool(&self) -> Option<&str> {
        match self {
            ToolChoice::Auto => None,
            ToolChoice::Force(name) => Some(name),
        }
    }
}

/// A decoded provider response body.
///
/// Only the adapter that produced it knows how to read it. A success body
/// that is not JSON is kept as a JSON string so it can still be surfaced as
/// text.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    body: Value,
}

impl ProviderResponse {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    pub fn from_body_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(body) => Self { body },
            Err(e) => {
                warn!("Provider response is not JSON ({}), keeping it as text", e);
                Self {
                    body: Value::String(text.to_string()),
                }
            }
        }
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The raw body when it could not be decoded as JSON.
    pub fn raw_text(&self) -> Option<&str> {
        self.body.as_str()
    }
}
