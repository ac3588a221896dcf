//! Anthropic Messages API adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value, json};

use crate::config::{ANTHROPIC_API_VERSION, ANTHROPIC_MAX_TOKENS};
use crate::error::ProviderError;
use crate::llm::http::{endpoint, send_request};
use crate::llm::json::normalize_tool_arguments;
use crate::llm::message::{
    ConversationMessage, ProviderResponse, ToolChoice, ToolInvocationRequest,
};
use crate::llm::provider::{ProviderAdapter, ProviderKind};
use crate::llm::tool::analyze_changes_tool;

pub struct AnthropicAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicAdapter {
    pub fn new(client: Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The JSON body of a `/v1/messages` request.
    ///
    /// System turns move to the top-level `system` field. Tool results are
    /// sent as `tool_result` blocks in a user turn.
    pub fn build_request(
        &self,
        conversation: &[ConversationMessage],
        tool_choice: &ToolChoice,
    ) -> Value {
        let system: Vec<&str> = conversation
            .iter()
            .filter_map(|message| match message {
                ConversationMessage::System(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();

        let messages: Vec<Value> = conversation.iter().filter_map(wire_message).collect();

        let tool_choice = match tool_choice {
            ToolChoice::Auto => json!({ "type": "auto" }),
            ToolChoice::Force(name) => json!({ "type": "tool", "name": name }),
        };

        let mut body = json!({
            "model": self.model,
            "max_tokens": ANTHROPIC_MAX_TOKENS,
            "messages": messages,
            "tools": self.describe_tools(),
            "tool_choice": tool_choice,
        });
        if !system.is_empty() {
            body["system"] = Value::String(system.join("\n\n"));
        }
        body
    }
}

fn wire_message(message: &ConversationMessage) -> Option<Value> {
    match message {
        ConversationMessage::System(_) => None,
        ConversationMessage::User(text) => Some(json!({ "role": "user", "content": text })),
        ConversationMessage::Assistant {
            text,
            tool_invocations,
        } => {
            let mut blocks = Vec::new();
            if let Some(text) = text.as_deref().filter(|t| !t.is_empty()) {
                blocks.push(json!({ "type": "text", "text": text }));
            }
            for call in tool_invocations {
                // input must be an object
                let input = match &call.arguments {
                    Value::Object(_) => call.arguments.clone(),
                    _ => Value::Object(Map::new()),
                };
                blocks.push(json!({
                    "type": "tool_use",
                    "id": call.id,
                    "name": call.name,
                    "input": input,
                }));
            }
            Some(json!({ "role": "assistant", "content": blocks }))
        }
        ConversationMessage::Tool {
            invocation_id,
            content,
        } => Some(json!({
            "role": "user",
            "content": [{
                "type": "tool_result",
                "tool_use_id": invocation_id,
                "content": content,
            }]
        })),
    }
}

fn content_blocks(response: &ProviderResponse) -> &[Value] {
    response.body()["content"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn describe_tools(&self) -> Value {
        let tool = analyze_changes_tool();
        json!([{
            "name": tool.name,
            "description": tool.description,
            "input_schema": tool.parameters,
        }])
    }

    async fn send(
        &self,
        conversation: &[ConversationMessage],
        tool_choice: &ToolChoice,
    ) -> Result<ProviderResponse, ProviderError> {
        let body = self.build_request(conversation, tool_choice);
        let request = self
            .client
            .post(endpoint(&self.base_url, "v1/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&body);
        send_request(ProviderKind::Anthropic.as_str(), request).await
    }

    fn is_tool_invocation(&self, response: &ProviderResponse) -> bool {
        response.body()["stop_reason"].as_str() == Some("tool_use")
    }

    fn extract_tool_invocation(
        &self,
        response: &ProviderResponse,
    ) -> Option<ToolInvocationRequest> {
        let block = content_blocks(response)
            .iter()
            .find(|block| block["type"].as_str() == Some("tool_use"))?;
        let name = block["name"].as_str()?;
        Some(ToolInvocationRequest {
            id: block["id"].as_str().unwrap_or_default().to_string(),
            name: name.to_string(),
            arguments: normalize_tool_arguments(&block["input"]),
        })
    }

    fn extract_final_text(&self, response: &ProviderResponse) -> String {
        if let Some(raw) = response.raw_text() {
            return raw.to_string();
        }
        content_blocks(response)
            .iter()
            .filter(|block| block["type"].as_str() == Some("text"))
            .filter_map(|block| block["text"].as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}
