//! OpenAI chat-completions adapter, also used for local OpenAI-compatible servers.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::llm::http::{endpoint, send_request};
use crate::llm::json::normalize_tool_arguments;
use crate::llm::message::{
    ConversationMessage, ProviderResponse, ToolChoice, ToolInvocationRequest,
};
use crate::llm::provider::{ProviderAdapter, ProviderKind};
use crate::llm::tool::analyze_changes_tool;

pub struct OpenAiAdapter {
    kind: ProviderKind,
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiAdapter {
    pub fn new(
        kind: ProviderKind,
        client: Client,
        base_url: String,
        api_key: String,
        model: String,
    ) -> Self {
        Self {
            kind,
            client,
            base_url,
            api_key,
            model,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The JSON body of a `/chat/completions` request.
    pub fn build_request(
        &self,
        conversation: &[ConversationMessage],
        tool_choice: &ToolChoice,
    ) -> Value {
        let messages: Vec<Value> = conversation.iter().map(wire_message).collect();
        let tool_choice = match tool_choice {
            ToolChoice::Auto => json!("auto"),
            ToolChoice::Force(name) => json!({
                "type": "function",
                "function": { "name": name }
            }),
        };

        json!({
            "model": self.model,
            "messages": messages,
            "tools": self.describe_tools(),
            "tool_choice": tool_choice,
        })
    }
}

fn wire_message(message: &ConversationMessage) -> Value {
    match message {
        ConversationMessage::System(text) => json!({ "role": "system", "content": text }),
        ConversationMessage::User(text) => json!({ "role": "user", "content": text }),
        ConversationMessage::Assistant {
            text,
            tool_invocations,
        } => {
            let mut wire = json!({ "role": "assistant", "content": text });
            if !tool_invocations.is_empty() {
                let calls: Vec<Value> = tool_invocations
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            }
                        })
                    })
                    .collect();
                wire["tool_calls"] = Value::Array(calls);
            }
            wire
        }
        ConversationMessage::Tool {
            invocation_id,
            content,
        } => json!({
            "role": "tool",
            "tool_call_id": invocation_id,
            "content": content,
        }),
    }
}

/// `choices[0].message`, or `Null` when the body has another shape.
fn first_message(response: &ProviderResponse) -> &Value {
    &response.body()["choices"][0]["message"]
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn describe_tools(&self) -> Value {
        let tool = analyze_changes_tool();
        json!([{
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
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
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body);
        send_request(self.kind.as_str(), request).await
    }

    fn is_tool_invocation(&self, response: &ProviderResponse) -> bool {
        first_message(response)["tool_calls"]
            .as_array()
            .is_some_and(|calls| !calls.is_empty())
    }

    fn extract_tool_invocation(
        &self,
        response: &ProviderResponse,
    ) -> Option<ToolInvocationRequest> {
        let call = first_message(response)["tool_calls"].as_array()?.first()?;
        let name = call["function"]["name"].as_str()?;
        Some(ToolInvocationRequest {
            id: call["id"].as_str().unwrap_or_default().to_string(),
            name: name.to_string(),
            arguments: normalize_tool_arguments(&call["function"]["arguments"]),
        })
    }

    fn extract_final_text(&self, response: &ProviderResponse) -> String {
        if let Some(raw) = response.raw_text() {
            return raw.to_string();
        }
        first_message(response)["content"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}
