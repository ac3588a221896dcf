//! Provider selection and the adapter seam used by the conversation.

use std::env;
use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::{
    DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_OPENAI_BASE_URL, LOCAL_API_KEY, local_base_url,
};
use crate::error::ProviderError;
use crate::llm::anthropic::AnthropicAdapter;
use crate::llm::http::build_client;
use crate::llm::message::{ConversationMessage, ProviderResponse, ToolChoice, ToolInvocationRequest};
use crate::llm::openai::OpenAiAdapter;

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    /// An OpenAI-compatible server such as Ollama.
    Local,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Local => "Local",
        }
    }

    /// Environment variables holding the API key, in lookup order.
    pub fn api_key_env_vars(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::OpenAi => &["OPENAI_API_KEY"],
            ProviderKind::Anthropic => &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY"],
            ProviderKind::Local => &[],
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Local)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider and the model name to send to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub kind: ProviderKind,
    pub model: String,
}

impl ModelSelection {
    /// Resolve a `--model` value.
    ///
    /// Accepts `provider:model` (`openai:`, `anthropic:`, `local:`, `ollama:`)
    /// or a bare name routed by prefix: `gpt*`, `chatgpt*`, `o1*`, `o3*`,
    /// `o4*` go to OpenAI and `claude*` to Anthropic. With `local` set the
    /// name is sent as-is to the local server, so tags like `llama3:8b` work.
    pub fn resolve(model: &str, local: bool) -> Result<Self, ProviderError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ProviderError::UnsupportedModel(model.to_string()));
        }

        if let Some((prefix, name)) = model.split_once(':') {
            let kind = match prefix.to_ascii_lowercase().as_str() {
                "openai" => Some(ProviderKind::OpenAi),
                "anthropic" | "claude" => Some(ProviderKind::Anthropic),
                "local" | "ollama" => Some(ProviderKind::Local),
                _ => None,
            };
            if let Some(kind) = kind {
                let kind = if local { ProviderKind::Local } else { kind };
                return Self::named(kind, name, model);
            }
        }

        if local {
            return Self::named(ProviderKind::Local, model, model);
        }

        let lower = model.to_ascii_lowercase();
        let kind = if ["gpt", "chatgpt", "o1", "o3", "o4"]
            .iter()
            .any(|p| lower.starts_with(p))
        {
            ProviderKind::OpenAi
        } else if lower.starts_with("claude") {
            ProviderKind::Anthropic
        } else {
            return Err(ProviderError::UnsupportedModel(model.to_string()));
        };

        Self::named(kind, model, model)
    }

    fn named(kind: ProviderKind, name: &str, original: &str) -> Result<Self, ProviderError> {
        if name.trim().is_empty() {
            return Err(ProviderError::UnsupportedModel(original.to_string()));
        }
        Ok(Self {
            kind,
            model: name.trim().to_string(),
        })
    }
}

/// First non-empty API key found in the provider's environment variables.
pub fn api_key_from_env(kind: ProviderKind) -> Option<String> {
    kind.api_key_env_vars().iter().find_map(|var| {
        env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Uniform view of an LLM chat API with tool calling.
///
/// Implementations translate the provider-neutral conversation into their
/// wire format and read their own responses back. The conversation never
/// looks inside a [`ProviderResponse`] itself.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;

    /// The `analyze_changes` declaration in this provider's schema.
    fn describe_tools(&self) -> Value;

    /// Send the whole conversation. One HTTP round trip, no retries.
    async fn send(
        &self,
        conversation: &[ConversationMessage],
        tool_choice: &ToolChoice,
    ) -> Result<ProviderResponse, ProviderError>;

    fn is_tool_invocation(&self, response: &ProviderResponse) -> bool;

    /// The first tool call in the response, if any.
    fn extract_tool_invocation(&self, response: &ProviderResponse)
    -> Option<ToolInvocationRequest>;

    /// Assistant text of the response; empty when there is none.
    fn extract_final_text(&self, response: &ProviderResponse) -> String;
}

/// The configured provider.
pub enum Provider {
    OpenAi(OpenAiAdapter),
    Anthropic(AnthropicAdapter),
    Local(OpenAiAdapter),
}

impl Provider {
    /// Build the adapter for `selection`.
    ///
    /// `api_key` is required for hosted providers; the local server gets a
    /// placeholder key when none is given. `base_url` overrides the
    /// provider's default endpoint.
    pub fn new(
        selection: &ModelSelection,
        api_key: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, ProviderError> {
        let client = build_client()?;
        let model = selection.model.clone();

        let provider = match selection.kind {
            ProviderKind::OpenAi => {
                let api_key = require_key(selection.kind, api_key)?;
                let base_url = base_url.unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
                Provider::OpenAi(OpenAiAdapter::new(
                    ProviderKind::OpenAi,
                    client,
                    base_url,
                    api_key,
                    model,
                ))
            }
            ProviderKind::Anthropic => {
                let api_key = require_key(selection.kind, api_key)?;
                let base_url = base_url.unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string());
                Provider::Anthropic(AnthropicAdapter::new(client, base_url, api_key, model))
            }
            ProviderKind::Local => {
                let api_key = api_key.unwrap_or_else(|| LOCAL_API_KEY.to_string());
                let base_url = base_url.unwrap_or_else(local_base_url);
                Provider::Local(OpenAiAdapter::new(
                    ProviderKind::Local,
                    client,
                    base_url,
                    api_key,
                    model,
                ))
            }
        };

        debug!(
            "Using {} model {}",
            provider.kind(),
            provider.model()
        );
        Ok(provider)
    }

    fn adapter(&self) -> &dyn ProviderAdapter {
        match self {
            Provider::OpenAi(adapter) | Provider::Local(adapter) => adapter,
            Provider::Anthropic(adapter) => adapter,
        }
    }
}

fn require_key(kind: ProviderKind, api_key: Option<String>) -> Result<String, ProviderError> {
    api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or(ProviderError::MissingApiKey {
            provider: kind.as_str(),
            env_var: kind.api_key_env_vars().first().copied().unwrap_or_default(),
        })
}

#[async_trait]
impl ProviderAdapter for Provider {
    fn kind(&self) -> ProviderKind {
        self.adapter().kind()
    }

    fn model(&self) -> &str {
        self.adapter().model()
    }

    fn describe_tools(&self) -> Value {
        self.adapter().describe_tools()
    }

    async fn send(
        &self,
        conversation: &[ConversationMessage],
        tool_choice: &ToolChoice,
    ) -> Result<ProviderResponse, ProviderError> {
        self.adapter().send(conversation, tool_choice).await
    }

    fn is_tool_invocation(&self, response: &ProviderResponse) -> bool {
        self.adapter().is_tool_invocation(response)
    }

    fn extract_tool_invocation(
        &self,
        response: &ProviderResponse,
    ) -> Option<ToolInvocationRequest> {
        self.adapter().extract_tool_invocation(response)
    }

    fn extract_final_text(&self, response: &ProviderResponse) -> String {
        self.adapter().extract_final_text(response)
    }
}
