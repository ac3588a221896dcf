//! LLM provider adapters and the provider-neutral conversation model.

pub mod anthropic;
pub mod http;
pub mod json;
pub mod message;
pub mod openai;
pub mod provider;
pub mod tool;

pub use anthropic::AnthropicAdapter;
pub use message::{ConversationMessage, ProviderResponse, Role, ToolChoice, ToolInvocationRequest};
pub use openai::OpenAiAdapter;
pub use provider::{ModelSelection, Provider, ProviderAdapter, ProviderKind, api_key_from_env};
pub use tool::{ANALYZE_CHANGES_TOOL, ToolDefinition, analyze_changes_tool};
