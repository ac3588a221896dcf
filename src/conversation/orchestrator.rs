//! The two-phase tool-calling exchange.

use std::fmt;

use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::ConversationConfig;
use crate::conversation::prompt::initial_conversation;
use crate::error::ConversationError;
use crate::git::ChangeAnalysis;
use crate::llm::message::{
    ConversationMessage, ProviderResponse, ToolChoice, ToolInvocationRequest,
};
use crate::llm::provider::ProviderAdapter;
use crate::llm::tool::ANALYZE_CHANGES_TOOL;

/// Where the orchestrator is in the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Init,
    AwaitingAnalysisToolCall,
    AwaitingFinalMessage,
    Done,
    Errored,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Init => "init",
            ConversationState::AwaitingAnalysisToolCall => "awaiting-analysis-tool-call",
            ConversationState::AwaitingFinalMessage => "awaiting-final-message",
            ConversationState::Done => "done",
            ConversationState::Errored => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationState::Done | ConversationState::Errored)
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives one commit-message conversation with a provider.
///
/// The first call forces `analyze_changes`. The tool is always served from
/// the local analyzer, never from model-supplied arguments. The second call
/// lets the model answer freely. Repeated tool requests are served for at most
/// [`ConversationConfig::extra_tool_rounds`] more rounds.
pub struct ConversationOrchestrator<'a, P, A>
where
    P: ProviderAdapter,
    A: ChangeAnalysis,
{
    provider: &'a P,
    analyzer: &'a A,
    config: ConversationConfig,
    state: ConversationState,
    conversation: Vec<ConversationMessage>,
}

impl<'a, P, A> ConversationOrchestrator<'a, P, A>
where
    P: ProviderAdapter,
    A: ChangeAnalysis,
{
    pub fn new(provider: &'a P, analyzer: &'a A, config: ConversationConfig) -> Self {
        Self {
            provider,
            analyzer,
            config,
            state: ConversationState::Init,
            conversation: Vec::new(),
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// Messages exchanged so far.
    pub fn conversation(&self) -> &[ConversationMessage] {
        &self.conversation
    }

    /// Run the exchange and return the commit message verbatim.
    ///
    /// Any failure leaves the orchestrator in [`ConversationState::Errored`]
    /// and no partial message is returned.
    pub async fn decide_next_action(&mut self) -> Result<String, ConversationError> {
        match self.run().await {
            Ok(message) => {
                self.transition(ConversationState::Done);
                Ok(message)
            }
            Err(e) => {
                error!("Commit message generation failed: {}", e);
                self.transition(ConversationState::Errored);
                Err(e)
            }
        }
    }

    async fn run(&mut self) -> Result<String, ConversationError> {
        self.state = ConversationState::Init;
        self.conversation = initial_conversation();

        self.transition(ConversationState::AwaitingAnalysisToolCall);
        info!(
            "Asking {} ({}) to analyze the staged changes",
            self.provider.kind(),
            self.provider.model()
        );
        let forced = ToolChoice::force(ANALYZE_CHANGES_TOOL);
        let mut response = self.provider.send(&self.conversation, &forced).await?;

        let Some(invocation) = self.tool_request(&response) else {
            warn!("Model did not call {}, using its reply as the message", ANALYZE_CHANGES_TOOL);
            return self.final_text(&response);
        };
        self.serve_tool_call(&response, invocation)?;

        self.transition(ConversationState::AwaitingFinalMessage);
        let mut extra_rounds = 0;
        loop {
            response = self
                .provider
                .send(&self.conversation, &ToolChoice::Auto)
                .await?;

            let Some(invocation) = self.tool_request(&response) else {
                break;
            };
            if extra_rounds >= self.config.extra_tool_rounds {
                warn!(
                    "Model kept requesting tools after {} extra round(s), using its text",
                    extra_rounds
                );
                break;
            }
            extra_rounds += 1;
            debug!("Serving extra tool round {}", extra_rounds);
            self.serve_tool_call(&response, invocation)?;
        }

        self.final_text(&response)
    }

    fn transition(&mut self, next: ConversationState) {
        debug!("Conversation state {} -> {}", self.state, next);
        self.state = next;
    }

    /// The tool call in `response`, if it carries a usable one.
    fn tool_request(&self, response: &ProviderResponse) -> Option<ToolInvocationRequest> {
        if !self.provider.is_tool_invocation(response) {
            return None;
        }
        let invocation = self.provider.extract_tool_invocation(response);
        if invocation.is_none() {
            warn!("Response signalled a tool call but carried none");
        }
        invocation
    }

    /// Append the assistant turn and the matching tool result.
    fn serve_tool_call(
        &mut self,
        response: &ProviderResponse,
        invocation: ToolInvocationRequest,
    ) -> Result<(), ConversationError> {
        let content = if invocation.name == ANALYZE_CHANGES_TOOL {
            let summary = self.analyzer.analyze_changes()?;
            debug!(
                "Serving analysis of {} file(s) (+{}, -{})",
                summary.file_count(),
                summary.total_additions(),
                summary.total_deletions()
            );
            serde_json::to_string_pretty(&summary).map_err(ConversationError::Serialization)?
        } else {
            warn!("Model requested unknown tool '{}'", invocation.name);
            json!({
                "error": format!(
                    "Unknown tool '{}'. Only {} is available.",
                    invocation.name, ANALYZE_CHANGES_TOOL
                )
            })
            .to_string()
        };

        let text = self.provider.extract_final_text(response);
        let invocation_id = invocation.id.clone();
        self.conversation.push(ConversationMessage::Assistant {
            text: (!text.trim().is_empty()).then_some(text),
            tool_invocations: vec![invocation],
        });
        self.conversation.push(ConversationMessage::Tool {
            invocation_id,
            content,
        });
        Ok(())
    }

    fn final_text(&self, response: &ProviderResponse) -> Result<String, ConversationError> {
        let text = self.provider.extract_final_text(response);
        if text.trim().is_empty() {
            return Err(ConversationError::EmptyMessage);
        }
        Ok(text)
    }
}
