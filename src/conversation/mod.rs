//! The tool-calling conversation that produces a commit message.

pub mod orchestrator;
pub mod prompt;

pub use orchestrator::{ConversationOrchestrator, ConversationState};
pub use prompt::initial_conversation;
