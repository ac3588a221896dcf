//! commitsmith - A CLI tool that writes commit messages for staged git changes.
//!
//! # Overview
//!
//! commitsmith summarizes the staged index of a git repository and runs a
//! short tool-calling conversation with an LLM provider (OpenAI, Anthropic or
//! a local OpenAI-compatible server). The model is forced to call
//! `analyze_changes` first, which is always answered from the local
//! repository, then writes a conventional-commit message from that summary.

pub mod config;
pub mod conversation;
pub mod error;
pub mod git;
pub mod llm;

// Re-export commonly used types
pub use config::{AnalyzerConfig, ConversationConfig};
pub use conversation::{ConversationOrchestrator, ConversationState};
pub use error::{AnalysisError, CommitError, ConversationError, ProviderError};
pub use git::{ChangeAnalysis, ChangeKind, ChangeRecord, ChangeSetAnalyzer, ChangeSetSummary};
pub use llm::{ModelSelection, Provider, ProviderAdapter, ProviderKind};
