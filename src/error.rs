//! Error types for commitsmith modules using thiserror.

use thiserror::Error;

/// Errors from reading the repository state (index, HEAD, working tree).
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to read the index: {0}")]
    IndexFailed(#[source] git2::Error),

    #[error("Failed to collect staged diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to read working tree status: {0}")]
    StatusFailed(#[source] git2::Error),
}

/// Errors from writing a commit.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Commit message is empty")]
    EmptyMessage,

    #[error("Failed to write the index as a tree: {0}")]
    TreeFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),
}

/// Errors from configuring or calling an LLM provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error(
        "Unsupported model '{0}'. Use a gpt-*/o*- or claude-* model, a provider:model pair, or --local"
    )]
    UnsupportedModel(String),

    #[error("No API key for {provider}. Set {env_var} in the environment or a .env file")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request to {provider} failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API returned HTTP {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },
}

/// Errors from the commit message conversation.
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Change analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Failed to serialize the change summary: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("The model returned an empty commit message")]
    EmptyMessage,
}
