//! Tunable defaults and environment-driven settings.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Files whose additions + deletions exceed this count are listed as major changes.
pub const DEFAULT_MAJOR_CHANGE_THRESHOLD: usize = 50;

/// Revision consulted to decide whether a staged path existed before.
pub const DEFAULT_PRIOR_SNAPSHOT_REF: &str = "HEAD";

/// Extra tool rounds served after the first analysis before falling back to text.
pub const DEFAULT_EXTRA_TOOL_ROUNDS: usize = 1;

/// Model used when `--model` is not given.
pub const DEFAULT_MODEL: &str = "gpt-4o";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:11434/v1";

/// Placeholder key accepted by Ollama's OpenAI-compatible endpoint.
pub const LOCAL_API_KEY: &str = "ollama";

/// Anthropic requires an explicit output budget on every request.
pub const ANTHROPIC_MAX_TOKENS: u32 = 2000;
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Default timeout for a single provider round trip (2 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable to override the default timeout.
pub const TIMEOUT_ENV_VAR: &str = "COMMITSMITH_HTTP_TIMEOUT";

/// Environment variable to override the local endpoint.
pub const LOCAL_URL_ENV_VAR: &str = "COMMITSMITH_LOCAL_URL";

/// Settings for [`ChangeSetAnalyzer`](crate::git::ChangeSetAnalyzer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// A file is a major change when additions + deletions is strictly greater.
    pub major_change_threshold: usize,
    /// Revisions whose trees may prove that a path existed before the first
    /// commit of the current branch. Unresolvable revisions are skipped.
    pub prior_snapshot_refs: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            major_change_threshold: DEFAULT_MAJOR_CHANGE_THRESHOLD,
            prior_snapshot_refs: vec![DEFAULT_PRIOR_SNAPSHOT_REF.to_string()],
        }
    }
}

/// Settings for [`ConversationOrchestrator`](crate::conversation::ConversationOrchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationConfig {
    pub extra_tool_rounds: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            extra_tool_rounds: DEFAULT_EXTRA_TOOL_ROUNDS,
        }
    }
}

/// Get the configured provider timeout.
///
/// Reads from COMMITSMITH_HTTP_TIMEOUT if set, otherwise uses 120 seconds.
/// Logs a warning if the variable is set but not a whole number of seconds.
pub fn http_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Base URL of the local OpenAI-compatible endpoint.
pub fn local_base_url() -> String {
    match env::var(LOCAL_URL_ENV_VAR) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => DEFAULT_LOCAL_BASE_URL.to_string(),
    }
}
