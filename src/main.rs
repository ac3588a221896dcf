//! commitsmith - CLI entry point.

use std::io::IsTerminal;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dialoguer::{Confirm, Password};
use tracing_subscriber::EnvFilter;

use commitsmith::config::{
    DEFAULT_EXTRA_TOOL_ROUNDS, DEFAULT_MAJOR_CHANGE_THRESHOLD, DEFAULT_MODEL,
    DEFAULT_PRIOR_SNAPSHOT_REF,
};
use commitsmith::llm::api_key_from_env;
use commitsmith::{
    AnalyzerConfig, ChangeSetAnalyzer, ConversationConfig, ConversationOrchestrator,
    ModelSelection, Provider, ProviderAdapter, ProviderKind,
};

/// Write a commit message for the staged changes using an LLM.
#[derive(Parser, Debug)]
#[command(name = "commitsmith")]
#[command(about = "Write a commit message for the staged changes using an LLM")]
#[command(version)]
struct Cli {
    /// Print the generated message without committing
    #[arg(long)]
    dry_run: bool,

    /// Model to use: gpt-*, o1/o3/o4-*, claude-*, or provider:model
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Use a local OpenAI-compatible server such as Ollama
    #[arg(long)]
    local: bool,

    /// Override the provider endpoint
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Commit without asking for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Files with more changed lines than this are reported as major changes
    #[arg(long, default_value_t = DEFAULT_MAJOR_CHANGE_THRESHOLD)]
    major_threshold: usize,

    /// Revision used to tell new files from existing ones on a branch
    /// without commits (repeatable)
    #[arg(long = "prior-ref", value_name = "REV")]
    prior_refs: Vec<String>,

    /// How many repeated tool requests to serve before using the model's text
    #[arg(long, default_value_t = DEFAULT_EXTRA_TOOL_ROUNDS)]
    extra_tool_rounds: usize,

    /// Show debug logs
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn analyzer_config(&self) -> AnalyzerConfig {
        let prior_snapshot_refs = if self.prior_refs.is_empty() {
            vec![DEFAULT_PRIOR_SNAPSHOT_REF.to_string()]
        } else {
            self.prior_refs.clone()
        };
        AnalyzerConfig {
            major_change_threshold: self.major_threshold,
            prior_snapshot_refs,
        }
    }

    fn conversation_config(&self) -> ConversationConfig {
        ConversationConfig {
            extra_tool_rounds: self.extra_tool_rounds,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Step 1: Open git repository
    let analyzer = ChangeSetAnalyzer::discover(".", cli.analyzer_config())
        .context("Not a git repository. Run commitsmith from within a git repository.")?;

    // Step 2: Make sure something is staged before contacting a provider
    let staged = analyzer
        .get_staged_changes()
        .context("Failed to read staged changes")?;
    if staged.is_empty() {
        bail!("No staged changes found. Stage files with `git add <path>` first.");
    }
    println!("Found {} staged file(s)", staged.len());

    // Step 3: Configure the provider
    let selection = ModelSelection::resolve(&cli.model, cli.local)?;
    let api_key = resolve_api_key(selection.kind)?;
    let provider = Provider::new(&selection, api_key, cli.base_url.clone())
        .context("Failed to configure the LLM provider")?;

    // Step 4: Run the conversation
    println!(
        "Generating commit message with {} ({})...",
        provider.kind(),
        provider.model()
    );
    let mut orchestrator =
        ConversationOrchestrator::new(&provider, &analyzer, cli.conversation_config());
    let message = orchestrator
        .decide_next_action()
        .await
        .context("Failed to generate commit message")?;

    println!("\n--- Commit message ---\n");
    println!("{}", message);
    println!("\n----------------------\n");

    if cli.dry_run {
        println!("Dry run complete. No commit created.");
        return Ok(());
    }

    // Step 5: Confirm and commit
    let confirmed = cli.yes
        || Confirm::new()
            .with_prompt("Create this commit?")
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;

    if !confirmed {
        println!("Commit cancelled. Staged changes are unchanged.");
        return Ok(());
    }

    if !analyzer.commit_changes(&message) {
        bail!("Failed to commit changes. Staged changes remain staged.");
    }

    println!("✓ Changes committed");
    Ok(())
}

/// Install the stderr subscriber. RUST_LOG wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "commitsmith=debug,warn" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Key from the environment, else asked for interactively. Never stored.
///
/// Returns `None` when no key is available and stdin is not a terminal;
/// the provider then reports which variable to set.
fn resolve_api_key(kind: ProviderKind) -> Result<Option<String>> {
    if !kind.requires_api_key() {
        return Ok(None);
    }
    if let Some(key) = api_key_from_env(kind) {
        return Ok(Some(key));
    }
    if !std::io::stdin().is_terminal() {
        return Ok(None);
    }

    let env_var = kind.api_key_env_vars().first().copied().unwrap_or_default();
    eprintln!("\x1b[33m⚠ {} is not set\x1b[0m", env_var);
    let key = Password::new()
        .with_prompt(format!("Enter your {} API key", kind))
        .interact()
        .context("Failed to read API key")?;
    Ok(Some(key))
}
