//! The `analyze_changes` tool declaration.

use serde_json::{Value, json};

/// Name of the only tool the model can call.
pub const ANALYZE_CHANGES_TOOL: &str = "analyze_changes";

/// Provider-neutral tool declaration; adapters wrap it in their own schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

/// Declaration of `analyze_changes`.
///
/// The arguments are advisory only: the tool always reports the staged
/// changes of the repository, whatever the model passes.
pub fn analyze_changes_tool() -> ToolDefinition {
    ToolDefinition {
        name: ANALYZE_CHANGES_TOOL,
        description: "Analyze the staged changes of the repository. Returns totals, \
per-file change status, line counts, file types, major changes and the full diff of \
every staged file. For each file, check the Change Status: 'Modified existing file' \
means the file existed before, 'New file' means it is introduced by this commit. \
Base the commit message only on what the diff shows.",
        parameters: json!({
            "type": "object",
            "properties": {
                "focus": {
                    "type": "string",
                    "description": "Optional note on what to pay attention to"
                }
            },
            "required": []
        }),
    }
}
