//! Opening messages of the commit-message conversation.

use crate::llm::message::ConversationMessage;

/// Conventional-commit types the first line may start with.
pub const COMMIT_TYPES: [&str; 10] = [
    "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore",
];

/// Longest allowed first line, in characters.
pub const MAX_SUBJECT_CHARS: usize = 100;

/// Rules the model must follow when writing the message.
pub fn system_prompt() -> String {
    format!(
        "You are a Git commit assistant that writes precise commit messages based ONLY on \
the actual staged changes. Call the analyze_changes tool to see them before writing \
anything. Follow these rules strictly:

1. First line format: {{type}}: {{short description}}
   - type MUST be one of: {types}
   - The whole first line must be under {max} characters and describe the actual change
   - Never end the first line with a period
   - Use the imperative mood (\"add\", not \"adds\" or \"added\")
   - For changes to existing code use verbs like \"update\", \"modify\", \"improve\"
   - Only use \"add\" for files or features that are completely new

2. Put exactly TWO blank lines after the first line.

3. The body must:
   - Only describe changes present in the diff
   - Respect the Change Status of each file:
     * \"Modified existing file\" means the file existed before and was changed
     * \"New file\" means this commit introduces the file
   - Start with a short overview of what the changes accomplish
   - Give a file-by-file breakdown with bullet points when several files changed
   - Never describe a modified file as new or added

4. Avoid these mistakes:
   - Saying a file was \"added\" when its Change Status is \"Modified existing file\"
   - Describing existing features or types as new
   - Mentioning changes that are not in the diff
   - Speculating about future changes

Reply with the commit message only, without quotes or code fences.",
        types = COMMIT_TYPES.join(", "),
        max = MAX_SUBJECT_CHARS,
    )
}

pub fn user_prompt() -> String {
    "Analyze the current staged changes of this repository with the analyze_changes tool, \
then write a commit message that precisely describes them."
        .to_string()
}

/// The system and user messages every conversation starts with.
pub fn initial_conversation() -> Vec<ConversationMessage> {
    vec![
        ConversationMessage::System(system_prompt()),
        ConversationMessage::User(user_prompt()),
    ]
}
