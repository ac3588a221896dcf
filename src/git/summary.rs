//! Aggregate statistics over staged change records.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::git::record::{ChangeKind, ChangeRecord};

/// One-line description of a changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileBrief {
    pub path: String,
    pub kind: ChangeKind,
    /// Formatted as `+additions, -deletions`.
    pub changes: String,
}

/// Summary of all staged changes, handed to the model as the
/// `analyze_changes` tool result.
///
/// Every field is derived from the records it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSetSummary {
    file_categories: BTreeSet<String>,
    total_additions: usize,
    total_deletions: usize,
    changes_by_kind: BTreeMap<ChangeKind, usize>,
    major_changes: Vec<String>,
    files_changed: Vec<FileBrief>,
    untracked_files: Vec<String>,
    summary: String,
}

impl ChangeSetSummary {
    /// Aggregate `records`. Paths whose additions + deletions are strictly
    /// greater than `major_change_threshold` are listed as major changes.
    pub fn from_records(
        records: &[ChangeRecord],
        untracked_files: &[String],
        major_change_threshold: usize,
    ) -> Self {
        let mut file_categories = BTreeSet::new();
        let mut total_additions = 0usize;
        let mut total_deletions = 0usize;
        let mut changes_by_kind: BTreeMap<ChangeKind, usize> = BTreeMap::new();
        let mut major_changes = Vec::new();
        let mut files_changed = Vec::with_capacity(records.len());

        for record in records {
            file_categories.insert(record.category().to_string());
            total_additions += record.additions();
            total_deletions += record.deletions();
            *changes_by_kind.entry(record.kind()).or_insert(0) += 1;

            if record.lines_changed() > major_change_threshold {
                major_changes.push(record.path().to_string());
            }

            files_changed.push(FileBrief {
                path: record.path().to_string(),
                kind: record.kind(),
                changes: format!("+{}, -{}", record.additions(), record.deletions()),
            });
        }

        Self {
            file_categories,
            total_additions,
            total_deletions,
            changes_by_kind,
            major_changes,
            files_changed,
            untracked_files: untracked_files.to_vec(),
            summary: render_summary_text(records, untracked_files),
        }
    }

    pub fn file_categories(&self) -> &BTreeSet<String> {
        &self.file_categories
    }

    pub fn total_additions(&self) -> usize {
        self.total_additions
    }

    pub fn total_deletions(&self) -> usize {
        self.total_deletions
    }

    pub fn changes_by_kind(&self) -> &BTreeMap<ChangeKind, usize> {
        &self.changes_by_kind
    }

    pub fn major_changes(&self) -> &[String] {
        &self.major_changes
    }

    pub fn files_changed(&self) -> &[FileBrief] {
        &self.files_changed
    }

    pub fn untracked_files(&self) -> &[String] {
        &self.untracked_files
    }

    /// Free-text block with every file's status, counts and full diff.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn file_count(&self) -> usize {
        self.files_changed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files_changed.is_empty()
    }
}

/// Serialize every record, then any untracked files, into one text block.
pub fn render_summary_text(records: &[ChangeRecord], untracked_files: &[String]) -> String {
    let mut text = String::from("Changes to be committed:\n\n");

    for record in records {
        text.push_str(&format!("File: {}\n", record.path()));
        if let Some(old_path) = record.old_path() {
            text.push_str(&format!("Renamed from: {}\n", old_path));
        }
        text.push_str(&format!(
            "Change Status: {}\nChanges: +{}, -{}\nFile type: {}\nDiff:\n{}\n\n",
            record.kind().label(),
            record.additions(),
            record.deletions(),
            record.category(),
            record.diff(),
        ));
    }

    if !untracked_files.is_empty() {
        text.push_str("\nUntracked files:\n");
        text.push_str(&untracked_files.join("\n"));
    }

    text
}
