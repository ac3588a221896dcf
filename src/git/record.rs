//! Per-file change records derived from staged patch text.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Category used when a path has no file extension.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// How a staged file differs from the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    TypeChanged,
}

impl ChangeKind {
    /// Label shown to the model next to each file.
    ///
    /// The wording matters: the prompt tells the model to only call a file
    /// "new" when its status reads "New file".
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Added => "New file",
            ChangeKind::Modified => "Modified existing file",
            ChangeKind::Deleted => "Deleted file",
            ChangeKind::Renamed => "Renamed file",
            ChangeKind::TypeChanged => "Type changed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "Added"),
            ChangeKind::Modified => write!(f, "Modified"),
            ChangeKind::Deleted => write!(f, "Deleted"),
            ChangeKind::Renamed => write!(f, "Renamed"),
            ChangeKind::TypeChanged => write!(f, "TypeChanged"),
        }
    }
}

/// One staged file.
///
/// Line counts are always computed from `diff`, so they agree with the patch
/// text the model sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    path: String,
    kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    old_path: Option<String>,
    additions: usize,
    deletions: usize,
    diff: String,
    category: String,
}

impl ChangeRecord {
    pub fn from_diff(
        path: impl Into<String>,
        kind: ChangeKind,
        old_path: Option<String>,
        diff: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let diff = diff.into();
        let (additions, deletions) = count_line_changes(&diff);
        let category = file_category(&path);
        Self {
            path,
            kind,
            old_path,
            additions,
            deletions,
            diff,
            category,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Previous path, only for renames.
    pub fn old_path(&self) -> Option<&str> {
        self.old_path.as_deref()
    }

    pub fn additions(&self) -> usize {
        self.additions
    }

    pub fn deletions(&self) -> usize {
        self.deletions
    }

    pub fn lines_changed(&self) -> usize {
        self.additions + self.deletions
    }

    pub fn diff(&self) -> &str {
        &self.diff
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

/// Count added and removed lines in unified diff text.
///
/// Only lines inside hunks are counted, so the `--- a/...` and `+++ b/...`
/// file headers never contribute. A `diff --git` line starts a new file
/// section and resets the hunk state.
pub fn count_line_changes(diff: &str) -> (usize, usize) {
    let mut additions = 0usize;
    let mut deletions = 0usize;
    let mut in_hunk = false;

    for line in diff.lines() {
        if line.starts_with("diff --git ") {
            in_hunk = false;
            continue;
        }
        if line.starts_with("@@") {
            in_hunk = true;
            continue;
        }
        if !in_hunk {
            continue;
        }

        match line.as_bytes().first() {
            Some(b'+') => additions += 1,
            Some(b'-') => deletions += 1,
            _ => {}
        }
    }

    (additions, deletions)
}

/// File extension of `path`, or `"unknown"`.
pub fn file_category(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
}
