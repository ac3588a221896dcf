//! Staged change enumeration using git2.
//!
//! Two regimes are handled: a branch with history, where the index is diffed
//! against the HEAD tree, and a branch with no commits yet, where the index is
//! diffed against the empty tree and every path is new unless a prior snapshot
//! proves otherwise.

use std::path::Path;

use git2::{Delta, Diff, DiffFindOptions, DiffOptions, ErrorCode, Patch, Repository, Tree};
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::git::record::{ChangeKind, ChangeRecord};

/// A staged delta whose patch text has not been produced yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    /// Position of the delta inside the staged diff.
    pub delta_index: usize,
    pub path: String,
    /// Old path for renamed files (None for non-rename changes).
    pub old_path: Option<String>,
    pub kind: ChangeKind,
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// `Ok(Some(tree))` for repos with a valid HEAD, or `Err(AnalysisError::DiffFailed)`
/// for real errors (corrupt HEAD, permission issues, missing objects).
pub fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, AnalysisError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(AnalysisError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(AnalysisError::DiffFailed)?;
    Ok(Some(tree))
}

/// Diff the index against `head_tree` (or the empty tree when there is none).
///
/// Rename detection only runs when there is a previous tree to compare with.
pub fn staged_diff<'r>(
    repo: &'r Repository,
    head_tree: Option<&Tree<'_>>,
) -> Result<Diff<'r>, AnalysisError> {
    let index = repo.index().map_err(AnalysisError::IndexFailed)?;
    let mut opts = DiffOptions::new();
    opts.include_typechange(true);

    let mut diff = repo
        .diff_tree_to_index(head_tree, Some(&index), Some(&mut opts))
        .map_err(AnalysisError::DiffFailed)?;

    if head_tree.is_some() {
        let mut find = DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find))
            .map_err(AnalysisError::DiffFailed)?;
    }

    Ok(diff)
}

/// Collect staged entries from a diff, classified by git's delta status.
pub fn staged_entries(diff: &Diff<'_>) -> Vec<StagedEntry> {
    let mut entries = Vec::new();

    for (delta_index, delta) in diff.deltas().enumerate() {
        let kind = match delta.status() {
            Delta::Added | Delta::Copied => ChangeKind::Added,
            Delta::Modified => ChangeKind::Modified,
            Delta::Deleted => ChangeKind::Deleted,
            Delta::Renamed => ChangeKind::Renamed,
            Delta::Typechange => ChangeKind::TypeChanged,
            Delta::Unmodified | Delta::Ignored | Delta::Untracked => continue,
            _ => ChangeKind::Modified,
        };

        let new_path = delta
            .new_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());
        let old_path = delta
            .old_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());

        let (path, old_path) = match kind {
            ChangeKind::Renamed => {
                let path = new_path.clone().or_else(|| old_path.clone()).unwrap_or_default();
                (path, old_path)
            }
            _ => (new_path.or(old_path).unwrap_or_default(), None),
        };

        if !path.is_empty() {
            entries.push(StagedEntry {
                delta_index,
                path,
                old_path,
                kind,
            });
        }
    }

    entries
}

/// Trees of the configured prior-snapshot revisions that actually resolve.
pub fn prior_snapshot_trees<'r>(repo: &'r Repository, revisions: &[String]) -> Vec<Tree<'r>> {
    revisions
        .iter()
        .filter_map(|rev| {
            match repo.revparse_single(rev).and_then(|obj| obj.peel_to_tree()) {
                Ok(tree) => Some(tree),
                Err(e) => {
                    debug!("Prior snapshot '{}' unavailable: {}", rev, e);
                    None
                }
            }
        })
        .collect()
}

/// Whether any of the snapshot trees contains `path`.
pub fn existed_in_snapshot(snapshots: &[Tree<'_>], path: &str) -> bool {
    snapshots
        .iter()
        .any(|tree| tree.get_path(Path::new(path)).is_ok())
}

/// On a branch without history, turn "Added" into "Modified" for paths a
/// prior snapshot proves existed. Everything else stays "Added".
pub fn reclassify_against_snapshots(entries: &mut [StagedEntry], snapshots: &[Tree<'_>]) {
    if snapshots.is_empty() {
        return;
    }
    for entry in entries.iter_mut() {
        if entry.kind == ChangeKind::Added && existed_in_snapshot(snapshots, &entry.path) {
            entry.kind = ChangeKind::Modified;
        }
    }
}

/// Render the unified patch for one delta of `diff`.
pub fn patch_text(diff: &Diff<'_>, delta_index: usize) -> Result<String, git2::Error> {
    let mut patch = Patch::from_diff(diff, delta_index)?
        .ok_or_else(|| git2::Error::from_str("no textual patch available (binary or unchanged)"))?;
    let buf = patch.to_buf()?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Build records for `entries`, fetching each patch with `patch_for`.
///
/// A file whose patch cannot be produced is logged and skipped; the
/// remaining files are still processed.
pub fn collect_records<F>(entries: Vec<StagedEntry>, mut patch_for: F) -> Vec<ChangeRecord>
where
    F: FnMut(&StagedEntry) -> Result<String, git2::Error>,
{
    entries
        .into_iter()
        .filter_map(|entry| match patch_for(&entry) {
            Ok(text) => Some(ChangeRecord::from_diff(
                entry.path,
                entry.kind,
                entry.old_path,
                text,
            )),
            Err(e) => {
                warn!("Could not process file {}: {}", entry.path, e);
                None
            }
        })
        .collect()
}
