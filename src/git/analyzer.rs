//! The staged-change analyzer: the local half of the `analyze_changes` tool.

use std::path::Path;

use git2::{Repository, StatusOptions};
use tracing::{debug, error, info};

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::git::commit::commit_staged;
use crate::git::record::ChangeRecord;
use crate::git::staged::{
    collect_records, patch_text, prior_snapshot_trees, reclassify_against_snapshots,
    resolve_head_tree, staged_diff, staged_entries,
};
use crate::git::summary::ChangeSetSummary;

/// Source of the change summary served to the model.
///
/// This abstraction allows replacing the repository in orchestrator tests.
#[cfg_attr(test, mockall::automock)]
pub trait ChangeAnalysis {
    fn analyze_changes(&self) -> Result<ChangeSetSummary, AnalysisError>;
}

/// Reads the index and working tree of one repository.
pub struct ChangeSetAnalyzer {
    repo: Repository,
    config: AnalyzerConfig,
}

impl ChangeSetAnalyzer {
    /// Discover the repository containing `path`.
    pub fn discover(path: impl AsRef<Path>, config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        let repo = Repository::discover(path).map_err(AnalysisError::OpenRepository)?;
        Ok(Self::from_repository(repo, config))
    }

    pub fn from_repository(repo: Repository, config: AnalyzerConfig) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Files staged relative to the last commit, in index order.
    ///
    /// On a branch without commits every file is "Added" unless one of the
    /// configured prior snapshots contains it. Files whose patch cannot be
    /// produced are skipped with a warning.
    pub fn get_staged_changes(&self) -> Result<Vec<ChangeRecord>, AnalysisError> {
        let head_tree = resolve_head_tree(&self.repo)?;
        let diff = staged_diff(&self.repo, head_tree.as_ref())?;
        let mut entries = staged_entries(&diff);

        if head_tree.is_none() {
            debug!("No commits on the current branch, treating staged files as new");
            let snapshots = prior_snapshot_trees(&self.repo, &self.config.prior_snapshot_refs);
            reclassify_against_snapshots(&mut entries, &snapshots);
        }

        let records = collect_records(entries, |entry| patch_text(&diff, entry.delta_index));
        debug!("Collected {} staged file(s)", records.len());
        Ok(records)
    }

    /// Working-tree files that are neither tracked nor staged (ignored files excluded).
    pub fn get_untracked_files(&self) -> Result<Vec<String>, AnalysisError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(AnalysisError::StatusFailed)?;

        let mut paths: Vec<String> = statuses
            .iter()
            .filter(|entry| entry.status().is_wt_new())
            .filter_map(|entry| entry.path().map(String::from))
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Aggregate the staged changes and untracked files into a summary.
    pub fn analyze_changes(&self) -> Result<ChangeSetSummary, AnalysisError> {
        let records = self.get_staged_changes()?;
        let untracked = self.get_untracked_files()?;
        Ok(ChangeSetSummary::from_records(
            &records,
            &untracked,
            self.config.major_change_threshold,
        ))
    }

    /// Commit the staged index. Returns `false` after logging on any failure.
    pub fn commit_changes(&self, message: &str) -> bool {
        match commit_staged(&self.repo, message) {
            Ok(oid) => {
                info!("Created commit {}", oid);
                true
            }
            Err(e) => {
                error!("Failed to commit changes: {}", e);
                false
            }
        }
    }
}

impl ChangeAnalysis for ChangeSetAnalyzer {
    fn analyze_changes(&self) -> Result<ChangeSetSummary, AnalysisError> {
        ChangeSetAnalyzer::analyze_changes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::record::ChangeKind;
    use git2::Signature;

    fn analyzer_for(dir: &Path) -> ChangeSetAnalyzer {
        ChangeSetAnalyzer::discover(dir, AnalyzerConfig::default()).unwrap()
    }

    fn stage(repo: &Repository, dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    fn commit_index(repo: &Repository, message: &str) {
        let sig = Signature::now("Test", "test@test.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_empty_stage_on_fresh_repo() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();

        let analyzer = analyzer_for(dir.path());
        assert!(analyzer.get_staged_changes().unwrap().is_empty());

        let summary = analyzer.analyze_changes().unwrap();
        assert_eq!(summary.total_additions(), 0);
        assert_eq!(summary.total_deletions(), 0);
        assert!(summary.major_changes().is_empty());
    }

    #[test]
    fn test_fresh_repo_files_are_added() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        stage(&repo, dir.path(), "main.py", "print('hi')\nprint('bye')\n");

        let records = analyzer_for(dir.path()).get_staged_changes().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path(), "main.py");
        assert_eq!(records[0].kind(), ChangeKind::Added);
        assert_eq!(records[0].additions(), 2);
        assert_eq!(records[0].deletions(), 0);
        assert_eq!(records[0].category(), "py");
    }

    #[test]
    fn test_modified_file_against_head() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        stage(&repo, dir.path(), "file.txt", "one\ntwo\n");
        commit_index(&repo, "init");

        stage(&repo, dir.path(), "file.txt", "one\nthree\nfour\n");

        let records = analyzer_for(dir.path()).get_staged_changes().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind(), ChangeKind::Modified);
        assert_eq!(records[0].additions(), 2);
        assert_eq!(records[0].deletions(), 1);
        assert!(records[0].diff().contains("+three"));
    }

    #[test]
    fn test_unstaged_edits_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        stage(&repo, dir.path(), "file.txt", "one\n");
        commit_index(&repo, "init");

        std::fs::write(dir.path().join("file.txt"), "one\nunstaged\n").unwrap();

        let records = analyzer_for(dir.path()).get_staged_changes().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_untracked_files_listed_but_not_analyzed() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        stage(&repo, dir.path(), "tracked.rs", "fn main() {}\n");
        std::fs::create_dir(dir.path().join("notes")).unwrap();
        std::fs::write(dir.path().join("notes/todo.md"), "- item\n").unwrap();

        let analyzer = analyzer_for(dir.path());
        assert_eq!(analyzer.get_untracked_files().unwrap(), vec!["notes/todo.md"]);

        let summary = analyzer.analyze_changes().unwrap();
        assert_eq!(summary.file_count(), 1);
        assert_eq!(summary.untracked_files(), ["notes/todo.md".to_string()]);
        assert!(summary.summary().ends_with("Untracked files:\nnotes/todo.md"));
    }
}
