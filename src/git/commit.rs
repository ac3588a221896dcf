//! Writing the staged index as a commit.

use git2::{Commit, ErrorCode, Oid, Repository};
use tracing::info;

use crate::error::CommitError;

/// Commit the currently staged index on HEAD with `message`.
///
/// Nothing is staged or unstaged here: the index is written as a tree exactly
/// as it is. When HEAD is unborn the commit becomes the initial commit of the
/// branch. On failure the index and HEAD are left untouched.
pub fn commit_staged(repo: &Repository, message: &str) -> Result<Oid, CommitError> {
    if message.trim().is_empty() {
        return Err(CommitError::EmptyMessage);
    }

    let mut index = repo.index().map_err(CommitError::TreeFailed)?;
    let tree_id = index.write_tree().map_err(CommitError::TreeFailed)?;
    let tree = repo.find_tree(tree_id).map_err(CommitError::TreeFailed)?;

    // Get the signature from git config
    let sig = repo.signature().map_err(CommitError::ConfigError)?;

    let parent = head_commit(repo)?;
    if parent.is_none() {
        info!("Creating initial commit");
    }
    let parents: Vec<&Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(CommitError::CommitFailed)
}

/// HEAD's commit, or `None` on an unborn branch.
fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>, CommitError> {
    match repo.head() {
        Ok(head) => head
            .peel_to_commit()
            .map(Some)
            .map_err(CommitError::CommitFailed),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            Ok(None)
        }
        Err(e) => Err(CommitError::CommitFailed(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn init_repo_with_identity() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@test.com").unwrap();
        (dir, repo)
    }

    fn stage(repo: &Repository, dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    #[test]
    fn test_commit_staged_creates_initial_commit() {
        let (dir, repo) = init_repo_with_identity();
        stage(&repo, dir.path(), "hello.txt", "hello\n");

        let oid = commit_staged(&repo, "feat: add greeting").unwrap();
        let commit = repo.find_commit(oid).unwrap();
        assert_eq!(commit.message().unwrap(), "feat: add greeting");
        assert_eq!(commit.parent_count(), 0);
        assert!(commit.tree().unwrap().get_path(Path::new("hello.txt")).is_ok());
    }

    #[test]
    fn test_commit_staged_links_parent() {
        let (dir, repo) = init_repo_with_identity();
        stage(&repo, dir.path(), "a.txt", "a\n");
        let first = commit_staged(&repo, "feat: first").unwrap();

        stage(&repo, dir.path(), "a.txt", "a\nb\n");
        let second = commit_staged(&repo, "fix: second").unwrap();

        let commit = repo.find_commit(second).unwrap();
        assert_eq!(commit.parent_count(), 1);
        assert_eq!(commit.parent_id(0).unwrap(), first);
    }

    #[test]
    fn test_commit_staged_does_not_include_unstaged_files() {
        let (dir, repo) = init_repo_with_identity();
        stage(&repo, dir.path(), "staged.txt", "in\n");
        std::fs::write(dir.path().join("loose.txt"), "out\n").unwrap();

        let oid = commit_staged(&repo, "chore: partial").unwrap();
        let tree = repo.find_commit(oid).unwrap().tree().unwrap();
        assert!(tree.get_path(Path::new("staged.txt")).is_ok());
        assert!(tree.get_path(Path::new("loose.txt")).is_err());
    }

    #[test]
    fn test_commit_staged_rejects_blank_message() {
        let (dir, repo) = init_repo_with_identity();
        stage(&repo, dir.path(), "a.txt", "a\n");
        assert!(matches!(
            commit_staged(&repo, "  \n"),
            Err(CommitError::EmptyMessage)
        ));
        assert!(repo.head().is_err());
    }
}
