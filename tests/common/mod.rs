//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;

use git2::{Oid, Repository, Signature};

use commitsmith::{AnalyzerConfig, ChangeSetAnalyzer};

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository with a repo-local identity.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config
                .set_str("user.name", "Test User")
                .expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file in the working tree, creating parent directories.
    pub fn write(&self, name: &str, content: impl AsRef<[u8]>) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Add a working-tree file to the index.
    pub fn stage(&self, name: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Write and stage in one go.
    pub fn write_and_stage(&self, name: &str, content: impl AsRef<[u8]>) {
        self.write(name, content);
        self.stage(name);
    }

    /// Delete a file and stage the deletion.
    pub fn remove_and_stage(&self, name: &str) {
        std::fs::remove_file(self.path().join(name)).expect("Failed to remove file");
        let mut index = self.repo.index().expect("Failed to get index");
        index
            .remove_path(Path::new(name))
            .expect("Failed to remove from index");
        index.write().expect("Failed to write index");
    }

    /// Move a file and stage both sides of the move.
    pub fn rename_and_stage(&self, from: &str, to: &str) {
        std::fs::rename(self.path().join(from), self.path().join(to))
            .expect("Failed to rename file");
        let mut index = self.repo.index().expect("Failed to get index");
        index
            .remove_path(Path::new(from))
            .expect("Failed to remove from index");
        index.add_path(Path::new(to)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Commit the current index. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com")
            .expect("Failed to create signature");
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Short name of the branch HEAD points at, born or not.
    pub fn head_branch(&self) -> String {
        let head = self.repo.find_reference("HEAD").expect("Failed to find HEAD");
        let target = head
            .symbolic_target()
            .expect("HEAD is not symbolic")
            .to_string();
        target
            .strip_prefix("refs/heads/")
            .unwrap_or(&target)
            .to_string()
    }

    /// Point HEAD at a branch that has no commits, keeping the index.
    pub fn switch_to_orphan(&self, name: &str) {
        self.repo
            .set_head(&format!("refs/heads/{}", name))
            .expect("Failed to set HEAD");
    }

    pub fn analyzer(&self) -> ChangeSetAnalyzer {
        self.analyzer_with(AnalyzerConfig::default())
    }

    pub fn analyzer_with(&self, config: AnalyzerConfig) -> ChangeSetAnalyzer {
        ChangeSetAnalyzer::discover(self.path(), config).expect("Failed to open analyzer")
    }
}

/// `count` distinct lines, newline-terminated.
pub fn numbered_lines(prefix: &str, count: usize) -> String {
    (0..count).map(|i| format!("{} {}\n", prefix, i)).collect()
}
