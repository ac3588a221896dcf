//! Git operations using git2-rs.

pub mod analyzer;
pub mod commit;
pub mod record;
pub mod staged;
pub mod summary;

pub use analyzer::{ChangeAnalysis, ChangeSetAnalyzer};
pub use commit::commit_staged;
pub use record::{ChangeKind, ChangeRecord, count_line_changes, file_category};
pub use summary::{ChangeSetSummary, FileBrief};
