use crate::decision::ReviewAction;
use serde::Serialize;

/// A file discovered by the scan engine.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub id: i64,
    pub canonical_path: String,
    pub file_name: String,
    pub parent_dir: String,
    pub drive_letter: String,
    pub file_size: i64,
    pub last_modified: i64,
    pub content_hash: Option<i64>,
    pub last_seen_session_id: Option<i64>,
}

/// A group of files sharing the same content hash and size, scoped to a session.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub id: i64,
    pub session_id: i64,
    pub content_hash: i64,
    pub file_size: i64,
    pub file_count: i64,
    pub wasted_bytes: i64,
}

/// One member of a duplicate group, as the review engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCopy {
    pub file_id: i64,
    pub group_id: i64,
    pub canonical_path: String,
    pub file_name: String,
    pub drive_letter: String,
    pub file_size: i64,
    /// Unix seconds; 0 when the scanner could not read it.
    pub last_modified: i64,
}

/// The stored decision row for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewDecision {
    pub file_id: i64,
    pub group_id: i64,
    pub action: ReviewAction,
    pub decided_at: String,
    pub session_id: Option<i64>,
}

/// A file whose current decision is Delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionQueueEntry {
    pub file_id: i64,
    pub group_id: i64,
    pub canonical_path: String,
    pub file_name: String,
    pub parent_dir: String,
    pub drive_letter: String,
    pub file_size: i64,
    pub content_hash: i64,
    /// Another member of the group that is kept or still undecided.
    pub retained_copy_path: Option<String>,
}

/// A duplicate file found under a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryMember {
    pub file_id: i64,
    pub group_id: i64,
}

/// Reviewed vs. reviewable file counts for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewProgress {
    pub reviewed: i64,
    pub total: i64,
}

impl ReviewProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.reviewed as f64 / self.total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.reviewed >= self.total
    }
}
