#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use super_duper_review::decision::{DecisionChange, ReviewAction, ReviewStatus};
use super_duper_review::storage::models::*;
use super_duper_review::storage::Database;
use super_duper_review::undo::HistoryState;
use super_duper_review::{DecisionStore, Error, ReviewObserver, SqliteStore};

pub const BASE_TIME: i64 = 1_700_000_000;
pub const DAY: i64 = 86_400;

pub fn scanned_file(path: &str, size: i64, hash: i64, modified: i64, session_id: i64) -> ScannedFile {
    let (parent, name) = path.rsplit_once('/').unwrap_or(("", path));
    ScannedFile {
        id: 0,
        canonical_path: path.to_string(),
        file_name: name.to_string(),
        parent_dir: parent.to_string(),
        drive_letter: String::new(),
        file_size: size,
        last_modified: modified,
        content_hash: Some(hash),
        last_seen_session_id: Some(session_id),
    }
}

pub struct Seeded {
    pub session_id: i64,
    pub group_ids: Vec<i64>,
}

/// One completed session; each inner vec is a duplicate group of (path, last_modified).
pub fn seed(db: &Database, groups: &[Vec<(&str, i64)>]) -> Seeded {
    let session_id = db.create_scan_session(&["/data".to_string()]).unwrap();
    let mut files = Vec::new();
    let mut specs = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        let hash = 1000 + i as i64;
        let size = 100 * (i as i64 + 1);
        let mut paths = Vec::new();
        for (path, modified) in group {
            files.push(scanned_file(path, size, hash, *modified, session_id));
            paths.push(path.to_string());
        }
        specs.push((hash, size, paths));
    }
    db.insert_scanned_files(&files).unwrap();
    let group_ids = db.insert_duplicate_groups(session_id, &specs).unwrap();
    db.complete_scan_session(session_id, files.len() as i64, 0)
        .unwrap();
    Seeded {
        session_id,
        group_ids,
    }
}

pub fn member_ids(db: &Database, group_id: i64) -> Vec<i64> {
    db.get_files_in_group(group_id)
        .unwrap()
        .iter()
        .map(|c| c.file_id)
        .collect()
}

/// Three groups: a backup/workspace pair, a three-way set with distinct ages, and a pair under /data/old.
pub fn standard_groups() -> Vec<Vec<(&'static str, i64)>> {
    vec![
        vec![
            ("/home/sam/Documents/report.docx", BASE_TIME),
            ("/data/backup/report.docx", BASE_TIME),
        ],
        vec![
            ("/data/photos/a.jpg", BASE_TIME),
            ("/data/photos/2019/a.jpg", BASE_TIME + 30 * DAY),
            ("/data/x/y/z/a.jpg", BASE_TIME + 60 * DAY),
        ],
        vec![
            ("/data/old/notes.txt", BASE_TIME),
            ("/data/old/sub/notes.txt", BASE_TIME),
        ],
    ]
}

/// In-memory store seeded with `standard_groups`, plus each group's member ids.
pub fn standard_store() -> (SqliteStore, Seeded, Vec<Vec<i64>>) {
    let db = Database::open_in_memory().unwrap();
    let seeded = seed(&db, &standard_groups());
    let members = seeded
        .group_ids
        .iter()
        .map(|g| member_ids(&db, *g))
        .collect();
    (SqliteStore::new(db), seeded, members)
}

/// Observer that records every event as a line of text.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn lines(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }
}

impl ReviewObserver for RecordingObserver {
    fn on_decision_changed(&self, change: &DecisionChange) {
        self.events.lock().unwrap().push(format!(
            "changed {} {}{}",
            change.file_id,
            change.action.as_str(),
            if change.forced { " forced" } else { "" }
        ));
    }

    fn on_stack_changed(&self, state: &HistoryState) {
        self.events
            .lock()
            .unwrap()
            .push(format!("stack {} {}", state.undo_len, state.redo_len));
    }

    fn on_history_truncated(&self, description: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("truncated {}", description));
    }
}

/// Decision store that fails writes for chosen files and delegates everything else.
pub struct FailingStore {
    pub inner: SqliteStore,
    pub failing: Mutex<HashSet<i64>>,
    pub writes: Mutex<Vec<(i64, ReviewAction)>>,
}

impl FailingStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_on(&self, file_id: i64) {
        self.failing.lock().unwrap().insert(file_id);
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }
}

#[async_trait]
impl DecisionStore for FailingStore {
    async fn upsert_decision(
        &self,
        file_id: i64,
        group_id: i64,
        action: ReviewAction,
        session_id: Option<i64>,
    ) -> Result<(), Error> {
        if self.failing.lock().unwrap().contains(&file_id) {
            return Err(Error::StorageUnavailable(format!(
                "write for file {} refused",
                file_id
            )));
        }
        self.writes.lock().unwrap().push((file_id, action));
        self.inner
            .upsert_decision(file_id, group_id, action, session_id)
            .await
    }

    async fn get_decision(&self, file_id: i64) -> Result<Option<ReviewAction>, Error> {
        self.inner.get_decision(file_id).await
    }

    async fn get_group_decisions(
        &self,
        group_id: i64,
    ) -> Result<HashMap<i64, ReviewAction>, Error> {
        self.inner.get_group_decisions(group_id).await
    }

    async fn get_group_status(&self, group_id: i64) -> Result<ReviewStatus, Error> {
        self.inner.get_group_status(group_id).await
    }

    async fn get_session_progress(&self, session_id: i64) -> Result<ReviewProgress, Error> {
        self.inner.get_session_progress(session_id).await
    }

    async fn get_deletion_queue(&self) -> Result<Vec<DeletionQueueEntry>, Error> {
        self.inner.get_deletion_queue().await
    }

    async fn get_deletion_queue_count(&self) -> Result<i64, Error> {
        self.inner.get_deletion_queue_count().await
    }

    async fn clear_decisions(&self) -> Result<(), Error> {
        self.inner.clear_decisions().await
    }
}
