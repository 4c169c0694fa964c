//! Async storage seams consumed by the review engine.
//!
//! `DecisionStore` is the persistence collaborator for review decisions and
//! `ScanCatalog` is the read-only view of what the scan engine produced.
//! `SqliteStore` implements both over the shared `super_duper.db`.

use super::models::*;
use super::sqlite::Database;
use crate::decision::{ReviewAction, ReviewStatus};
use crate::error::Error;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Reads and writes one decision per file id.
///
/// Errors are returned as-is; retry policy, if any, belongs to the implementation.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Insert or replace; concurrent writers race and the later write wins.
    async fn upsert_decision(
        &self,
        file_id: i64,
        group_id: i64,
        action: ReviewAction,
        session_id: Option<i64>,
    ) -> Result<(), Error>;

    /// `None` means the file is unreviewed.
    async fn get_decision(&self, file_id: i64) -> Result<Option<ReviewAction>, Error>;

    async fn get_group_decisions(&self, group_id: i64)
        -> Result<HashMap<i64, ReviewAction>, Error>;

    async fn get_group_status(&self, group_id: i64) -> Result<ReviewStatus, Error>;

    async fn get_session_progress(&self, session_id: i64) -> Result<ReviewProgress, Error>;

    async fn get_deletion_queue(&self) -> Result<Vec<DeletionQueueEntry>, Error>;

    async fn get_deletion_queue_count(&self) -> Result<i64, Error>;

    async fn clear_decisions(&self) -> Result<(), Error>;
}

/// Read-only access to scan results.
#[async_trait]
pub trait ScanCatalog: Send + Sync {
    async fn files_in_group(&self, group_id: i64) -> Result<Vec<FileCopy>, Error>;

    async fn groups_in_session(&self, session_id: i64) -> Result<Vec<DuplicateGroup>, Error>;

    async fn files_under_directory(
        &self,
        directory: &str,
        session_id: i64,
    ) -> Result<Vec<DirectoryMember>, Error>;

    async fn latest_session_id(&self) -> Result<Option<i64>, Error>;
}

/// SQLite-backed store. The connection is guarded by its own lock and every
/// call runs on the blocking pool so async callers never stall the runtime.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub fn open(path: &str) -> Result<Self, Error> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Run a synchronous query against the connection.
    pub async fn with_db<F, T>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&Database) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|_| Error::StorageUnavailable("connection lock poisoned".to_string()))?;
            f(&guard).map_err(Error::from)
        })
        .await?
    }
}

#[async_trait]
impl DecisionStore for SqliteStore {
    async fn upsert_decision(
        &self,
        file_id: i64,
        group_id: i64,
        action: ReviewAction,
        session_id: Option<i64>,
    ) -> Result<(), Error> {
        self.with_db(move |db| db.upsert_decision(file_id, group_id, action, session_id))
            .await
    }

    async fn get_decision(&self, file_id: i64) -> Result<Option<ReviewAction>, Error> {
        self.with_db(move |db| db.get_decision(file_id)).await
    }

    async fn get_group_decisions(
        &self,
        group_id: i64,
    ) -> Result<HashMap<i64, ReviewAction>, Error> {
        self.with_db(move |db| db.get_group_decisions(group_id)).await
    }

    async fn get_group_status(&self, group_id: i64) -> Result<ReviewStatus, Error> {
        self.with_db(move |db| db.get_group_status(group_id)).await
    }

    async fn get_session_progress(&self, session_id: i64) -> Result<ReviewProgress, Error> {
        self.with_db(move |db| db.get_session_progress(session_id))
            .await
    }

    async fn get_deletion_queue(&self) -> Result<Vec<DeletionQueueEntry>, Error> {
        self.with_db(|db| db.get_deletion_queue()).await
    }

    async fn get_deletion_queue_count(&self) -> Result<i64, Error> {
        self.with_db(|db| db.get_deletion_queue_count()).await
    }

    async fn clear_decisions(&self) -> Result<(), Error> {
        self.with_db(|db| db.clear_decisions().map(|_| ())).await
    }
}

#[async_trait]
impl ScanCatalog for SqliteStore {
    async fn files_in_group(&self, group_id: i64) -> Result<Vec<FileCopy>, Error> {
        self.with_db(move |db| db.get_files_in_group(group_id)).await
    }

    async fn groups_in_session(&self, session_id: i64) -> Result<Vec<DuplicateGroup>, Error> {
        self.with_db(move |db| db.get_duplicate_groups(session_id, 0, i64::MAX))
            .await
    }

    async fn files_under_directory(
        &self,
        directory: &str,
        session_id: i64,
    ) -> Result<Vec<DirectoryMember>, Error> {
        let directory = directory.to_string();
        self.with_db(move |db| db.get_files_under_directory(&directory, session_id))
            .await
    }

    async fn latest_session_id(&self) -> Result<Option<i64>, Error> {
        self.with_db(|db| db.get_latest_session_id()).await
    }
}
