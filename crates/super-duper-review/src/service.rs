//! The review engine's entry point.
//!
//! `ReviewService` ties the decision store, the scan catalog, the undo
//! history and the comparison view together. Every decision intent flows
//! through here: normalize (single-keep), persist, record for undo, notify.
//!
//! Operations that write decisions hold the comparison lock from their first
//! read to their last write, so they never interleave. The undo history's
//! own lock is only ever taken inside it.

use crate::comparison::ComparisonSet;
use crate::config::ReviewConfig;
use crate::decision::{ReviewAction, ReviewStatus};
use crate::error::Error;
use crate::notify::ReviewObserver;
use crate::reconcile::GroupReview;
use crate::storage::models::{DeletionQueueEntry, FileCopy, ReviewProgress};
use crate::storage::{DecisionStore, ScanCatalog, SqliteStore};
use crate::strategy::AutoSelectStrategy;
use crate::suggestion::{Suggestion, SuggestionEngine};
use crate::undo::{HistoryState, UndoHistory, UndoableAction};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One card of a loaded comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub copy: FileCopy,
    pub state: Option<ReviewAction>,
    pub heuristic_label: String,
}

/// Everything a comparison view shows for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonView {
    pub group_id: i64,
    pub status: ReviewStatus,
    pub cards: Vec<CardView>,
    pub suggestion: Option<Suggestion>,
    pub suggestion_message: Option<String>,
}

pub struct ReviewService {
    store: Arc<dyn DecisionStore>,
    catalog: Arc<dyn ScanCatalog>,
    history: UndoHistory,
    suggestions: SuggestionEngine,
    /// The loaded group, if any. Also serializes every decision write.
    comparison: Mutex<Option<ComparisonSet>>,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn DecisionStore>,
        catalog: Arc<dyn ScanCatalog>,
        config: &ReviewConfig,
        observer: Arc<dyn ReviewObserver>,
    ) -> Self {
        Self {
            store,
            catalog,
            history: UndoHistory::new(config.undo_capacity, observer),
            suggestions: SuggestionEngine::new(config.recency_threshold_days),
            comparison: Mutex::new(None),
        }
    }

    /// Use one SQLite store as both the decision store and the scan catalog.
    pub fn with_sqlite(
        store: SqliteStore,
        config: &ReviewConfig,
        observer: Arc<dyn ReviewObserver>,
    ) -> Self {
        let shared = Arc::new(store);
        Self::new(shared.clone(), shared, config, observer)
    }

    // ── Comparison ───────────────────────────────────────────────

    /// Load a group's copies side by side. Replaces any previously loaded group.
    pub async fn load_group(&self, group_id: i64) -> Result<ComparisonView, Error> {
        let mut comparison = self.comparison.lock().await;
        let copies = self.catalog.files_in_group(group_id).await?;
        let stored = self.store.get_group_decisions(group_id).await?;

        let members: Vec<i64> = copies.iter().map(|c| c.file_id).collect();
        let review = GroupReview::new(group_id, &members, &stored);
        if let Err(e) = review.check_single_keep() {
            warn!("{}", e);
        }

        let suggestion = self.suggestions.suggest(&copies);
        let set = ComparisonSet::load(group_id, copies, &stored)?;

        let cards = set
            .cards()
            .iter()
            .map(|card| CardView {
                heuristic_label: self.card_label(&card.copy, suggestion.as_ref()),
                copy: card.copy.clone(),
                state: card.state,
            })
            .collect::<Vec<_>>();

        let suggestion_message = suggestion.as_ref().and_then(|s| {
            cards
                .iter()
                .find(|c| c.copy.file_id == s.keep_id)
                .map(|c| format!("Suggestion: keep {} ({})", c.copy.file_name, s.reason))
        });

        debug!("Loaded group {} with {} cards", group_id, cards.len());
        *comparison = Some(set);

        Ok(ComparisonView {
            group_id,
            status: review.status,
            cards,
            suggestion,
            suggestion_message,
        })
    }

    /// Current card states of the loaded comparison, if any.
    pub async fn loaded_states(&self) -> Option<(i64, Vec<(i64, Option<ReviewAction>)>)> {
        self.comparison.lock().await.as_ref().map(|set| {
            (
                set.group_id(),
                set.cards()
                    .iter()
                    .map(|c| (c.copy.file_id, c.state))
                    .collect(),
            )
        })
    }

    fn card_label(&self, copy: &FileCopy, suggestion: Option<&Suggestion>) -> String {
        match suggestion {
            Some(s) if s.keep_id == copy.file_id => format!("Suggested: Keep ({})", s.label),
            Some(s) if s.delete_id == copy.file_id => format!("Suggested: Delete ({})", s.label),
            _ => self.suggestions.classify_label(&copy.canonical_path).to_string(),
        }
    }

    // ── Decisions ────────────────────────────────────────────────

    /// Record a decision for one file. When its group is loaded, a Keep
    /// demotes every sibling kept on a card or in storage, and the demotions
    /// are part of the same undo entry.
    pub async fn set_decision(
        &self,
        file_id: i64,
        group_id: i64,
        action: ReviewAction,
        session_id: Option<i64>,
    ) -> Result<(), Error> {
        let mut comparison = self.comparison.lock().await;
        let previous_action = self.store.get_decision(file_id).await?;

        let loaded = comparison
            .as_ref()
            .is_some_and(|set| set.group_id() == group_id);
        // Storage is the source of truth: a failed write can leave a Keep
        // there that the cards no longer show.
        let stored_keeps: Vec<i64> = if loaded && action == ReviewAction::Keep {
            self.store
                .get_group_decisions(group_id)
                .await?
                .into_iter()
                .filter(|(id, stored)| *id != file_id && *stored == ReviewAction::Keep)
                .map(|(id, _)| id)
                .collect()
        } else {
            Vec::new()
        };

        let (file_name, demoted) = match comparison.as_mut().filter(|set| set.group_id() == group_id) {
            Some(set) => {
                let file_name = set
                    .cards()
                    .iter()
                    .find(|c| c.copy.file_id == file_id)
                    .map(|c| c.copy.file_name.clone())
                    .unwrap_or_else(|| file_id.to_string());
                let mut demoted = BTreeSet::new();
                match set.set(file_id, action) {
                    Ok(changes) => {
                        demoted.extend(changes.iter().filter(|c| c.forced).map(|c| c.file_id))
                    }
                    Err(e) => warn!("{}", e),
                }
                demoted.extend(stored_keeps.into_iter().filter(|id| set.contains(*id)));
                (file_name, demoted.into_iter().collect())
            }
            None => {
                if action == ReviewAction::Keep {
                    warn!(
                        "Single-keep not enforced for file {}: group {} is not loaded",
                        file_id, group_id
                    );
                }
                (file_id.to_string(), Vec::new())
            }
        };

        let undo_action = UndoableAction::SetDecision {
            file_id,
            group_id,
            new_action: action,
            previous_action,
            session_id,
            file_name,
            demoted,
        };
        let result = self.history.execute(undo_action, self.store.as_ref()).await;
        self.resync(&mut comparison).await;
        result
    }

    /// Apply an auto-select strategy to every group of a session.
    pub async fn auto_select(
        &self,
        strategy: AutoSelectStrategy,
        session_id: i64,
    ) -> Result<usize, Error> {
        let group_ids: Vec<i64> = self
            .catalog
            .groups_in_session(session_id)
            .await?
            .iter()
            .map(|g| g.id)
            .collect();
        self.auto_select_groups(strategy, session_id, &group_ids)
            .await
    }

    /// Apply an auto-select strategy to the given groups as one undoable step.
    /// Returns the number of files changed.
    pub async fn auto_select_groups(
        &self,
        strategy: AutoSelectStrategy,
        session_id: i64,
        group_ids: &[i64],
    ) -> Result<usize, Error> {
        let mut comparison = self.comparison.lock().await;
        let mut changes = Vec::new();
        let mut groups_changed = 0;
        for group_id in group_ids {
            let copies = self.catalog.files_in_group(*group_id).await?;
            let current = self.store.get_group_decisions(*group_id).await?;
            let plan = strategy.plan_group(&copies, &current, &self.suggestions);
            if !plan.is_empty() {
                groups_changed += 1;
                changes.extend(plan);
            }
        }

        if changes.is_empty() {
            info!("Auto-select '{}' found nothing to change", strategy);
            return Ok(0);
        }

        let count = changes.len();
        let action = UndoableAction::BulkDecision {
            changes,
            session_id: Some(session_id),
            strategy_name: strategy.name().to_string(),
        };
        let result = self.history.execute(action, self.store.as_ref()).await;
        self.resync(&mut comparison).await;
        result?;

        info!(
            "Applied {} strategy to {} groups ({} files)",
            strategy, groups_changed, count
        );
        Ok(count)
    }

    /// Mark every duplicate under `directory` for deletion. Returns the number of files marked.
    pub async fn mark_directory(&self, directory: &str, session_id: i64) -> Result<usize, Error> {
        let mut comparison = self.comparison.lock().await;
        let files = self
            .catalog
            .files_under_directory(directory, session_id)
            .await?;
        if files.is_empty() {
            info!("No duplicate files under '{}'", directory);
            return Ok(0);
        }

        let count = files.len();
        let action = UndoableAction::DirectoryMark {
            files,
            session_id: Some(session_id),
            directory_path: directory.to_string(),
        };
        let result = self.history.execute(action, self.store.as_ref()).await;
        self.resync(&mut comparison).await;
        result?;

        info!("Marked {} files in '{}' for deletion", count, directory);
        Ok(count)
    }

    // ── History ──────────────────────────────────────────────────

    /// Returns `Ok(false)` when there was nothing to undo.
    pub async fn undo(&self) -> Result<bool, Error> {
        let mut comparison = self.comparison.lock().await;
        let result = self.history.undo(self.store.as_ref()).await;
        self.resync(&mut comparison).await;
        result
    }

    /// Returns `Ok(false)` when there was nothing to redo.
    pub async fn redo(&self) -> Result<bool, Error> {
        let mut comparison = self.comparison.lock().await;
        let result = self.history.redo(self.store.as_ref()).await;
        self.resync(&mut comparison).await;
        result
    }

    pub async fn history_state(&self) -> HistoryState {
        self.history.state().await
    }

    pub async fn undo_descriptions(&self) -> Vec<String> {
        self.history.undo_descriptions().await
    }

    /// Wipe every stored decision and the undo timeline.
    pub async fn reset(&self) -> Result<(), Error> {
        let mut comparison = self.comparison.lock().await;
        let cleared = self.store.clear_decisions().await;
        self.resync(&mut comparison).await;
        cleared?;
        self.history.clear().await;
        info!("All review decisions cleared");
        Ok(())
    }

    /// Re-read the loaded group's decisions so cards match storage after any write,
    /// including one that partly failed.
    async fn resync(&self, comparison: &mut Option<ComparisonSet>) {
        let Some(set) = comparison.as_mut() else {
            return;
        };
        match self.store.get_group_decisions(set.group_id()).await {
            Ok(stored) => {
                let ids: Vec<i64> = set.cards().iter().map(|c| c.copy.file_id).collect();
                for file_id in ids {
                    set.sync(file_id, stored.get(&file_id).copied());
                }
            }
            Err(e) => warn!("Could not refresh group {}: {}", set.group_id(), e),
        }
    }

    // ── Queries ──────────────────────────────────────────────────

    pub async fn group_status(&self, group_id: i64) -> Result<ReviewStatus, Error> {
        self.store.get_group_status(group_id).await
    }

    pub async fn session_progress(&self, session_id: i64) -> Result<ReviewProgress, Error> {
        self.store.get_session_progress(session_id).await
    }

    pub async fn deletion_queue(&self) -> Result<Vec<DeletionQueueEntry>, Error> {
        self.store.get_deletion_queue().await
    }

    pub async fn deletion_queue_count(&self) -> Result<i64, Error> {
        self.store.get_deletion_queue_count().await
    }

    pub async fn suggest(&self, group_id: i64) -> Result<Option<Suggestion>, Error> {
        let copies = self.catalog.files_in_group(group_id).await?;
        Ok(self.suggestions.suggest(&copies))
    }

    pub async fn latest_session_id(&self) -> Result<Option<i64>, Error> {
        self.catalog.latest_session_id().await
    }

    /// Check a group's stored decisions for more than one Keep, e.g. left by
    /// another view editing the same group. Reports but does not correct.
    pub async fn audit_group(&self, group_id: i64) -> Result<GroupReview, Error> {
        let members: Vec<i64> = self
            .catalog
            .files_in_group(group_id)
            .await?
            .iter()
            .map(|c| c.file_id)
            .collect();
        let stored = self.store.get_group_decisions(group_id).await?;
        let review = GroupReview::new(group_id, &members, &stored);
        if let Err(e) = review.check_single_keep() {
            warn!("{}", e);
            return Err(e);
        }
        Ok(review)
    }
}
