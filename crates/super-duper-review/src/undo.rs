//! Bounded undo/redo history of decision changes.
//!
//! Undo and redo are serialized by one lock held across the whole
//! pop/apply/push sequence, so two callers can never interleave writes or
//! reorder the stacks. The history lives in memory only; decisions persist,
//! the timeline does not.

use crate::decision::{DecisionChange, ReviewAction};
use crate::error::Error;
use crate::notify::ReviewObserver;
use crate::storage::models::DirectoryMember;
use crate::storage::DecisionStore;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// One file's part of a bulk change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionDelta {
    pub file_id: i64,
    pub group_id: i64,
    pub new_action: ReviewAction,
    pub previous_action: Option<ReviewAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoableAction {
    /// A single-file change. `demoted` lists siblings that lost Keep to this change.
    SetDecision {
        file_id: i64,
        group_id: i64,
        new_action: ReviewAction,
        previous_action: Option<ReviewAction>,
        session_id: Option<i64>,
        file_name: String,
        demoted: Vec<i64>,
    },
    /// A batch produced by an auto-select strategy.
    BulkDecision {
        changes: Vec<DecisionDelta>,
        session_id: Option<i64>,
        strategy_name: String,
    },
    /// Every file under a directory marked Delete; undo resets them to Skip.
    DirectoryMark {
        files: Vec<DirectoryMember>,
        session_id: Option<i64>,
        directory_path: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Apply,
    Unapply,
}

impl UndoableAction {
    pub fn description(&self) -> String {
        match self {
            UndoableAction::SetDecision {
                file_name,
                new_action,
                ..
            } => format!("Set {} to {}", file_name, new_action),
            UndoableAction::BulkDecision {
                changes,
                strategy_name,
                ..
            } => format!("Auto-select: {} ({} files)", strategy_name, changes.len()),
            UndoableAction::DirectoryMark { directory_path, .. } => {
                format!("Mark directory for deletion: {}", directory_path)
            }
        }
    }

    pub fn session_id(&self) -> Option<i64> {
        match self {
            UndoableAction::SetDecision { session_id, .. }
            | UndoableAction::BulkDecision { session_id, .. }
            | UndoableAction::DirectoryMark { session_id, .. } => *session_id,
        }
    }

    /// Re-apply the change (redo direction).
    pub async fn apply(
        &self,
        store: &dyn DecisionStore,
        observer: &dyn ReviewObserver,
    ) -> Result<(), Error> {
        self.run(Direction::Apply, store, observer).await
    }

    /// Revert the change (undo direction). A file with no earlier decision goes to Skip.
    pub async fn unapply(
        &self,
        store: &dyn DecisionStore,
        observer: &dyn ReviewObserver,
    ) -> Result<(), Error> {
        self.run(Direction::Unapply, store, observer).await
    }

    fn writes(&self, direction: Direction) -> Vec<DecisionChange> {
        let change = |file_id, group_id, action, previous, forced| DecisionChange {
            file_id,
            group_id,
            action,
            previous,
            forced,
        };
        match (self, direction) {
            (
                UndoableAction::SetDecision {
                    file_id,
                    group_id,
                    new_action,
                    previous_action,
                    demoted,
                    ..
                },
                Direction::Apply,
            ) => std::iter::once(change(*file_id, *group_id, *new_action, *previous_action, false))
                .chain(demoted.iter().map(|d| {
                    change(*d, *group_id, ReviewAction::Skip, Some(ReviewAction::Keep), true)
                }))
                .collect(),
            (
                UndoableAction::SetDecision {
                    file_id,
                    group_id,
                    new_action,
                    previous_action,
                    demoted,
                    ..
                },
                Direction::Unapply,
            ) => std::iter::once(change(
                *file_id,
                *group_id,
                previous_action.unwrap_or(ReviewAction::Skip),
                Some(*new_action),
                false,
            ))
            .chain(demoted.iter().map(|d| {
                change(*d, *group_id, ReviewAction::Keep, Some(ReviewAction::Skip), true)
            }))
            .collect(),
            (UndoableAction::BulkDecision { changes, .. }, Direction::Apply) => changes
                .iter()
                .map(|c| change(c.file_id, c.group_id, c.new_action, c.previous_action, false))
                .collect(),
            (UndoableAction::BulkDecision { changes, .. }, Direction::Unapply) => changes
                .iter()
                .map(|c| {
                    change(
                        c.file_id,
                        c.group_id,
                        c.previous_action.unwrap_or(ReviewAction::Skip),
                        Some(c.new_action),
                        false,
                    )
                })
                .collect(),
            (UndoableAction::DirectoryMark { files, .. }, Direction::Apply) => files
                .iter()
                .map(|f| change(f.file_id, f.group_id, ReviewAction::Delete, None, false))
                .collect(),
            (UndoableAction::DirectoryMark { files, .. }, Direction::Unapply) => files
                .iter()
                .map(|f| {
                    change(
                        f.file_id,
                        f.group_id,
                        ReviewAction::Skip,
                        Some(ReviewAction::Delete),
                        false,
                    )
                })
                .collect(),
        }
    }

    /// Writes run one after another. A failed write does not stop the rest;
    /// the first error is returned once every write has been attempted.
    async fn run(
        &self,
        direction: Direction,
        store: &dyn DecisionStore,
        observer: &dyn ReviewObserver,
    ) -> Result<(), Error> {
        let writes = self.writes(direction);
        let total = writes.len();
        let session_id = self.session_id();
        let mut first_error = None;
        let mut failed = 0;

        for change in writes {
            match store
                .upsert_decision(change.file_id, change.group_id, change.action, session_id)
                .await
            {
                Ok(()) => observer.on_decision_changed(&change),
                Err(e) => {
                    error!(
                        "Failed to set file {} to {}: {}",
                        change.file_id, change.action, e
                    );
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => {
                warn!(
                    "'{}' {:?}: {} of {} writes failed",
                    self.description(),
                    direction,
                    failed,
                    total
                );
                Err(e)
            }
            None => Ok(()),
        }
    }
}

/// Read-only view of the history for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_description: Option<String>,
    pub redo_description: Option<String>,
    pub undo_len: usize,
    pub redo_len: usize,
}

#[derive(Default)]
struct Stacks {
    undo: VecDeque<UndoableAction>,
    redo: VecDeque<UndoableAction>,
}

impl Stacks {
    fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: !self.undo.is_empty(),
            can_redo: !self.redo.is_empty(),
            undo_description: self.undo.back().map(UndoableAction::description),
            redo_description: self.redo.back().map(UndoableAction::description),
            undo_len: self.undo.len(),
            redo_len: self.redo.len(),
        }
    }

    /// Push onto `undo`, returning whatever fell off the front.
    fn push_undo(&mut self, action: UndoableAction, capacity: usize) -> Vec<UndoableAction> {
        self.undo.push_back(action);
        let mut evicted = Vec::new();
        while self.undo.len() > capacity {
            if let Some(old) = self.undo.pop_front() {
                evicted.push(old);
            }
        }
        evicted
    }
}

pub struct UndoHistory {
    capacity: usize,
    stacks: Mutex<Stacks>,
    observer: Arc<dyn ReviewObserver>,
}

impl UndoHistory {
    pub fn new(capacity: usize, observer: Arc<dyn ReviewObserver>) -> Self {
        Self {
            capacity: capacity.max(1),
            stacks: Mutex::new(Stacks::default()),
            observer,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record an action that has already been applied. Clears redo.
    pub async fn push(&self, action: UndoableAction) {
        let (state, evicted) = {
            let mut stacks = self.stacks.lock().await;
            let evicted = stacks.push_undo(action, self.capacity);
            stacks.redo.clear();
            (stacks.state(), evicted)
        };
        self.report_evicted(&evicted);
        self.observer.on_stack_changed(&state);
    }

    /// Apply an action and record it. The action is recorded even when some
    /// of its writes fail, so the writes that did land can still be undone.
    pub async fn execute(
        &self,
        action: UndoableAction,
        store: &dyn DecisionStore,
    ) -> Result<(), Error> {
        let result = action.apply(store, self.observer.as_ref()).await;
        self.push(action).await;
        result
    }

    /// Revert the most recent action. Returns `Ok(false)` when there is nothing to undo.
    pub async fn undo(&self, store: &dyn DecisionStore) -> Result<bool, Error> {
        let mut stacks = self.stacks.lock().await;
        let Some(action) = stacks.undo.pop_back() else {
            return Ok(false);
        };

        debug!("Undo: {}", action.description());
        let result = action.unapply(store, self.observer.as_ref()).await;
        let evicted = match result {
            Ok(()) => {
                stacks.redo.push_back(action);
                Vec::new()
            }
            // Stays on top of undo so a retry re-runs every write.
            Err(_) => stacks.push_undo(action, self.capacity),
        };
        let state = stacks.state();
        drop(stacks);

        self.report_evicted(&evicted);
        self.observer.on_stack_changed(&state);
        result.map(|_| true)
    }

    /// Re-apply the most recently undone action. Returns `Ok(false)` when there is nothing to redo.
    pub async fn redo(&self, store: &dyn DecisionStore) -> Result<bool, Error> {
        let mut stacks = self.stacks.lock().await;
        let Some(action) = stacks.redo.pop_back() else {
            return Ok(false);
        };

        debug!("Redo: {}", action.description());
        let result = action.apply(store, self.observer.as_ref()).await;
        let evicted = match result {
            Ok(()) => stacks.push_undo(action, self.capacity),
            Err(_) => {
                stacks.redo.push_back(action);
                Vec::new()
            }
        };
        let state = stacks.state();
        drop(stacks);

        self.report_evicted(&evicted);
        self.observer.on_stack_changed(&state);
        result.map(|_| true)
    }

    pub async fn clear(&self) {
        let state = {
            let mut stacks = self.stacks.lock().await;
            stacks.undo.clear();
            stacks.redo.clear();
            stacks.state()
        };
        self.observer.on_stack_changed(&state);
    }

    pub async fn state(&self) -> HistoryState {
        self.stacks.lock().await.state()
    }

    /// Descriptions of the undo stack, most recent first.
    pub async fn undo_descriptions(&self) -> Vec<String> {
        self.stacks
            .lock()
            .await
            .undo
            .iter()
            .rev()
            .map(UndoableAction::description)
            .collect()
    }

    fn report_evicted(&self, evicted: &[UndoableAction]) {
        for action in evicted {
            let description = action.description();
            debug!("Undo history full, dropped: {}", description);
            self.observer.on_history_truncated(&description);
        }
    }
}
