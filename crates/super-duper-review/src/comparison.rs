//! Side-by-side comparison of one duplicate group.
//!
//! While a group's copies are loaded together, at most one card may be Keep:
//! choosing Keep on one card demotes any other Keep card to Skip. This only
//! covers the cards loaded here; other views of the same group are not
//! consulted.

use crate::decision::{DecisionChange, ReviewAction};
use crate::error::Error;
use crate::reconcile::ReconcileGate;
use crate::storage::models::FileCopy;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub copy: FileCopy,
    /// `None` while the file has no decision.
    pub state: Option<ReviewAction>,
}

#[derive(Debug)]
pub struct ComparisonSet {
    group_id: i64,
    cards: Vec<Card>,
    gate: ReconcileGate,
}

impl ComparisonSet {
    /// Build the card set from stored decisions without triggering enforcement.
    /// Stored decisions for files outside the group are ignored.
    pub fn load(
        group_id: i64,
        copies: Vec<FileCopy>,
        stored: &HashMap<i64, ReviewAction>,
    ) -> Result<Self, Error> {
        let mut set = Self {
            group_id,
            cards: copies
                .into_iter()
                .map(|copy| Card { copy, state: None })
                .collect(),
            gate: ReconcileGate::default(),
        };

        let members: Vec<(i64, ReviewAction)> = stored
            .iter()
            .filter(|(file_id, _)| set.contains(**file_id))
            .map(|(file_id, action)| (*file_id, *action))
            .collect();

        let previous = set.gate.suppress();
        let replayed = members
            .into_iter()
            .try_for_each(|(file_id, action)| set.set(file_id, action).map(|_| ()));
        set.gate.restore(previous);
        replayed?;
        Ok(set)
    }

    pub fn group_id(&self) -> i64 {
        self.group_id
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn contains(&self, file_id: i64) -> bool {
        self.cards.iter().any(|c| c.copy.file_id == file_id)
    }

    pub fn state_of(&self, file_id: i64) -> Option<ReviewAction> {
        self.cards
            .iter()
            .find(|c| c.copy.file_id == file_id)
            .and_then(|c| c.state)
    }

    pub fn keep_count(&self) -> usize {
        self.cards
            .iter()
            .filter(|c| c.state == Some(ReviewAction::Keep))
            .count()
    }

    /// Apply a decision to one card and return every resulting change,
    /// the requested one first, followed by any forced demotions.
    pub fn set(&mut self, file_id: i64, action: ReviewAction) -> Result<Vec<DecisionChange>, Error> {
        let group_id = self.group_id;
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.copy.file_id == file_id)
            .ok_or_else(|| {
                Error::InvariantViolation(format!(
                    "file {} is not loaded in the comparison for group {}",
                    file_id, group_id
                ))
            })?;
        let previous = card.state.replace(action);

        if !self.gate.is_active() {
            return Ok(Vec::new());
        }

        let mut changes = vec![DecisionChange {
            file_id,
            group_id,
            action,
            previous,
            forced: false,
        }];

        if action == ReviewAction::Keep {
            for other in self
                .cards
                .iter_mut()
                .filter(|c| c.copy.file_id != file_id && c.state == Some(ReviewAction::Keep))
            {
                other.state = Some(ReviewAction::Skip);
                changes.push(DecisionChange {
                    file_id: other.copy.file_id,
                    group_id,
                    action: ReviewAction::Skip,
                    previous: Some(ReviewAction::Keep),
                    forced: true,
                });
            }
        }

        Ok(changes)
    }

    /// Restore a card to an earlier state without enforcement, e.g. after undo.
    pub fn sync(&mut self, file_id: i64, state: Option<ReviewAction>) {
        if let Some(card) = self.cards.iter_mut().find(|c| c.copy.file_id == file_id) {
            card.state = state;
        }
    }
}
