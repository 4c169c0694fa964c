use crate::decision::{ReviewAction, ReviewStatus};
use crate::error::Error;
use std::collections::HashMap;

/// Whether decision changes are currently being reconciled.
///
/// While a view is being populated from storage the gate is `Suppressed`:
/// states are recorded as-is and no enforcement or notification happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    #[default]
    Active,
    Suppressed,
}

#[derive(Debug, Default)]
pub struct ReconcileGate {
    mode: ReconcileMode,
}

impl ReconcileGate {
    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode == ReconcileMode::Active
    }

    /// Enter `Suppressed`, returning the mode to hand back to `restore`.
    pub fn suppress(&mut self) -> ReconcileMode {
        std::mem::replace(&mut self.mode, ReconcileMode::Suppressed)
    }

    pub fn restore(&mut self, previous: ReconcileMode) {
        self.mode = previous;
    }
}

/// Review summary of one duplicate group computed from its stored decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReview {
    pub group_id: i64,
    pub member_count: i64,
    pub decided_count: i64,
    pub keep_count: i64,
    pub status: ReviewStatus,
}

impl GroupReview {
    pub fn new(group_id: i64, members: &[i64], decisions: &HashMap<i64, ReviewAction>) -> Self {
        let mut decided_count = 0;
        let mut keep_count = 0;
        for file_id in members {
            if let Some(action) = decisions.get(file_id) {
                decided_count += 1;
                if *action == ReviewAction::Keep {
                    keep_count += 1;
                }
            }
        }
        let member_count = members.len() as i64;
        Self {
            group_id,
            member_count,
            decided_count,
            keep_count,
            status: ReviewStatus::from_counts(decided_count, member_count),
        }
    }

    /// Fails when the stored decisions hold more than one Keep.
    pub fn check_single_keep(&self) -> Result<(), Error> {
        if self.member_count >= 2 && self.keep_count > 1 {
            return Err(Error::InvariantViolation(format!(
                "group {} has {} copies marked Keep",
                self.group_id, self.keep_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decisions(pairs: &[(i64, ReviewAction)]) -> HashMap<i64, ReviewAction> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_gate_suppress_and_restore() {
        let mut gate = ReconcileGate::default();
        assert!(gate.is_active());
        let previous = gate.suppress();
        assert_eq!(gate.mode(), ReconcileMode::Suppressed);
        let nested = gate.suppress();
        assert_eq!(nested, ReconcileMode::Suppressed);
        gate.restore(nested);
        assert!(!gate.is_active());
        gate.restore(previous);
        assert!(gate.is_active());
    }

    #[test]
    fn test_group_review_status_boundaries() {
        let members = [1, 2, 3];
        let none = GroupReview::new(7, &members, &HashMap::new());
        assert_eq!(none.status, ReviewStatus::Unreviewed);

        let one = GroupReview::new(7, &members, &decisions(&[(2, ReviewAction::Skip)]));
        assert_eq!(one.status, ReviewStatus::Partial);

        let all = GroupReview::new(
            7,
            &members,
            &decisions(&[
                (1, ReviewAction::Keep),
                (2, ReviewAction::Delete),
                (3, ReviewAction::Skip),
            ]),
        );
        assert_eq!(all.status, ReviewStatus::Decided);
        assert!(all.check_single_keep().is_ok());
    }

    #[test]
    fn test_decisions_outside_group_are_ignored() {
        let review = GroupReview::new(1, &[1, 2], &decisions(&[(99, ReviewAction::Keep)]));
        assert_eq!(review.decided_count, 0);
        assert_eq!(review.status, ReviewStatus::Unreviewed);
    }

    #[test]
    fn test_double_keep_is_reported() {
        let review = GroupReview::new(
            4,
            &[1, 2],
            &decisions(&[(1, ReviewAction::Keep), (2, ReviewAction::Keep)]),
        );
        let err = review.check_single_keep().unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
    }
}
