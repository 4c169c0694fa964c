use crate::decision::DecisionChange;
use crate::undo::HistoryState;

/// Receives change events from the review engine.
///
/// A presentation layer implements this to refresh cards, the status bar and
/// undo/redo buttons. All methods have default no-op implementations.
pub trait ReviewObserver: Send + Sync {
    fn on_decision_changed(&self, _change: &DecisionChange) {}
    fn on_stack_changed(&self, _state: &HistoryState) {}
    /// The oldest undo entry was dropped to stay within capacity.
    fn on_history_truncated(&self, _evicted: &str) {}
}

/// No-op observer for headless use.
pub struct SilentObserver;

impl ReviewObserver for SilentObserver {}
