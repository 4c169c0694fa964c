use colored::*;
use super_duper_review::decision::{DecisionChange, ReviewAction};
use super_duper_review::undo::HistoryState;
use super_duper_review::ReviewObserver;
use tracing::{debug, warn};

/// Prints decision changes as they land. Quiet mode only logs them, for bulk one-shot commands.
pub struct CliObserver {
    verbose: bool,
}

impl CliObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ReviewObserver for CliObserver {
    fn on_decision_changed(&self, change: &DecisionChange) {
        if !self.verbose {
            debug!("File {} set to {}", change.file_id, change.action);
            return;
        }
        let style = change.action.style();
        let previous = ReviewAction::style_of(change.previous);
        println!(
            "  {} file {}: {} -> {}{}",
            style.glyph.color(style.color),
            change.file_id,
            previous.label.color(previous.color),
            style.label.color(style.color),
            if change.forced {
                " (only one copy can be kept)".dimmed().to_string()
            } else {
                String::new()
            }
        );
    }

    fn on_stack_changed(&self, state: &HistoryState) {
        debug!(
            "History: {} undo, {} redo",
            state.undo_len, state.redo_len
        );
    }

    fn on_history_truncated(&self, evicted: &str) {
        warn!("Undo history is full, '{}' can no longer be undone", evicted);
    }
}
