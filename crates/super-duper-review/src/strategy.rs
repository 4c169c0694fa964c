use crate::decision::ReviewAction;
use crate::error::Error;
use crate::storage::models::FileCopy;
use crate::suggestion::SuggestionEngine;
use crate::undo::DecisionDelta;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How an auto-select pass picks the copy to keep in each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSelectStrategy {
    /// Most recently modified copy.
    Newest,
    /// Copy with the shortest path string.
    ShortestPath,
    /// Whatever the suggestion engine recommends; groups without a suggestion are left alone.
    Suggested,
}

impl AutoSelectStrategy {
    pub const ALL: [AutoSelectStrategy; 3] = [
        AutoSelectStrategy::Newest,
        AutoSelectStrategy::ShortestPath,
        AutoSelectStrategy::Suggested,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AutoSelectStrategy::Newest => "newest",
            AutoSelectStrategy::ShortestPath => "shortest",
            AutoSelectStrategy::Suggested => "suggested",
        }
    }

    /// File id to keep, or `None` to leave the group untouched.
    pub fn pick_keep(self, copies: &[FileCopy], engine: &SuggestionEngine) -> Option<i64> {
        if copies.len() < 2 {
            return None;
        }
        match self {
            AutoSelectStrategy::Newest => copies
                .iter()
                .rev()
                .max_by_key(|c| c.last_modified)
                .map(|c| c.file_id),
            AutoSelectStrategy::ShortestPath => copies
                .iter()
                .min_by_key(|c| c.canonical_path.chars().count())
                .map(|c| c.file_id),
            AutoSelectStrategy::Suggested => engine.suggest(copies).map(|s| s.keep_id),
        }
    }

    /// Keep the picked copy and delete the rest, capturing each file's current
    /// decision. Files already at their target action are left out.
    pub fn plan_group(
        self,
        copies: &[FileCopy],
        current: &HashMap<i64, ReviewAction>,
        engine: &SuggestionEngine,
    ) -> Vec<DecisionDelta> {
        let Some(keep_id) = self.pick_keep(copies, engine) else {
            return Vec::new();
        };
        copies
            .iter()
            .map(|c| DecisionDelta {
                file_id: c.file_id,
                group_id: c.group_id,
                new_action: if c.file_id == keep_id {
                    ReviewAction::Keep
                } else {
                    ReviewAction::Delete
                },
                previous_action: current.get(&c.file_id).copied(),
            })
            .filter(|d| d.previous_action != Some(d.new_action))
            .collect()
    }
}

impl fmt::Display for AutoSelectStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AutoSelectStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AutoSelectStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownStrategy(s.to_string()))
    }
}
