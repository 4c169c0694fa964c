use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user's disposition for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Keep = 0,
    Delete = 1,
    Skip = 2,
}

/// Review progress of one duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Unreviewed = 0,
    Partial = 1,
    Decided = 2,
}

/// How a decision or status is presented: label, glyph and a colour name.
#[derive(Debug, PartialEq, Eq)]
pub struct DisplayStyle {
    pub label: &'static str,
    pub glyph: &'static str,
    pub color: &'static str,
}

static ACTION_STYLES: [DisplayStyle; 3] = [
    DisplayStyle { label: "Keep", glyph: "✓", color: "green" },
    DisplayStyle { label: "Delete", glyph: "✗", color: "red" },
    DisplayStyle { label: "Skip", glyph: "»", color: "yellow" },
];

static UNSET_STYLE: DisplayStyle = DisplayStyle {
    label: "Unset",
    glyph: "·",
    color: "white",
};

static STATUS_STYLES: [DisplayStyle; 3] = [
    DisplayStyle { label: "Unreviewed", glyph: "○", color: "yellow" },
    DisplayStyle { label: "Partial", glyph: "◐", color: "blue" },
    DisplayStyle { label: "Decided", glyph: "●", color: "green" },
];

impl ReviewAction {
    pub const ALL: [ReviewAction; 3] = [ReviewAction::Keep, ReviewAction::Delete, ReviewAction::Skip];

    /// Storage representation (`review_decisions.action`).
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewAction::Keep => "keep",
            ReviewAction::Delete => "delete",
            ReviewAction::Skip => "skip",
        }
    }

    pub fn style(self) -> &'static DisplayStyle {
        &ACTION_STYLES[self as usize]
    }

    /// Style for an optional decision; `None` renders as unset.
    pub fn style_of(action: Option<ReviewAction>) -> &'static DisplayStyle {
        action.map(ReviewAction::style).unwrap_or(&UNSET_STYLE)
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.style().label)
    }
}

impl FromStr for ReviewAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReviewAction::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownAction(s.to_string()))
    }
}

impl ReviewStatus {
    /// `Unreviewed` if nothing is decided, `Decided` once every member is, `Partial` otherwise.
    pub fn from_counts(decided: i64, total: i64) -> Self {
        if decided <= 0 {
            ReviewStatus::Unreviewed
        } else if decided >= total {
            ReviewStatus::Decided
        } else {
            ReviewStatus::Partial
        }
    }

    pub fn style(self) -> &'static DisplayStyle {
        &STATUS_STYLES[self as usize]
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.style().label)
    }
}

/// A decision transition, as reported to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionChange {
    pub file_id: i64,
    pub group_id: i64,
    pub action: ReviewAction,
    pub previous: Option<ReviewAction>,
    /// Set when the change was forced by single-keep enforcement rather than requested.
    pub forced: bool,
}
