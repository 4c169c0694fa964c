//! Heuristic keep/delete suggestions for a duplicate group.
//!
//! Rules run in a fixed order and the first one that fires wins, so every
//! suggestion carries exactly one explainable reason.

use crate::config::DEFAULT_RECENCY_THRESHOLD_DAYS;
use crate::storage::models::FileCopy;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

pub const LABEL_BACKUP_ROOT: &str = "Backup root";
pub const LABEL_ACTIVE_WORKSPACE: &str = "Active workspace";
pub const LABEL_MOST_RECENT: &str = "Most recent";
pub const LABEL_SHORTEST_PATH: &str = "Shortest path";
pub const LABEL_ARCHIVE: &str = "Archive";

const SECONDS_PER_DAY: i64 = 86_400;

lazy_static! {
    static ref BACKUP_PATH: Regex =
        Regex::new(r"(?i)(backup|oldlaptop|old_laptop|old-laptop|archive)").unwrap();
    static ref YEAR_SEGMENT: Regex = Regex::new(r"[\\/]\d{4}[\\/]").unwrap();
    static ref ACTIVE_WORKSPACE: Regex = Regex::new(
        r"(?i)[\\/](Users|home)[\\/][^\\/]+[\\/](Documents|Desktop|Projects|Source|dev|code)[\\/]"
    )
    .unwrap();
}

/// A recommended keep/delete pair with its justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub keep_id: i64,
    pub delete_id: i64,
    pub reason: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    recency_threshold_secs: i64,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_RECENCY_THRESHOLD_DAYS)
    }
}

impl SuggestionEngine {
    pub fn new(recency_threshold_days: i64) -> Self {
        Self {
            recency_threshold_secs: recency_threshold_days.max(0) * SECONDS_PER_DAY,
        }
    }

    /// Suggest which copy to keep. Returns `None` for fewer than two copies or when no rule fires.
    pub fn suggest(&self, copies: &[FileCopy]) -> Option<Suggestion> {
        if copies.len() < 2 {
            return None;
        }

        backup_rule(copies)
            .or_else(|| workspace_rule(copies))
            .or_else(|| self.recency_rule(copies))
            .or_else(|| shortest_path_rule(copies))
    }

    /// Annotation for a single card, independent of any pairwise suggestion.
    pub fn classify_label(&self, path: &str) -> &'static str {
        if BACKUP_PATH.is_match(path) {
            LABEL_BACKUP_ROOT
        } else if is_active_workspace(path) {
            LABEL_ACTIVE_WORKSPACE
        } else if YEAR_SEGMENT.is_match(path) {
            LABEL_ARCHIVE
        } else {
            ""
        }
    }

    fn recency_rule(&self, copies: &[FileCopy]) -> Option<Suggestion> {
        let mut ordered: Vec<&FileCopy> = copies.iter().collect();
        ordered.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        let newest = ordered.first()?;
        let oldest = ordered.last()?;
        // 0 is what the scanner records for an unreadable timestamp.
        if newest.last_modified <= 0 || oldest.last_modified <= 0 {
            return None;
        }
        if newest.last_modified - oldest.last_modified <= self.recency_threshold_secs {
            return None;
        }
        Some(Suggestion {
            keep_id: newest.file_id,
            delete_id: oldest.file_id,
            reason: "keeping the more recently modified copy",
            label: LABEL_MOST_RECENT,
        })
    }
}

pub fn is_backup_path(path: &str) -> bool {
    BACKUP_PATH.is_match(path) || YEAR_SEGMENT.is_match(path)
}

pub fn is_active_workspace(path: &str) -> bool {
    ACTIVE_WORKSPACE.is_match(path)
}

fn backup_rule(copies: &[FileCopy]) -> Option<Suggestion> {
    let backup = copies.iter().find(|c| is_backup_path(&c.canonical_path))?;
    let primary = copies.iter().find(|c| !is_backup_path(&c.canonical_path))?;
    Some(Suggestion {
        keep_id: primary.file_id,
        delete_id: backup.file_id,
        reason: "one copy is in a backup location",
        label: LABEL_BACKUP_ROOT,
    })
}

fn workspace_rule(copies: &[FileCopy]) -> Option<Suggestion> {
    let active = copies
        .iter()
        .find(|c| is_active_workspace(&c.canonical_path))?;
    let inactive = copies
        .iter()
        .find(|c| !is_active_workspace(&c.canonical_path))?;
    Some(Suggestion {
        keep_id: active.file_id,
        delete_id: inactive.file_id,
        reason: "one copy is in an active workspace",
        label: LABEL_ACTIVE_WORKSPACE,
    })
}

fn shortest_path_rule(copies: &[FileCopy]) -> Option<Suggestion> {
    let depth = |c: &&FileCopy| separator_count(&c.canonical_path);
    let shortest = copies.iter().min_by_key(depth)?;
    let longest = copies.iter().rev().max_by_key(depth)?;
    if separator_count(&shortest.canonical_path) == separator_count(&longest.canonical_path) {
        return None;
    }
    Some(Suggestion {
        keep_id: shortest.file_id,
        delete_id: longest.file_id,
        reason: "keeping the copy with the shorter (more canonical) path",
        label: LABEL_SHORTEST_PATH,
    })
}

fn separator_count(path: &str) -> usize {
    path.chars().filter(|c| *c == '/' || *c == '\\').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = SECONDS_PER_DAY;
    const BASE: i64 = 1_700_000_000;

    fn copy(id: i64, path: &str, modified: i64) -> FileCopy {
        FileCopy {
            file_id: id,
            group_id: 1,
            canonical_path: path.to_string(),
            file_name: path.rsplit(['/', '\\']).next().unwrap_or(path).to_string(),
            drive_letter: String::new(),
            file_size: 1024,
            last_modified: modified,
        }
    }

    #[test]
    fn test_fewer_than_two_copies_has_no_suggestion() {
        let engine = SuggestionEngine::default();
        assert_eq!(engine.suggest(&[]), None);
        assert_eq!(engine.suggest(&[copy(1, "/a/b.txt", BASE)]), None);
    }

    #[test]
    fn test_backup_rule_beats_recency_and_path_length() {
        let engine = SuggestionEngine::default();
        let copies = vec![
            copy(1, "/mnt/Archive/2019/report.docx", BASE + 30 * DAY),
            copy(2, "/Users/gary/Documents/Projects/report.docx", BASE),
        ];
        let s = engine.suggest(&copies).unwrap();
        assert_eq!(s.keep_id, 2);
        assert_eq!(s.delete_id, 1);
        assert_eq!(s.label, "Backup root");
        assert_eq!(s.reason, "one copy is in a backup location");
    }

    #[test]
    fn test_year_segment_counts_as_backup() {
        let engine = SuggestionEngine::default();
        let copies = vec![
            copy(1, "D:\\Photos\\2021\\img.jpg", BASE),
            copy(2, "D:\\Photos\\img.jpg", BASE),
        ];
        let s = engine.suggest(&copies).unwrap();
        assert_eq!(s.keep_id, 2);
        assert_eq!(s.label, LABEL_BACKUP_ROOT);
    }

    #[test]
    fn test_all_backup_copies_fall_through() {
        let engine = SuggestionEngine::default();
        let copies = vec![
            copy(1, "/backup/a/file.txt", BASE),
            copy(2, "/backup/file.txt", BASE),
        ];
        let s = engine.suggest(&copies).unwrap();
        assert_eq!(s.label, LABEL_SHORTEST_PATH);
        assert_eq!(s.keep_id, 2);
    }

    #[test]
    fn test_active_workspace_rule() {
        let engine = SuggestionEngine::default();
        let copies = vec![
            copy(1, "/tmp/scratch/notes.md", BASE),
            copy(2, "/home/ana/code/notes.md", BASE),
        ];
        let s = engine.suggest(&copies).unwrap();
        assert_eq!(s.keep_id, 2);
        assert_eq!(s.delete_id, 1);
        assert_eq!(s.label, "Active workspace");
    }

    #[test]
    fn test_recency_rule_keeps_newer_file() {
        let engine = SuggestionEngine::default();
        let copies = vec![
            copy(1, "/data/one/photo.jpg", BASE),
            copy(2, "/data/two/photo.jpg", BASE + 10 * DAY),
        ];
        let s = engine.suggest(&copies).unwrap();
        assert_eq!(s.keep_id, 2);
        assert_eq!(s.delete_id, 1);
        assert_eq!(s.label, "Most recent");
    }

    #[test]
    fn test_recency_needs_more_than_threshold() {
        let engine = SuggestionEngine::default();
        let copies = vec![
            copy(1, "/data/one/photo.jpg", BASE),
            copy(2, "/data/two/photo.jpg", BASE + 7 * DAY),
        ];
        assert_eq!(engine.suggest(&copies), None);
    }

    #[test]
    fn test_unknown_timestamps_skip_recency() {
        let engine = SuggestionEngine::default();
        let copies = vec![
            copy(1, "/data/one/photo.jpg", 0),
            copy(2, "/data/two/photo.jpg", BASE),
        ];
        assert_eq!(engine.suggest(&copies), None);
    }

    #[test]
    fn test_shortest_path_rule() {
        let engine = SuggestionEngine::default();
        let copies = vec![
            copy(1, "/data/nested/deeper/song.mp3", BASE),
            copy(2, "/data/song.mp3", BASE),
            copy(3, "/data/nested/song.mp3", BASE),
        ];
        let s = engine.suggest(&copies).unwrap();
        assert_eq!(s.keep_id, 2);
        assert_eq!(s.delete_id, 1);
        assert_eq!(s.label, "Shortest path");
    }

    #[test]
    fn test_custom_recency_threshold() {
        let engine = SuggestionEngine::new(30);
        let copies = vec![
            copy(1, "/data/one/photo.jpg", BASE),
            copy(2, "/data/two/photo.jpg", BASE + 10 * DAY),
        ];
        assert_eq!(engine.suggest(&copies), None);
    }

    #[test]
    fn test_classify_label_priority() {
        let engine = SuggestionEngine::default();
        assert_eq!(engine.classify_label("/Volumes/Backup/Users/a/Documents/x"), "Backup root");
        assert_eq!(engine.classify_label("C:\\Users\\a\\Desktop\\x.txt"), "Active workspace");
        assert_eq!(engine.classify_label("/photos/2019/x.jpg"), "Archive");
        assert_eq!(engine.classify_label("/photos/x2019/x.jpg"), "");
        assert_eq!(engine.classify_label("/tmp/x.txt"), "");
    }
}
