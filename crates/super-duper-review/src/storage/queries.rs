use super::models::*;
use super::sqlite::Database;
use crate::decision::{ReviewAction, ReviewStatus};
use rusqlite::{params, OptionalExtension, Result};
use std::collections::HashMap;
use tracing::debug;

impl Database {
    // ── Scan Session ─────────────────────────────────────────────

    pub fn create_scan_session(&self, root_paths: &[String]) -> Result<i64> {
        let mut sorted = root_paths.to_vec();
        sorted.sort();
        let paths_json = serde_json::to_string(&sorted).unwrap_or_default();
        let now = chrono::Utc::now().to_rfc3339();
        self.connection().execute(
            "INSERT INTO scan_session (started_at, status, root_paths) VALUES (?1, 'running', ?2)",
            params![now, paths_json],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn complete_scan_session(
        &self,
        session_id: i64,
        files_scanned: i64,
        total_bytes: i64,
    ) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.connection().execute(
            "UPDATE scan_session SET completed_at = ?1, status = 'completed', \
             files_scanned = ?2, total_bytes = ?3 WHERE id = ?4",
            params![now, files_scanned, total_bytes, session_id],
        )?;
        Ok(())
    }

    pub fn get_latest_session_id(&self) -> Result<Option<i64>> {
        self.connection()
            .query_row(
                "SELECT id FROM scan_session WHERE status = 'completed' ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
    }

    // ── Scan Facts ───────────────────────────────────────────────

    pub fn insert_scanned_files(&self, files: &[ScannedFile]) -> Result<usize> {
        let tx = self.connection().unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO scanned_file \
                 (canonical_path, file_name, parent_dir, drive_letter, file_size, \
                  last_modified, content_hash, last_seen_session_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(canonical_path) DO UPDATE SET \
                     file_name = excluded.file_name, \
                     parent_dir = excluded.parent_dir, \
                     drive_letter = excluded.drive_letter, \
                     file_size = excluded.file_size, \
                     last_modified = excluded.last_modified, \
                     content_hash = excluded.content_hash, \
                     last_seen_session_id = excluded.last_seen_session_id",
            )?;
            for file in files {
                count += stmt.execute(params![
                    file.canonical_path,
                    file.file_name,
                    file.parent_dir,
                    file.drive_letter,
                    file.file_size,
                    file.last_modified,
                    file.content_hash,
                    file.last_seen_session_id,
                ])?;
            }
        }
        tx.commit()?;
        debug!("Upserted {} scanned files", count);
        Ok(count)
    }

    /// Insert duplicate groups for a session. Each entry is (content_hash, file_size, Vec<canonical_path>).
    pub fn insert_duplicate_groups(
        &self,
        session_id: i64,
        content_hash_groups: &[(i64, i64, Vec<String>)],
    ) -> Result<Vec<i64>> {
        let tx = self.connection().unchecked_transaction()?;
        let mut group_ids = Vec::with_capacity(content_hash_groups.len());
        {
            let mut group_stmt = tx.prepare_cached(
                "INSERT INTO duplicate_group \
                 (session_id, content_hash, file_size, file_count, wasted_bytes) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let mut member_stmt = tx.prepare_cached(
                "INSERT INTO duplicate_group_member (group_id, file_id) \
                 SELECT ?1, id FROM scanned_file WHERE canonical_path = ?2",
            )?;

            for (content_hash, file_size, paths) in content_hash_groups {
                let file_count = paths.len() as i64;
                let wasted_bytes = file_size * (file_count - 1).max(0);
                group_stmt.execute(params![
                    session_id,
                    content_hash,
                    file_size,
                    file_count,
                    wasted_bytes
                ])?;
                let group_id = tx.last_insert_rowid();
                for path in paths {
                    member_stmt.execute(params![group_id, path])?;
                }
                group_ids.push(group_id);
            }
        }
        tx.commit()?;
        debug!(
            "Inserted {} duplicate groups for session {}",
            group_ids.len(),
            session_id
        );
        Ok(group_ids)
    }

    pub fn get_duplicate_groups(
        &self,
        session_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<DuplicateGroup>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, session_id, content_hash, file_size, file_count, wasted_bytes \
             FROM duplicate_group WHERE session_id = ?1 \
             ORDER BY wasted_bytes DESC, id ASC LIMIT ?2 OFFSET ?3",
        )?;
        let groups = stmt
            .query_map(params![session_id, limit, offset], |row| {
                Ok(DuplicateGroup {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    content_hash: row.get(2)?,
                    file_size: row.get(3)?,
                    file_count: row.get(4)?,
                    wasted_bytes: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(groups)
    }

    pub fn get_files_in_group(&self, group_id: i64) -> Result<Vec<FileCopy>> {
        let mut stmt = self.connection().prepare(
            "SELECT sf.id, dgm.group_id, sf.canonical_path, sf.file_name, sf.drive_letter, \
                    sf.file_size, sf.last_modified \
             FROM scanned_file sf \
             JOIN duplicate_group_member dgm ON sf.id = dgm.file_id \
             WHERE dgm.group_id = ?1 \
             ORDER BY sf.id",
        )?;
        let files = stmt
            .query_map(params![group_id], |row| {
                Ok(FileCopy {
                    file_id: row.get(0)?,
                    group_id: row.get(1)?,
                    canonical_path: row.get(2)?,
                    file_name: row.get(3)?,
                    drive_letter: row.get(4)?,
                    file_size: row.get(5)?,
                    last_modified: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(files)
    }

    /// Duplicate files of a session whose parent directory is `directory` or lies beneath it.
    pub fn get_files_under_directory(
        &self,
        directory: &str,
        session_id: i64,
    ) -> Result<Vec<DirectoryMember>> {
        let dir = directory.trim_end_matches(['/', '\\']);
        let escaped = escape_like(dir);
        let mut stmt = self.connection().prepare(
            "SELECT sf.id, dgm.group_id \
             FROM scanned_file sf \
             JOIN duplicate_group_member dgm ON dgm.file_id = sf.id \
             JOIN duplicate_group dg ON dg.id = dgm.group_id \
             WHERE dg.session_id = ?1 \
               AND (sf.parent_dir = ?2 \
                    OR sf.parent_dir LIKE ?3 ESCAPE '!' \
                    OR sf.parent_dir LIKE ?4 ESCAPE '!') \
             ORDER BY sf.parent_dir, sf.file_name",
        )?;
        let members = stmt
            .query_map(
                params![
                    session_id,
                    dir,
                    format!("{}/%", escaped),
                    format!("{}\\%", escaped)
                ],
                |row| {
                    Ok(DirectoryMember {
                        file_id: row.get(0)?,
                        group_id: row.get(1)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>>>()?;
        Ok(members)
    }

    // ── Review Decisions ─────────────────────────────────────────

    /// Insert or replace the decision for a file. Last writer wins.
    pub fn upsert_decision(
        &self,
        file_id: i64,
        group_id: i64,
        action: ReviewAction,
        session_id: Option<i64>,
    ) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.connection().execute(
            "INSERT INTO review_decisions (file_id, group_id, action, decided_at, session_id) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(file_id) DO UPDATE SET \
                 action = excluded.action, \
                 decided_at = excluded.decided_at, \
                 session_id = excluded.session_id",
            params![file_id, group_id, action.as_str(), now, session_id],
        )?;
        debug!("Decision for file {} set to {}", file_id, action);
        Ok(())
    }

    pub fn get_decision(&self, file_id: i64) -> Result<Option<ReviewAction>> {
        let action: Option<String> = self
            .connection()
            .query_row(
                "SELECT action FROM review_decisions WHERE file_id = ?1",
                params![file_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(action.and_then(|s| s.parse().ok()))
    }

    pub fn get_decision_record(&self, file_id: i64) -> Result<Option<ReviewDecision>> {
        let row: Option<(i64, i64, String, String, Option<i64>)> = self
            .connection()
            .query_row(
                "SELECT file_id, group_id, action, decided_at, session_id \
                 FROM review_decisions WHERE file_id = ?1",
                params![file_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()?;
        Ok(row.and_then(|(file_id, group_id, action, decided_at, session_id)| {
            action.parse().ok().map(|action| ReviewDecision {
                file_id,
                group_id,
                action,
                decided_at,
                session_id,
            })
        }))
    }

    /// Current decisions of every member of a group, keyed by file id.
    pub fn get_group_decisions(&self, group_id: i64) -> Result<HashMap<i64, ReviewAction>> {
        let mut stmt = self.connection().prepare(
            "SELECT rd.file_id, rd.action \
             FROM duplicate_group_member dgm \
             JOIN review_decisions rd ON rd.file_id = dgm.file_id \
             WHERE dgm.group_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![group_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(rows
            .into_iter()
            .filter_map(|(file_id, action)| action.parse().ok().map(|a| (file_id, a)))
            .collect())
    }

    pub fn get_group_status(&self, group_id: i64) -> Result<ReviewStatus> {
        let (total, reviewed): (i64, i64) = self.connection().query_row(
            "SELECT COUNT(dgm.file_id), COUNT(rd.file_id) \
             FROM duplicate_group_member dgm \
             LEFT JOIN review_decisions rd ON rd.file_id = dgm.file_id \
             WHERE dgm.group_id = ?1",
            params![group_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(ReviewStatus::from_counts(reviewed, total))
    }

    pub fn get_session_progress(&self, session_id: i64) -> Result<ReviewProgress> {
        self.connection().query_row(
            "SELECT COUNT(DISTINCT rd.file_id), COUNT(DISTINCT dgm.file_id) \
             FROM duplicate_group dg \
             JOIN duplicate_group_member dgm ON dgm.group_id = dg.id \
             LEFT JOIN review_decisions rd ON rd.file_id = dgm.file_id \
             WHERE dg.session_id = ?1",
            params![session_id],
            |row| {
                Ok(ReviewProgress {
                    reviewed: row.get(0)?,
                    total: row.get(1)?,
                })
            },
        )
    }

    // ── Deletion Queue ───────────────────────────────────────────

    pub fn get_deletion_queue(&self) -> Result<Vec<DeletionQueueEntry>> {
        let mut stmt = self.connection().prepare(
            "SELECT rd.file_id, rd.group_id, sf.canonical_path, sf.file_name, sf.parent_dir, \
                    sf.drive_letter, sf.file_size, sf.content_hash, \
                    ( \
                        SELECT sf2.canonical_path \
                        FROM duplicate_group_member dgm2 \
                        JOIN scanned_file sf2 ON sf2.id = dgm2.file_id \
                        LEFT JOIN review_decisions rd2 ON rd2.file_id = dgm2.file_id \
                        WHERE dgm2.group_id = rd.group_id \
                          AND dgm2.file_id != rd.file_id \
                          AND (rd2.action = 'keep' OR rd2.action IS NULL) \
                        ORDER BY (rd2.action = 'keep') DESC, sf2.id \
                        LIMIT 1 \
                    ) AS retained_copy_path \
             FROM review_decisions rd \
             JOIN scanned_file sf ON sf.id = rd.file_id \
             WHERE rd.action = 'delete' \
             ORDER BY sf.drive_letter, sf.parent_dir, sf.file_name",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(DeletionQueueEntry {
                    file_id: row.get(0)?,
                    group_id: row.get(1)?,
                    canonical_path: row.get(2)?,
                    file_name: row.get(3)?,
                    parent_dir: row.get(4)?,
                    drive_letter: row.get(5)?,
                    file_size: row.get(6)?,
                    content_hash: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
                    retained_copy_path: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn get_deletion_queue_count(&self) -> Result<i64> {
        self.connection().query_row(
            "SELECT COUNT(*) FROM review_decisions WHERE action = 'delete'",
            [],
            |row| row.get(0),
        )
    }

    /// (file_count, total_bytes) of the deletion queue.
    pub fn get_deletion_queue_summary(&self) -> Result<(i64, i64)> {
        self.connection().query_row(
            "SELECT COUNT(*), COALESCE(SUM(sf.file_size), 0) \
             FROM review_decisions rd \
             JOIN scanned_file sf ON rd.file_id = sf.id \
             WHERE rd.action = 'delete'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
    }

    pub fn clear_decisions(&self) -> Result<usize> {
        let removed = self
            .connection()
            .execute("DELETE FROM review_decisions", [])?;
        debug!("Cleared {} review decisions", removed);
        Ok(removed)
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '!' | '%' | '_') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped
}
