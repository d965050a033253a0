use crate::Database;
use crate::models::{TaskRow, task_from_row};
use crate::queries::OptionalExt;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use taskboard_types::models::TaskStatus;

const TASK_COLUMNS: &str =
    "id, title, description, board_id, status_id, user_id, created_at, updated_at";

/// Column values for insert and full replace.
pub struct TaskFields<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub board_id: i64,
    pub status: TaskStatus,
    pub user_id: i64,
}

impl Database {
    pub fn insert_task(&self, fields: &TaskFields<'_>, now: DateTime<Utc>) -> Result<TaskRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO tasks (title, description, board_id, status_id, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![
                    fields.title,
                    fields.description,
                    fields.board_id,
                    fields.status.id(),
                    fields.user_id,
                    now
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_task(conn, id)?.ok_or_else(|| anyhow::anyhow!("Task {} vanished after insert", id))
        })
    }

    pub fn get_task(&self, id: i64) -> Result<Option<TaskRow>> {
        self.with_conn(|conn| query_task(conn, id))
    }

    pub fn list_tasks(&self) -> Result<Vec<TaskRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY updated_at, id"))?;
            let rows = stmt
                .query_map([], task_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Full replace. `None` if the task does not exist.
    pub fn replace_task(
        &self,
        id: i64,
        fields: &TaskFields<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<TaskRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE tasks
                 SET title = ?1, description = ?2, board_id = ?3, status_id = ?4, user_id = ?5, updated_at = ?6
                 WHERE id = ?7",
                rusqlite::params![
                    fields.title,
                    fields.description,
                    fields.board_id,
                    fields.status.id(),
                    fields.user_id,
                    now,
                    id
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_task(conn, id)
        })
    }

    pub fn delete_task(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Digest --

    /// A user's tasks in one status, oldest update first, ties by id.
    pub fn tasks_for_user(&self, user_id: i64, status: TaskStatus) -> Result<Vec<TaskRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks
                 WHERE user_id = ?1 AND status_id = ?2
                 ORDER BY updated_at ASC, id ASC"
            ))?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, status.id()], task_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Bulk rollover of every reported task (2 -> 3). Returns the row count.
    pub fn archive_reported(&self) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let archived = conn.execute(
                "UPDATE tasks SET status_id = ?1 WHERE status_id = ?2",
                rusqlite::params![
                    TaskStatus::Archived.id(),
                    TaskStatus::CompletedPendingReport.id()
                ],
            )?;
            Ok(archived)
        })
    }
}

fn query_task(conn: &Connection, id: i64) -> Result<Option<TaskRow>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        [id],
        task_from_row,
    )
    .optional()
}
