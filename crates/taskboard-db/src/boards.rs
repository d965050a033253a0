use crate::Database;
use crate::models::{BoardRow, board_from_row};
use crate::queries::OptionalExt;
use anyhow::Result;
use chrono::{DateTime, Utc};

const BOARD_COLUMNS: &str = "id, name, created_at, updated_at";

impl Database {
    /// Inserts the board and links its creator as the first member.
    pub fn create_board(&self, name: &str, creator_id: i64, now: DateTime<Utc>) -> Result<BoardRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO boards (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
                rusqlite::params![name, now],
            )?;
            let id = tx.last_insert_rowid();
            tx.execute(
                "INSERT OR IGNORE INTO boards_users (user_id, board_id) VALUES (?1, ?2)",
                rusqlite::params![creator_id, id],
            )?;
            tx.commit()?;

            Ok(BoardRow {
                id,
                name: name.to_string(),
                created_at: now,
                updated_at: now,
            })
        })
    }

    pub fn list_boards(&self) -> Result<Vec<BoardRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {BOARD_COLUMNS} FROM boards ORDER BY created_at, id"))?;
            let rows = stmt
                .query_map([], board_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_board(&self, id: i64) -> Result<Option<BoardRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = ?1"),
                [id],
                board_from_row,
            )
            .optional()
        })
    }

    pub fn board_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row("SELECT EXISTS(SELECT 1 FROM boards WHERE id = ?1)", [id], |row| {
                row.get(0)
            })?;
            Ok(exists)
        })
    }

    /// Renames the board. `None` if it does not exist.
    pub fn update_board(&self, id: i64, name: &str, now: DateTime<Utc>) -> Result<Option<BoardRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE boards SET name = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![name, now, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            conn.query_row(
                &format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = ?1"),
                [id],
                board_from_row,
            )
            .optional()
        })
    }

    /// Membership rows go with the board (ON DELETE CASCADE).
    pub fn delete_board(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM boards WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    pub fn count_tasks_on_board(&self, board_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM tasks WHERE board_id = ?1",
                [board_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Links a user to a board. Linking twice is a no-op.
    pub fn add_board_member(&self, board_id: i64, user_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO boards_users (user_id, board_id) VALUES (?1, ?2)",
                rusqlite::params![user_id, board_id],
            )?;
            Ok(())
        })
    }

    pub fn board_members(&self, board_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT user_id FROM boards_users WHERE board_id = ?1 ORDER BY user_id")?;
            let rows = stmt
                .query_map([board_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
