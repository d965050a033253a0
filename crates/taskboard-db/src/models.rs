//! Database row types. These map directly to SQLite rows and stay distinct
//! from the taskboard-types API models so the DB layer owns its own shapes.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use taskboard_types::models::{Board, Status, Task, TaskStatus, User, UserToken};

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub tg_name: Option<String>,
    pub chat_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

pub struct BoardRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct TaskRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub board_id: i64,
    pub status: TaskStatus,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct StatusRow {
    pub id: i64,
    pub kind: String,
}

pub struct UserTokenRow {
    pub id: i64,
    pub user_id: i64,
    pub refresh_token: String,
}

/// One user as seen by the digest: the address may be missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestRecipient {
    pub user_id: i64,
    pub tg_name: Option<String>,
    pub chat_id: Option<i64>,
}

// Column order for the helpers below matches the SELECT lists in queries.rs,
// boards.rs and tasks.rs.

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        tg_name: row.get(3)?,
        chat_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub(crate) fn board_from_row(row: &Row<'_>) -> rusqlite::Result<BoardRow> {
    Ok(BoardRow {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

pub(crate) fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRow> {
    let status_id: i64 = row.get(4)?;
    let status = TaskStatus::try_from(status_id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Integer, Box::new(e)))?;

    Ok(TaskRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        board_id: row.get(3)?,
        status,
        user_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            tg_name: row.tg_name,
            chat_id: row.chat_id,
            created_at: row.created_at,
        }
    }
}

impl From<BoardRow> for Board {
    fn from(row: BoardRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            board_id: row.board_id,
            status_id: row.status,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<StatusRow> for Status {
    fn from(row: StatusRow) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
        }
    }
}

impl From<UserTokenRow> for UserToken {
    fn from(row: UserTokenRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            refresh_token: row.refresh_token,
        }
    }
}
