use crate::Database;
use crate::models::{DigestRecipient, StatusRow, UserRow, UserTokenRow, user_from_row};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

const USER_COLUMNS: &str = "id, username, password_hash, tg_name, chat_id, created_at";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        tg_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash, tg_name, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![username, password_hash, tg_name, now],
            )?;
            let id = conn.last_insert_rowid();
            query_user(conn, "id = ?1", id)?
                .ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", id))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_tg_name(&self, tg_name: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "tg_name = ?1", tg_name))
    }

    /// Messaging handle lookup: `tg_name` first, then `username`.
    pub fn find_user_by_handle(&self, handle: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| match query_user(conn, "tg_name = ?1", handle)? {
            Some(row) => Ok(Some(row)),
            None => query_user(conn, "username = ?1", handle),
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    pub fn user_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)", [id], |row| {
                row.get(0)
            })?;
            Ok(exists)
        })
    }

    /// Stores the notification address. Writing the same value twice is a no-op.
    pub fn set_chat_id(&self, user_id: i64, chat_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET chat_id = ?1 WHERE id = ?2",
                rusqlite::params![chat_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// `None` when the user is missing or has never linked a chat.
    pub fn chat_id_for_user(&self, user_id: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let chat_id: Option<Option<i64>> = conn
                .query_row("SELECT chat_id FROM users WHERE id = ?1", [user_id], |row| row.get(0))
                .optional()?;
            Ok(chat_id.flatten())
        })
    }

    /// Every user, linked or not, in id order.
    pub fn digest_recipients(&self) -> Result<Vec<DigestRecipient>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, tg_name, chat_id FROM users ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(DigestRecipient {
                        user_id: row.get(0)?,
                        tg_name: row.get(1)?,
                        chat_id: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Refresh tokens --

    /// One row per user; the latest login wins.
    pub fn upsert_refresh_token(&self, user_id: i64, refresh_token: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO user_token (user_id, refresh_token) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET refresh_token = excluded.refresh_token",
                rusqlite::params![user_id, refresh_token],
            )?;
            Ok(())
        })
    }

    pub fn get_refresh_token(&self, user_id: i64) -> Result<Option<UserTokenRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, refresh_token FROM user_token WHERE user_id = ?1",
                    [user_id],
                    |row| {
                        Ok(UserTokenRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            refresh_token: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_refresh_token(&self, user_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM user_token WHERE user_id = ?1", [user_id])?;
            Ok(deleted > 0)
        })
    }

    // -- Statuses --

    pub fn create_status(&self, kind: &str) -> Result<StatusRow> {
        self.with_conn_mut(|conn| {
            conn.execute("INSERT INTO statuses (type) VALUES (?1)", [kind])?;
            Ok(StatusRow {
                id: conn.last_insert_rowid(),
                kind: kind.to_string(),
            })
        })
    }

    pub fn list_statuses(&self) -> Result<Vec<StatusRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, type FROM statuses ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(StatusRow {
                        id: row.get(0)?,
                        kind: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_status(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM statuses WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, filter: &str, param: P) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}");
    let row = conn.query_row(&sql, [param], user_from_row).optional()?;
    Ok(row)
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn duplicate_username_is_a_constraint_violation() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "hash", None, at(0)).unwrap();

        let err = db.create_user("alice", "hash", None, at(1)).unwrap_err();
        assert!(crate::is_constraint_violation(&err));
        assert!(!crate::is_constraint_violation(&anyhow::anyhow!("disk full")));
    }

    #[test]
    fn user_lookups_by_each_key() {
        let db = Database::open_in_memory().unwrap();
        let alice = db.create_user("alice", "hash", Some("alice_tg"), at(0)).unwrap();

        assert_eq!(alice.username, "alice");
        assert_eq!(alice.chat_id, None);
        assert_eq!(db.get_user_by_username("alice").unwrap().unwrap().id, alice.id);
        assert_eq!(db.get_user_by_tg_name("alice_tg").unwrap().unwrap().id, alice.id);
        assert_eq!(db.get_user_by_id(alice.id).unwrap().unwrap().created_at, at(0));
        assert!(db.get_user_by_username("bob").unwrap().is_none());
        assert_eq!(db.find_user_by_handle("alice_tg").unwrap().unwrap().id, alice.id);
        assert_eq!(db.find_user_by_handle("alice").unwrap().unwrap().id, alice.id);
        assert!(db.find_user_by_handle("bob").unwrap().is_none());
        assert!(db.user_exists(alice.id).unwrap());
        assert!(!db.user_exists(alice.id + 1).unwrap());
    }

    #[test]
    fn duplicate_username_is_rejected_by_schema() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "hash", None, at(0)).unwrap();
        assert!(db.create_user("alice", "other", None, at(1)).is_err());
    }

    #[test]
    fn chat_id_link_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("alice", "hash", None, at(0)).unwrap();

        assert_eq!(db.chat_id_for_user(user.id).unwrap(), None);
        assert!(db.set_chat_id(user.id, 42).unwrap());
        assert!(db.set_chat_id(user.id, 42).unwrap());
        assert_eq!(db.chat_id_for_user(user.id).unwrap(), Some(42));
        assert_eq!(db.chat_id_for_user(999).unwrap(), None);
    }

    #[test]
    fn refresh_token_upsert_keeps_one_row() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("alice", "hash", None, at(0)).unwrap();

        db.upsert_refresh_token(user.id, "first").unwrap();
        db.upsert_refresh_token(user.id, "second").unwrap();
        assert_eq!(db.get_refresh_token(user.id).unwrap().unwrap().refresh_token, "second");

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM user_token", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 1);

        assert!(db.delete_refresh_token(user.id).unwrap());
        assert!(!db.delete_refresh_token(user.id).unwrap());
        assert!(db.get_refresh_token(user.id).unwrap().is_none());
    }

    #[test]
    fn recipients_include_unlinked_users() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user("a", "h", Some("a_tg"), at(0)).unwrap();
        let b = db.create_user("b", "h", None, at(1)).unwrap();
        db.set_chat_id(a.id, 7).unwrap();

        let recipients = db.digest_recipients().unwrap();
        assert_eq!(
            recipients,
            vec![
                DigestRecipient { user_id: a.id, tg_name: Some("a_tg".into()), chat_id: Some(7) },
                DigestRecipient { user_id: b.id, tg_name: None, chat_id: None },
            ]
        );
    }

    #[test]
    fn custom_statuses_follow_seeded_ids() {
        let db = Database::open_in_memory().unwrap();
        let custom = db.create_status("blocked").unwrap();
        assert_eq!(custom.id, 4);

        let kinds: Vec<String> = db.list_statuses().unwrap().into_iter().map(|s| s.kind).collect();
        assert_eq!(kinds, ["in progress", "completed", "archived", "blocked"]);

        assert!(db.delete_status(custom.id).unwrap());
        assert!(!db.delete_status(custom.id).unwrap());
    }
}
