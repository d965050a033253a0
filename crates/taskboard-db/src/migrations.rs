use anyhow::Result;
use rusqlite::Connection;
use taskboard_types::models::TaskStatus;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                tg_name         TEXT UNIQUE,
                chat_id         INTEGER,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE boards (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE boards_users (
                user_id     INTEGER NOT NULL REFERENCES users(id),
                board_id    INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, board_id)
            );

            CREATE TABLE statuses (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                type    TEXT NOT NULL
            );

            CREATE TABLE tasks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                board_id        INTEGER NOT NULL REFERENCES boards(id),
                status_id       INTEGER NOT NULL DEFAULT 1
                                REFERENCES statuses(id)
                                CHECK (status_id IN (1, 2, 3)),
                user_id         INTEGER NOT NULL REFERENCES users(id),
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_tasks_user_status
                ON tasks(user_id, status_id, updated_at);

            CREATE INDEX idx_tasks_board
                ON tasks(board_id);

            CREATE TABLE user_token (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL UNIQUE REFERENCES users(id),
                refresh_token   TEXT NOT NULL
            );
            ",
        )?;

        // Task lifecycle sentinels; ids must stay 1, 2, 3
        let mut seed = conn.prepare("INSERT INTO statuses (id, type) VALUES (?1, ?2)")?;
        for status in TaskStatus::ALL {
            seed.execute(rusqlite::params![status.id(), status.label()])?;
        }

        conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent_and_seed_statuses() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let labels: Vec<(i64, String)> = conn
            .prepare("SELECT id, type FROM statuses ORDER BY id")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            labels,
            vec![
                (1, "in progress".to_string()),
                (2, "completed".to_string()),
                (3, "archived".to_string()),
            ]
        );

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }
}
