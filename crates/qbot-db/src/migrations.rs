use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, questions, answers)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                slack_user  TEXT NOT NULL UNIQUE,
                name        TEXT NOT NULL DEFAULT '',
                title       TEXT NOT NULL DEFAULT '',
                avatar      TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE questions (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                question        TEXT NOT NULL UNIQUE,
                slack_channel   TEXT NOT NULL,
                user_name       TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE answers (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                answer          TEXT NOT NULL,
                question_id     INTEGER NOT NULL REFERENCES questions(id),
                slack_channel   TEXT NOT NULL,
                user_name       TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_answers_question ON answers(question_id);

            CREATE TABLE user_questions (
                user_id     INTEGER NOT NULL REFERENCES users(id),
                question_id INTEGER NOT NULL REFERENCES questions(id),
                PRIMARY KEY (user_id, question_id)
            );

            CREATE TABLE user_answers (
                user_id     INTEGER NOT NULL REFERENCES users(id),
                answer_id   INTEGER NOT NULL REFERENCES answers(id),
                PRIMARY KEY (user_id, answer_id)
            );

            CREATE TABLE question_answers (
                question_id INTEGER NOT NULL REFERENCES questions(id),
                answer_id   INTEGER NOT NULL REFERENCES answers(id),
                PRIMARY KEY (question_id, answer_id)
            );

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 1);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
