use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, Row};
use tracing::warn;

use qbot_types::{Answer, Question, User};

/// A row type with an auto-assigned integer primary key.
///
/// `COLUMNS` is the select list `from_row` expects, in order.
pub trait Record: Sized + Send + 'static {
    const TABLE: &'static str;
    const COLUMNS: &'static str;

    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);

    /// Insert the row without its id. The caller reads back `last_insert_rowid`.
    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl Record for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id, slack_user, name, title, avatar, created_at";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO users (slack_user, name, title, avatar) VALUES (?1, ?2, ?3, ?4)",
            (&self.slack_user, &self.name, &self.title, &self.avatar),
        )
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: Some(row.get(0)?),
            slack_user: row.get(1)?,
            name: row.get(2)?,
            title: row.get(3)?,
            avatar: row.get(4)?,
            created_at: parse_timestamp(&row.get::<_, String>(5)?),
        })
    }
}

impl Record for Question {
    const TABLE: &'static str = "questions";
    const COLUMNS: &'static str = "id, question, slack_channel, user_name, created_at";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO questions (question, slack_channel, user_name) VALUES (?1, ?2, ?3)",
            (&self.question, &self.slack_channel, &self.user_name),
        )
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Question {
            id: Some(row.get(0)?),
            question: row.get(1)?,
            slack_channel: row.get(2)?,
            user_name: row.get(3)?,
            created_at: parse_timestamp(&row.get::<_, String>(4)?),
        })
    }
}

impl Record for Answer {
    const TABLE: &'static str = "answers";
    const COLUMNS: &'static str = "id, answer, question_id, slack_channel, user_name, created_at";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO answers (answer, question_id, slack_channel, user_name) VALUES (?1, ?2, ?3, ?4)",
            (&self.answer, self.question_id, &self.slack_channel, &self.user_name),
        )
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Answer {
            id: Some(row.get(0)?),
            answer: row.get(1)?,
            question_id: row.get(2)?,
            slack_channel: row.get(3)?,
            user_name: row.get(4)?,
            created_at: parse_timestamp(&row.get::<_, String>(5)?),
        })
    }
}

/// SQLite stores `datetime('now')` as "YYYY-MM-DD HH:MM:SS" without a timezone.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        Ok(ndt) => Some(ndt.and_utc()),
        Err(e) => {
            warn!("Corrupt created_at '{}': {}", raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_datetime() {
        let ts = parse_timestamp("2024-03-01 12:30:05").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T12:30:05+00:00");
        assert!(parse_timestamp("yesterday").is_none());
    }
}
