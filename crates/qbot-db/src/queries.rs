use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, warn};

use qbot_types::{Answer, Question, User};

use crate::error::{Result, StorageError};
use crate::record::Record;
use crate::Database;

impl Database {
    // -- Generic --

    /// Insert a new row and fill in its assigned id.
    pub fn create_record<R: Record>(&self, record: &mut R) -> Result<i64> {
        if let Some(id) = record.id() {
            return Err(StorageError::PrimaryKeySet { table: R::TABLE, id });
        }

        let id = self.with_conn(|conn| insert_record(conn, record))?;
        record.set_id(id);
        debug!("Created {} record {}", R::TABLE, id);
        Ok(id)
    }

    /// The `n` most recently created rows, newest first.
    pub fn last_n<R: Record>(&self, n: u32) -> Result<Vec<R>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM {} ORDER BY id DESC LIMIT ?1",
                R::COLUMNS,
                R::TABLE
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([n], R::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Users --

    /// Whether a user row exists for this platform id.
    ///
    /// A failed lookup reports `true`: a spurious "exists" only skips an insert,
    /// whereas a spurious "missing" could insert a duplicate.
    pub fn user_exists(&self, slack_user: &str) -> bool {
        let count = self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE slack_user = ?1",
                [slack_user],
                |row| row.get(0),
            )?;
            Ok(count)
        });

        match count {
            Ok(count) => count > 0,
            Err(e) => {
                warn!("User lookup for {} failed, assuming it exists: {}", slack_user, e);
                true
            }
        }
    }

    /// Create the user if absent, otherwise refresh its profile fields.
    /// Fills in `user.id`.
    pub fn upsert_user(&self, user: &mut User) -> Result<i64> {
        let id = self.with_tx(|conn| {
            conn.execute(
                "INSERT INTO users (slack_user, name, title, avatar) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(slack_user) DO UPDATE SET
                    name = excluded.name,
                    title = excluded.title,
                    avatar = excluded.avatar
                 WHERE excluded.name <> ''",
                (&user.slack_user, &user.name, &user.title, &user.avatar),
            )?;
            user_id_for(conn, &user.slack_user)
        })?;
        user.id = Some(id);
        Ok(id)
    }

    pub fn user_by_slack_id(&self, slack_user: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM users WHERE slack_user = ?1", User::COLUMNS);
            let user = conn.query_row(&sql, [slack_user], User::from_row).optional()?;
            Ok(user)
        })
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(count)
        })
    }

    // -- Questions --

    /// Persist the question (if new) and record `user` as its author, atomically.
    /// Fills in `question.id` once committed.
    pub fn link_user_to_question(&self, user: &User, question: &mut Question) -> Result<i64> {
        let question_id = self.with_tx(|conn| {
            let question_id = match question.id {
                Some(id) => id,
                None => insert_record(conn, question)?,
            };
            let user_id = user_id_for(conn, &user.slack_user)?;
            conn.execute(
                "INSERT OR IGNORE INTO user_questions (user_id, question_id) VALUES (?1, ?2)",
                (user_id, question_id),
            )?;
            Ok(question_id)
        })?;
        question.id = Some(question_id);
        Ok(question_id)
    }

    pub fn question_by_id(&self, id: i64) -> Result<Option<Question>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM questions WHERE id = ?1", Question::COLUMNS);
            let question = conn.query_row(&sql, [id], Question::from_row).optional()?;
            Ok(question)
        })
    }

    pub fn questions_for_user(&self, slack_user: &str) -> Result<Vec<Question>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM questions WHERE id IN (
                    SELECT uq.question_id FROM user_questions uq
                    JOIN users u ON u.id = uq.user_id
                    WHERE u.slack_user = ?1
                 ) ORDER BY id",
                Question::COLUMNS
            );
            query_all(conn, &sql, slack_user)
        })
    }

    // -- Answers --

    /// Persist the answer (if new) and record `user` as its author, atomically.
    /// Fails with a foreign key violation if the answered question does not exist,
    /// in which case no answer row is written.
    pub fn link_user_to_answer(&self, user: &User, answer: &mut Answer) -> Result<i64> {
        let answer_id = self.with_tx(|conn| link_answer_author(conn, user, answer))?;
        answer.id = Some(answer_id);
        Ok(answer_id)
    }

    /// Record `answer` as addressing question `question_id`.
    pub fn link_question_to_answer(&self, question_id: i64, answer: &Answer) -> Result<()> {
        let answer_id = answer
            .id
            .ok_or_else(|| StorageError::NotFound("unsaved answer".to_string()))?;

        self.with_tx(|conn| link_answer_question(conn, question_id, answer_id))
    }

    /// Store a submitted answer in one transaction: the answer row, its author
    /// link and its question link. On any failure nothing is written.
    pub fn save_answer(&self, user: &User, answer: &mut Answer) -> Result<i64> {
        let answer_id = self.with_tx(|conn| {
            let answer_id = link_answer_author(conn, user, answer)?;
            link_answer_question(conn, answer.question_id, answer_id)?;
            Ok(answer_id)
        })?;
        answer.id = Some(answer_id);
        Ok(answer_id)
    }

    /// Answers linked to a question, oldest first.
    pub fn answers_for_question(&self, question_id: i64) -> Result<Vec<Answer>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM answers WHERE id IN (
                    SELECT answer_id FROM question_answers WHERE question_id = ?1
                 ) ORDER BY id",
                Answer::COLUMNS
            );
            query_all(conn, &sql, question_id)
        })
    }

    pub fn answers_for_user(&self, slack_user: &str) -> Result<Vec<Answer>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM answers WHERE id IN (
                    SELECT ua.answer_id FROM user_answers ua
                    JOIN users u ON u.id = ua.user_id
                    WHERE u.slack_user = ?1
                 ) ORDER BY id",
                Answer::COLUMNS
            );
            query_all(conn, &sql, slack_user)
        })
    }
}

fn insert_record<R: Record>(conn: &Connection, record: &R) -> Result<i64> {
    record.insert(conn)?;
    Ok(conn.last_insert_rowid())
}

fn link_answer_author(conn: &Connection, user: &User, answer: &Answer) -> Result<i64> {
    let answer_id = match answer.id {
        Some(id) => id,
        None => insert_record(conn, answer)?,
    };
    let user_id = user_id_for(conn, &user.slack_user)?;
    conn.execute(
        "INSERT OR IGNORE INTO user_answers (user_id, answer_id) VALUES (?1, ?2)",
        (user_id, answer_id),
    )?;
    Ok(answer_id)
}

fn link_answer_question(conn: &Connection, question_id: i64, answer_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO question_answers (question_id, answer_id) VALUES (?1, ?2)",
        (question_id, answer_id),
    )?;
    Ok(())
}

fn user_id_for(conn: &Connection, slack_user: &str) -> Result<i64> {
    conn.query_row(
        "SELECT id FROM users WHERE slack_user = ?1",
        [slack_user],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| StorageError::NotFound(format!("user {}", slack_user)))
}

fn query_all<R: Record, P: rusqlite::ToSql>(conn: &Connection, sql: &str, param: P) -> Result<Vec<R>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([param], R::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
