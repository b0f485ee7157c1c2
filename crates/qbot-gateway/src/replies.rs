//! User-facing reply text.

use std::fmt::Write;

use qbot_types::{Answer, Question};

use crate::error::{DispatchError, ValidationError};

pub const DUPLICATE_QUESTION: &str =
    "Someone has already asked that question. Run *!lq* to see the last questions asked";

pub const STORAGE_FAILURE: &str =
    "I had problems talking to the database. Please try again in a little while";

pub const HELP: &str = "*qBot commands*\n\
    `!q <question>` ask a question\n\
    `!a <id> <answer>` answer question <id>\n\
    `!qna <id>` show question <id> and its answers\n\
    `!lq` show the last questions asked\n\
    `!la` show the last answers given";

pub fn question_saved(user_name: &str, question_id: i64) -> String {
    format!(
        "Thank you {} for providing a question. Your question has been assigned ID: {}",
        user_name, question_id
    )
}

pub fn answer_saved(user_name: &str, question_id: i64) -> String {
    format!(
        "Thank you {} for providing an answer to question {}!",
        user_name, question_id
    )
}

pub fn question_not_found(question_id: i64) -> String {
    format!("I couldn't find a question with ID {}. Run *!lq* to see the last questions asked", question_id)
}

pub fn last_questions(questions: &[Question]) -> String {
    if questions.is_empty() {
        return "No questions have been asked yet. Ask one with *!q <question>*".to_string();
    }

    let mut out = format!("*Last {} questions:*", questions.len());
    for q in questions {
        let _ = write!(
            out,
            "\n`{}` {} _(asked by {})_",
            q.id.unwrap_or_default(),
            q.question,
            q.user_name
        );
    }
    out
}

pub fn last_answers(answers: &[Answer]) -> String {
    if answers.is_empty() {
        return "No answers have been given yet. Answer a question with *!a <id> <answer>*".to_string();
    }

    let mut out = format!("*Last {} answers:*", answers.len());
    for a in answers {
        let _ = write!(
            out,
            "\n`{}` {} _(question {}, answered by {})_",
            a.id.unwrap_or_default(),
            a.answer,
            a.question_id,
            a.user_name
        );
    }
    out
}

pub fn question_and_answers(question: &Question, answers: &[Answer]) -> String {
    let question_id = question.id.unwrap_or_default();
    let mut out = format!(
        "*Question {}:* {} _(asked by {})_",
        question_id, question.question, question.user_name
    );

    if answers.is_empty() {
        let _ = write!(
            out,
            "\nNo answers yet. Answer it with *!a {} <answer>*",
            question_id
        );
        return out;
    }

    for a in answers {
        let _ = write!(out, "\n> {} _({})_", a.answer, a.user_name);
    }
    out
}

impl ValidationError {
    pub fn reply(&self) -> String {
        match self {
            Self::EmptyQuestion => {
                "No question was provided, please try again\n E.g '!q Where do I find the VPN config?'"
                    .to_string()
            }
            Self::MissingQuestionId { usage } => format!(
                "Please include an ID for the question you're referring to\n E.g '{}'",
                usage
            ),
            Self::InvalidQuestionId { given, usage } => format!(
                "'{}' is not a question ID. Please include the numeric ID of the question\n E.g '{}'",
                given, usage
            ),
            Self::EmptyAnswer => "No answer was provided, please try again".to_string(),
        }
    }
}

impl DispatchError {
    pub fn reply(&self) -> String {
        match self {
            Self::Validation(e) => e.reply(),
            Self::DuplicateQuestion => DUPLICATE_QUESTION.to_string(),
            Self::AnswerStorage { question_id, .. } => format!(
                "I had problems storing your provided answer in the DB. \
                 Did you specify the Question ID correctly? (question {})",
                question_id
            ),
            Self::Storage(_) | Self::Task(_) => STORAGE_FAILURE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbot_db::StorageError;

    fn question(id: i64, text: &str) -> Question {
        Question {
            id: Some(id),
            ..Question::new(text, "C1", "Ray")
        }
    }

    #[test]
    fn lists_questions_in_given_order() {
        let reply = last_questions(&[question(2, "Second?"), question(1, "First?")]);
        let lines: Vec<&str> = reply.lines().collect();
        assert_eq!(lines[0], "*Last 2 questions:*");
        assert_eq!(lines[1], "`2` Second? _(asked by Ray)_");
        assert_eq!(lines[2], "`1` First? _(asked by Ray)_");
    }

    #[test]
    fn empty_lists_explain_how_to_start() {
        assert!(last_questions(&[]).contains("!q"));
        assert!(last_answers(&[]).contains("!a"));
    }

    #[test]
    fn question_without_answers() {
        let reply = question_and_answers(&question(9, "Anyone?"), &[]);
        assert!(reply.starts_with("*Question 9:* Anyone?"));
        assert!(reply.contains("!a 9 <answer>"));
    }

    #[test]
    fn answer_storage_reply_names_question_id() {
        let err = DispatchError::AnswerStorage {
            question_id: 42,
            source: StorageError::ForeignKey("FOREIGN KEY constraint failed".into()),
        };
        let reply = err.reply();
        assert!(reply.contains("Question ID"));
        assert!(reply.contains("42"));
    }

    #[test]
    fn validation_replies_carry_usage() {
        let reply = ValidationError::InvalidQuestionId {
            given: "abc".into(),
            usage: crate::commands::ANSWER_USAGE,
        }
        .reply();
        assert!(reply.contains("!a 123 The answer is no!"));
        assert_eq!(ValidationError::EmptyAnswer.reply(), "No answer was provided, please try again");
    }
}
