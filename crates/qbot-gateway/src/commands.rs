use crate::error::ValidationError;

pub const ANSWER_USAGE: &str = "!a 123 The answer is no!";
pub const QNA_USAGE: &str = "!qna 123";

/// A bot command recognized in a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!q <text>`
    Ask { question: String },

    /// `!lq`
    ListQuestions,

    /// `!la`
    ListAnswers,

    /// `!qna <id>`
    QuestionAndAnswers { question_id: i64 },

    /// `!a <id> <text>`
    Answer { question_id: i64, answer: String },

    /// `!help`
    Help,
}

impl Command {
    /// Classify a message by its leading token.
    ///
    /// `Ok(None)` means the message is not addressed to the bot.
    pub fn parse(text: &str) -> Result<Option<Command>, ValidationError> {
        let text = text.trim();
        let (head, rest) = match text.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (text, ""),
        };

        let command = match head.to_lowercase().as_str() {
            "!q" => {
                if rest.is_empty() {
                    return Err(ValidationError::EmptyQuestion);
                }
                Command::Ask {
                    question: rest.to_string(),
                }
            }
            "!lq" => Command::ListQuestions,
            "!la" => Command::ListAnswers,
            "!qna" => {
                let question_id = parse_question_id(rest.split_whitespace().next(), QNA_USAGE)?;
                Command::QuestionAndAnswers { question_id }
            }
            "!a" => {
                let mut parts = rest.split_whitespace();
                let question_id = parse_question_id(parts.next(), ANSWER_USAGE)?;
                let answer = parts.collect::<Vec<_>>().join(" ");
                if answer.is_empty() {
                    return Err(ValidationError::EmptyAnswer);
                }
                Command::Answer {
                    question_id,
                    answer,
                }
            }
            "!help" => Command::Help,
            _ => return Ok(None),
        };

        Ok(Some(command))
    }

    /// Read-only commands run detached from the dispatcher.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::ListQuestions | Self::ListAnswers | Self::QuestionAndAnswers { .. } | Self::Help
        )
    }
}

fn parse_question_id(token: Option<&str>, usage: &'static str) -> Result<i64, ValidationError> {
    let token = token.ok_or(ValidationError::MissingQuestionId { usage })?;
    match token.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidQuestionId {
            given: token.to_string(),
            usage,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_question() {
        assert_eq!(
            Command::parse("!q What is the  wifi password?").unwrap(),
            Some(Command::Ask {
                question: "What is the  wifi password?".into()
            })
        );
    }

    #[test]
    fn command_letter_is_case_insensitive() {
        assert!(matches!(Command::parse("!Q Why?").unwrap(), Some(Command::Ask { .. })));
        assert_eq!(Command::parse("!LQ").unwrap(), Some(Command::ListQuestions));
        assert_eq!(
            Command::parse("!QnA 7").unwrap(),
            Some(Command::QuestionAndAnswers { question_id: 7 })
        );
        assert!(matches!(Command::parse("!A 7 yes").unwrap(), Some(Command::Answer { .. })));
    }

    #[test]
    fn answer_body_is_rejoined_with_single_spaces() {
        assert_eq!(
            Command::parse("!a 5   The answer\tis   no").unwrap(),
            Some(Command::Answer {
                question_id: 5,
                answer: "The answer is no".into()
            })
        );
    }

    #[test]
    fn answer_requires_numeric_id() {
        assert_eq!(
            Command::parse("!a five is the answer").unwrap_err(),
            ValidationError::InvalidQuestionId {
                given: "five".into(),
                usage: ANSWER_USAGE
            }
        );
        assert_eq!(
            Command::parse("!a").unwrap_err(),
            ValidationError::MissingQuestionId { usage: ANSWER_USAGE }
        );
        assert!(matches!(
            Command::parse("!a 0 zero").unwrap_err(),
            ValidationError::InvalidQuestionId { .. }
        ));
    }

    #[test]
    fn answer_requires_body() {
        assert_eq!(Command::parse("!a 5").unwrap_err(), ValidationError::EmptyAnswer);
        assert_eq!(Command::parse("!a 5    ").unwrap_err(), ValidationError::EmptyAnswer);
    }

    #[test]
    fn question_requires_body() {
        assert_eq!(Command::parse("!q").unwrap_err(), ValidationError::EmptyQuestion);
        assert_eq!(Command::parse("!q   ").unwrap_err(), ValidationError::EmptyQuestion);
    }

    #[test]
    fn qna_requires_id() {
        assert_eq!(
            Command::parse("!qna").unwrap_err(),
            ValidationError::MissingQuestionId { usage: QNA_USAGE }
        );
        assert!(matches!(
            Command::parse("!qna abc").unwrap_err(),
            ValidationError::InvalidQuestionId { .. }
        ));
    }

    #[test]
    fn other_text_is_ignored() {
        assert_eq!(Command::parse("hello there").unwrap(), None);
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("!quit").unwrap(), None);
        assert_eq!(Command::parse("!lqx").unwrap(), None);
        assert_eq!(Command::parse("q! nope").unwrap(), None);
    }

    #[test]
    fn read_only_classification() {
        assert!(Command::ListQuestions.is_read_only());
        assert!(Command::QuestionAndAnswers { question_id: 1 }.is_read_only());
        assert!(!Command::Ask { question: "x".into() }.is_read_only());
    }
}
