use qbot_db::StorageError;

/// Malformed command arguments. Reported back to the user; nothing is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no question provided")]
    EmptyQuestion,

    #[error("no question ID provided")]
    MissingQuestionId { usage: &'static str },

    #[error("'{given}' is not a valid question ID")]
    InvalidQuestionId { given: String, usage: &'static str },

    #[error("no answer provided")]
    EmptyAnswer,
}

/// Why a command could not be completed.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("question has already been asked")]
    DuplicateQuestion,

    #[error("storing answer to question {question_id} failed: {source}")]
    AnswerStorage {
        question_id: i64,
        source: StorageError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failures of the chat platform collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("profile lookup for {user} failed: {reason}")]
    ProfileLookup { user: String, reason: String },

    #[error("sending to {channel} failed: {reason}")]
    Send { channel: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("chat platform rejected credentials: {0}")]
    InvalidAuth(String),
}
