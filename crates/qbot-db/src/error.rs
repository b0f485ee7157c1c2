use rusqlite::ffi;

/// Failures surfaced by the persistence layer.
///
/// Constraint violations are classified so callers can tell a re-submitted
/// row apart from a dangling reference.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{table} record already has primary key {id}")]
    PrimaryKeySet { table: &'static str, id: i64 },

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("foreign key violation: {0}")]
    ForeignKey(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl StorageError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self, Self::ForeignKey(_))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, msg) = &e {
            let detail = || msg.clone().unwrap_or_else(|| err.to_string());
            match err.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::Duplicate(detail());
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Self::ForeignKey(detail()),
                _ => {}
            }
        }
        Self::Sqlite(e)
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(extended_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            ffi::Error::new(extended_code),
            Some("constraint failed".to_string()),
        )
    }

    #[test]
    fn unique_violation_is_duplicate() {
        let err = StorageError::from(failure(ffi::SQLITE_CONSTRAINT_UNIQUE));
        assert!(err.is_duplicate());
    }

    #[test]
    fn foreign_key_violation_is_classified() {
        let err = StorageError::from(failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY));
        assert!(err.is_foreign_key());
        assert!(!err.is_duplicate());
    }

    #[test]
    fn other_failures_pass_through() {
        let err = StorageError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, StorageError::Sqlite(_)));
    }
}
