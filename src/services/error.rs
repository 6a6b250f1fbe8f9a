use thiserror::Error;

/// Failures of forum operations, independent of transport.
#[derive(Debug, Error)]
pub enum ForumError {
    #[error("{message}")]
    Validation {
        field: Option<&'static str>,
        message: String,
    },

    #[error("Insufficient points: {required} required, {available} available")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("Question has already been solved")]
    AlreadySolved,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Token error: {0}")]
    Token(String),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ForumError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ForumError::Validation {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn not_found(what: &str, id: i64) -> Self {
        ForumError::NotFound(format!("{} {}", what, id))
    }

    /// Translate a unique-constraint violation into a conflict carrying `message`.
    pub fn on_unique_violation(err: sqlx::Error, message: impl FnOnce(Option<&str>) -> String) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                ForumError::Conflict(message(db.constraint()))
            }
            _ => ForumError::Storage(err),
        }
    }
}
