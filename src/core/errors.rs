use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Serialize)]
pub enum TodoError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),
    #[error("Token is required")]
    MissingToken,
    #[error("Invalid or expired token")]
    TokenNotFound,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Title is required")]
    MissingTitle,
    #[error("Status is required")]
    MissingStatus,
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Invalid user {0}")]
    InvalidUser(String),
    #[error("Admin privileges required")]
    Forbidden,
    #[error("Todo {0} not found")]
    TodoNotFound(String),
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Mailer error: {0}")]
    MailerError(String),
}

impl From<sqlx::Error> for TodoError {
    fn from(err: sqlx::Error) -> Self {
        TodoError::DatabaseError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for TodoError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        TodoError::DatabaseError(format!("Migration failed: {}", err))
    }
}
