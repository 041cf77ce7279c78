//! The unified error handling system for the application.

// 1. Core Types
pub use types::{
    ACCOUNT_DISABLED_MESSAGE, AppError, FORBIDDEN_MESSAGE, INVALID_CREDENTIALS_MESSAGE,
    UNAUTHORIZED_MESSAGE,
};

/// A unified `Result` type for the entire application.
///
/// All functions that can fail should return this type.
pub type Result<T> = std::result::Result<T, AppError>;

// 2. Module declarations
pub mod response;
pub mod types;

// 3. Context trait for storage calls.
pub trait Context<T> {
    /// Wraps a storage-layer failure into [`AppError::Database`] with a message.
    fn context<C: std::fmt::Display>(self, context: C) -> Result<T>;
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn context<C: std::fmt::Display>(self, context: C) -> Result<T> {
        self.map_err(|err| AppError::database_with_source(context.to_string(), err))
    }
}

// 4. Error Category for monitoring and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Errors caused by the client (e.g., bad input, invalid credentials).
    /// Corresponds to 4xx HTTP status codes.
    Client,
    /// Errors caused by the server or its dependencies.
    /// Corresponds to 5xx HTTP status codes.
    Server,
}

/// Returns `true` when a database error was raised by a UNIQUE constraint.
#[must_use]
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

#[cfg(test)]
mod tests;
