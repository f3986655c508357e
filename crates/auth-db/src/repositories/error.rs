//! Error handling utilities for repositories

use auth_core::error::DomainError;
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Map a unique violation on the accounts table to the matching conflict
pub fn map_account_conflict(e: SqlxError) -> DomainError {
    let constraint = e
        .as_database_error()
        .filter(|db_err| db_err.is_unique_violation())
        .and_then(|db_err| db_err.constraint().map(str::to_owned));

    match constraint.as_deref() {
        Some("accounts_username_live_idx") => DomainError::UsernameAlreadyExists,
        Some("accounts_email_live_idx") => DomainError::EmailAlreadyExists,
        _ => map_db_error(e),
    }
}

/// Create an "account not found" error
pub fn account_not_found(id: i64) -> DomainError {
    DomainError::AccountNotFound(id)
}
