//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    #[error("Operation log not found: {0}")]
    OperationLogNotFound(i64),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Email already exists")]
    EmailAlreadyExists,

    /// Another request consumed the code between verification and commit
    #[error("Verification code already consumed")]
    CodeAlreadyConsumed,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "UNKNOWN_ACCOUNT",
            Self::OperationLogNotFound(_) => "UNKNOWN_OPERATION_LOG",

            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidUsername(_) => "INVALID_USERNAME",

            Self::UsernameAlreadyExists => "USERNAME_ALREADY_EXISTS",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::CodeAlreadyConsumed => "INVALID_CODE",

            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound(_) | Self::OperationLogNotFound(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::InvalidUsername(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::UsernameAlreadyExists | Self::EmailAlreadyExists | Self::CodeAlreadyConsumed
        )
    }

    /// Check if this is an infrastructure failure
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::InternalError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::AccountNotFound(1).code(), "UNKNOWN_ACCOUNT");
        assert_eq!(DomainError::EmailAlreadyExists.code(), "EMAIL_ALREADY_EXISTS");
        assert_eq!(DomainError::CodeAlreadyConsumed.code(), "INVALID_CODE");
    }

    #[test]
    fn test_classification() {
        assert!(DomainError::AccountNotFound(1).is_not_found());
        assert!(!DomainError::EmailAlreadyExists.is_not_found());
        assert!(DomainError::UsernameAlreadyExists.is_conflict());
        assert!(DomainError::InvalidUsername("x".into()).is_validation());
        assert!(DomainError::DatabaseError("x".into()).is_infrastructure());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            DomainError::AccountNotFound(123).to_string(),
            "Account not found: 123"
        );
        assert_eq!(
            DomainError::UsernameAlreadyExists.to_string(),
            "Username already exists"
        );
    }
}
