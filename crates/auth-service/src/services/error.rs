//! Service layer error types
//!
//! Provides a unified error type for all service operations. The variants
//! carry the exact client-facing message of each authentication failure.

use auth_common::AppError;
use auth_core::entities::CodePurpose;
use auth_core::DomainError;
use std::fmt;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Domain rule violation or store failure
    Domain(DomainError),

    /// Application error (hashing, token encoding, etc.)
    App(AppError),

    /// Unknown identifier or wrong password. Never says which.
    InvalidCredentials,

    /// Lock in force
    AccountLocked { remaining_minutes: i64 },

    /// Account status is disabled
    AccountDisabled,

    /// Verification code absent, expired, or already consumed
    InvalidCode(CodePurpose),

    /// Refresh token failed validation or its account can no longer sign in
    InvalidToken,

    /// Human verification failed
    CaptchaRejected,

    /// No mail transport configured
    MailUnavailable,

    /// Mail transport failed or timed out
    MailDelivery(String),

    /// Resource not found
    NotFound { resource: &'static str, id: String },

    /// Validation error
    Validation(String),

    /// Duplicate resource
    Conflict(String),

    /// Caller may not perform this action
    Forbidden(String),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::App(e) => write!(f, "{e}"),
            Self::InvalidCredentials => write!(f, "Invalid account or password"),
            Self::AccountLocked { remaining_minutes } => write!(
                f,
                "Account is locked. Please try again in {remaining_minutes} minutes"
            ),
            Self::AccountDisabled => write!(f, "Account is inactive"),
            Self::InvalidCode(CodePurpose::Register) => {
                write!(f, "Invalid or expired verification code")
            }
            Self::InvalidCode(CodePurpose::ResetPassword) => {
                write!(f, "Invalid or expired reset token")
            }
            Self::InvalidToken => write!(f, "Invalid or expired refresh token"),
            Self::CaptchaRejected => write!(f, "Captcha validation failed"),
            Self::MailUnavailable => write!(f, "Mail service not configured"),
            Self::MailDelivery(_) => write!(f, "Failed to send email"),
            Self::NotFound { resource, .. } => write!(f, "{resource} not found"),
            Self::Validation(msg) | Self::Conflict(msg) | Self::Forbidden(msg) => {
                write!(f, "{msg}")
            }
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::App(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create a not found error
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a forbidden error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Domain(DomainError::CodeAlreadyConsumed) => 400,
            Self::Domain(e) => {
                if e.is_not_found() {
                    404
                } else if e.is_validation() || e.is_conflict() {
                    400
                } else {
                    500
                }
            }
            Self::App(e) => e.status_code(),
            Self::InvalidCredentials | Self::InvalidToken => 401,
            Self::AccountLocked { .. } | Self::AccountDisabled | Self::CaptchaRejected => 403,
            Self::Forbidden(_) => 403,
            Self::InvalidCode(_) | Self::Validation(_) | Self::Conflict(_) => 400,
            Self::NotFound { .. } => 404,
            Self::MailUnavailable | Self::MailDelivery(_) | Self::Internal(_) => 500,
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::InvalidCode(_) => "INVALID_CODE",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::CaptchaRejected => "CAPTCHA_REJECTED",
            Self::MailUnavailable => "MAIL_UNAVAILABLE",
            Self::MailDelivery(_) => "MAIL_DELIVERY_FAILED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this is a server-side failure whose detail must not leak
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<AppError> for ServiceError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors() {
        let err = ServiceError::InvalidCredentials;
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "Invalid account or password");

        let err = ServiceError::AccountLocked {
            remaining_minutes: 7,
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(
            err.to_string(),
            "Account is locked. Please try again in 7 minutes"
        );

        assert_eq!(ServiceError::AccountDisabled.status_code(), 403);
        assert_eq!(ServiceError::AccountDisabled.to_string(), "Account is inactive");
    }

    #[test]
    fn test_code_error_message_depends_on_purpose() {
        let register = ServiceError::InvalidCode(CodePurpose::Register);
        let reset = ServiceError::InvalidCode(CodePurpose::ResetPassword);
        assert_eq!(register.status_code(), 400);
        assert_eq!(register.to_string(), "Invalid or expired verification code");
        assert_eq!(reset.to_string(), "Invalid or expired reset token");
    }

    #[test]
    fn test_mail_errors_are_server_errors() {
        assert!(ServiceError::MailUnavailable.is_server_error());
        let err = ServiceError::MailDelivery("smtp server answered 554".to_string());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "Failed to send email");
    }

    #[test]
    fn test_domain_duplicates_are_bad_requests() {
        let err = ServiceError::from(DomainError::UsernameAlreadyExists);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Username already exists");
        assert_eq!(
            ServiceError::from(DomainError::AccountNotFound(3)).status_code(),
            404
        );
        assert_eq!(
            ServiceError::from(DomainError::DatabaseError("x".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_not_found_error() {
        let err = ServiceError::not_found("User", "123");
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "User not found");
    }
}
