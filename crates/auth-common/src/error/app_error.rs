//! Infrastructure error type
//!
//! Raised by the shared building blocks (token codec, password hashing) and by
//! process startup. Request-level failures live in the service layer.

/// Infrastructure error
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Token malformed, tampered with, expired, or of the wrong kind
    #[error("Invalid token")]
    InvalidToken,

    /// Pool creation or migration failure at startup
    #[error("Database error: {0}")]
    Database(String),

    /// Bad settings, bind failure, or server exit
    #[error("Configuration error: {0}")]
    Config(String),

    /// Hashing or token encoding failed
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// HTTP status this error maps to when it reaches a response
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidToken => 401,
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => 500,
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_codes() {
        assert_eq!(AppError::InvalidToken.status_code(), 401);
        assert_eq!(AppError::InvalidToken.error_code(), "INVALID_TOKEN");
        assert_eq!(AppError::Database("down".into()).status_code(), 500);
        assert_eq!(AppError::Config("bind".into()).error_code(), "CONFIG_ERROR");

        let err = AppError::Internal(anyhow::anyhow!("argon2 failed"));
        assert_eq!(err.status_code(), 500);
        // Detail stays out of the display text
        assert_eq!(err.to_string(), "Internal server error");
    }
}
