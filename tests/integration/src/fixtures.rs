//! Test fixtures and data generators
//!
//! Provides reusable test data for integration tests.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data, stable across runs against the same database
pub fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    format!("{}{}", nanos % 1_000_000, COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// A fresh identity that is not registered yet
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Identity {
    pub fn unique() -> Self {
        let suffix = unique_suffix();
        Self {
            username: format!("it_{suffix}"),
            email: format!("it{suffix}@example.com"),
            password: "TestPass123!".to_string(),
        }
    }

    pub fn send_code(&self) -> SendCodeRequest {
        SendCodeRequest {
            email: self.email.clone(),
        }
    }

    pub fn register(&self, code: &str) -> RegisterRequest {
        RegisterRequest {
            username: self.username.clone(),
            password: self.password.clone(),
            email: self.email.clone(),
            code: code.to_string(),
        }
    }

    pub fn login(&self) -> LoginRequest {
        LoginRequest {
            user_name: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Code request
#[derive(Debug, Serialize)]
pub struct SendCodeRequest {
    pub email: String,
}

/// Registration request
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub code: String,
}

/// Login request
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub password: String,
}

/// Reset confirmation
#[derive(Debug, Serialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Plain message answer
#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Login answer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    pub role: Vec<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// Refresh answer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// Error envelope
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
