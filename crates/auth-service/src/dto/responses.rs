//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output. Public auth
//! responses use camelCase keys; admin responses use snake_case.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Common Response Types
// ============================================================================

/// Plain acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Offset-paginated listing
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub list: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

// ============================================================================
// Auth Responses
// ============================================================================

/// Successful login: token pair plus a user summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    /// Single-element list, kept as a list for the frontend
    pub role: Vec<String>,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, unix seconds
    pub expires_at: i64,
}

/// Successful refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// The signed-in account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub role: Vec<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Admin Responses
// ============================================================================

/// Account as shown to admins
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub role: String,
    /// 1 = active, 0 = disabled
    pub status: i16,
    pub login_failure: i32,
    pub lock_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub join_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wrapper used by the detail endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AccountDetailResponse {
    pub user: AccountResponse,
}

/// Operation log entry
#[derive(Debug, Clone, Serialize)]
pub struct OperationLogResponse {
    pub id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub module: String,
    pub action: String,
    pub method: String,
    pub path: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub request_body: Option<String>,
    pub response_body: Option<String>,
    pub status_code: i32,
    pub duration_ms: i64,
    pub created_at: DateTime<Utc>,
}

/// Count for one module or method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCountResponse {
    pub name: String,
    pub count: i64,
}

/// Operation log summary
#[derive(Debug, Clone, Serialize)]
pub struct OperationLogStatsResponse {
    pub total_count: i64,
    pub today_count: i64,
    pub module_stats: Vec<NamedCountResponse>,
    pub method_stats: Vec<NamedCountResponse>,
}

/// Rows removed by a log cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanLogsResponse {
    pub affected: u64,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health of each dependency
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
}

impl ReadinessResponse {
    pub fn ready(database_healthy: bool) -> Self {
        Self {
            status: if database_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: if database_healthy { "healthy" } else { "unhealthy" }.to_string(),
            },
        }
    }
}
