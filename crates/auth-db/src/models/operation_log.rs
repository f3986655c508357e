//! Operation log database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for operation_logs table
#[derive(Debug, Clone, FromRow)]
pub struct OperationLogModel {
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

/// Grouped count row used by the statistics queries
#[derive(Debug, Clone, FromRow)]
pub struct NamedCountModel {
    pub name: String,
    pub count: i64,
}
