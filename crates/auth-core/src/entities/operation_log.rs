//! Operation log entity - audit record of an admin request

use chrono::{DateTime, Utc};

/// Maximum stored length of request/response bodies
pub const MAX_LOGGED_BODY_LEN: usize = 2000;

/// A persisted operation log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationLog {
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

/// An entry waiting to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOperationLog {
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
}

/// Map an HTTP method to the audit action name
pub fn action_for_method(method: &str) -> &'static str {
    match method {
        "GET" => "query",
        "POST" => "create",
        "PUT" | "PATCH" => "update",
        "DELETE" => "delete",
        _ => "other",
    }
}

/// Cut a body down to the stored length, on a char boundary
pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_LOGGED_BODY_LEN {
        return body.to_string();
    }
    let mut out: String = body.chars().take(MAX_LOGGED_BODY_LEN).collect();
    out.push_str("...(truncated)");
    out
}
