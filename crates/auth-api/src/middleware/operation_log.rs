//! Operation-log recorder for admin routes
//!
//! Captures who called what, from where, with which outcome, and hands the
//! entry to a detached write. Requests that do not carry an admin token are
//! not recorded.

use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use auth_core::{action_for_method, truncate_body, NewOperationLog, Role};
use auth_service::OperationLogService;
use serde_json::Value;

use crate::extractors::ClientIp;
use crate::response::ApiError;
use crate::state::AppState;

/// Module name stored for the admin user routes
pub const USER_ADMIN_MODULE: &str = "user_admin";

/// Largest body buffered for recording
const MAX_RECORDED_BODY_BYTES: usize = 64 * 1024;

const REDACTED: &str = "******";

/// Mask every JSON field whose name mentions a password, then truncate
pub fn redact_body(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let text = match serde_json::from_slice::<Value>(bytes) {
        Ok(mut value) => {
            mask_passwords(&mut value);
            value.to_string()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    };
    Some(truncate_body(&text))
}

fn mask_passwords(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if key.to_ascii_lowercase().contains("password") {
                    *field = Value::String(REDACTED.to_string());
                } else {
                    mask_passwords(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_passwords),
        _ => {}
    }
}

/// Account behind the bearer token, when it holds the admin role
fn admin_account(state: &AppState, request: &Request) -> Option<i64> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    let claims = state.jwt_service().validate_access_token(token).ok()?;
    if claims.role != Role::Admin {
        return None;
    }
    claims.account_id().ok()
}

/// Record the request in the operation log (module `user_admin`)
pub async fn record_operation(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(account_id) = admin_account(&state, &request) else {
        return next.run(request).await;
    };

    let started = Instant::now();
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    let ip = ClientIp::resolve(request.headers(), request.extensions()).0;
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_RECORDED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Admin request body rejected");
            return ApiError::invalid_body("Request body too large").into_response();
        }
    };
    let request_body = redact_body(&bytes);
    let request = Request::from_parts(parts, Body::from(bytes));

    let response = next.run(request).await;

    OperationLogService::new(state.service_context()).record(NewOperationLog {
        user_id: Some(account_id),
        username: None,
        module: USER_ADMIN_MODULE.to_string(),
        action: action_for_method(&method).to_string(),
        method,
        path,
        ip,
        user_agent,
        request_body,
        response_body: None,
        status_code: i32::from(response.status().as_u16()),
        duration_ms: i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX),
    });

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_body_masks_passwords() {
        let body = br#"{"username":"ann_1","password":"secret1","nested":{"newPassword":"x"}}"#;
        let out = redact_body(body).unwrap();
        assert!(!out.contains("secret1"));
        assert!(out.contains("ann_1"));
        assert!(out.contains(REDACTED));

        assert!(redact_body(b"").is_none());
        assert_eq!(redact_body(b"plain").as_deref(), Some("plain"));
    }

    #[test]
    fn test_redact_body_truncates() {
        let long = "a".repeat(5000);
        let out = redact_body(long.as_bytes()).unwrap();
        assert!(out.ends_with("...(truncated)"));
        assert!(out.len() < long.len());
    }
}
