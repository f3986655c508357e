//! System status handlers

use axum::{extract::State, Json};
use auth_service::dto::MessageResponse;
use auth_service::CleanupStatusSnapshot;
use serde_json::Value;

use crate::extractors::{AdminUser, AuthUser};
use crate::state::AppState;

/// Background cleanup status
///
/// GET /system/cleanup-status
pub async fn cleanup_status(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Json<CleanupStatusSnapshot> {
    Json(state.service_context().cleanup_status().snapshot())
}

/// Placeholder page data kept for the bundled frontend
///
/// GET /userPage
pub async fn user_page() -> Json<Vec<Value>> {
    Json(Vec::new())
}

/// Admin console landing
///
/// GET {admin}/dashboard
pub async fn dashboard(AdminUser(user): AdminUser) -> Json<MessageResponse> {
    tracing::debug!(account_id = user.account_id, "Admin dashboard opened");
    Json(MessageResponse::new("Welcome to the admin console"))
}
