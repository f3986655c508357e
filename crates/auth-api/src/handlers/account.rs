//! Signed-in account handlers

use axum::{extract::State, Json};
use auth_service::dto::{ChangePasswordRequest, MessageResponse, ProfileResponse};
use auth_service::AuthService;
use serde_json::Value;

use crate::extractors::{AuthUser, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// Current account summary
///
/// GET /user/profile
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.profile(user.account_id).await?;
    Ok(Json(response))
}

/// Change own password
///
/// PUT /user/password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.change_password(user.account_id, request).await?;
    Ok(Json(response))
}

/// Dynamic menu routes. The frontend ships its own static routes, so the
/// list is always empty.
///
/// GET /getUserRoutes
pub async fn menu_routes() -> Json<Vec<Value>> {
    Json(Vec::new())
}

/// GET /user/routes
pub async fn own_menu_routes(_user: AuthUser) -> Json<Vec<Value>> {
    menu_routes().await
}
