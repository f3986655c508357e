//! Admin user management handlers

use axum::{extract::State, Json};
use auth_service::dto::{
    AccountDetailResponse, AccountResponse, CreateUserRequest, ListUsersQuery, MessageResponse,
    PageResponse, SetPasswordRequest, UpdateStatusRequest, UpdateUserRequest,
};
use auth_service::UserAdminService;

use crate::extractors::{AdminUser, IdPath, JsonBody, QueryParams, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    QueryParams(query): QueryParams<ListUsersQuery>,
) -> ApiResult<Json<PageResponse<AccountResponse>>> {
    let service = UserAdminService::new(state.service_context());
    Ok(Json(service.list(query).await?))
}

/// GET /admin/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<AccountDetailResponse>> {
    let service = UserAdminService::new(state.service_context());
    Ok(Json(service.detail(id).await?))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let service = UserAdminService::new(state.service_context());
    Ok(Json(service.create(request).await?))
}

/// PUT /admin/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    IdPath(id): IdPath,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let service = UserAdminService::new(state.service_context());
    Ok(Json(service.update(id, request).await?))
}

/// DELETE /admin/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    IdPath(id): IdPath,
) -> ApiResult<Json<MessageResponse>> {
    let service = UserAdminService::new(state.service_context());
    Ok(Json(service.delete(id).await?))
}

/// PUT /admin/users/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    IdPath(id): IdPath,
    JsonBody(request): JsonBody<UpdateStatusRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let service = UserAdminService::new(state.service_context());
    Ok(Json(service.set_status(id, request).await?))
}

/// PUT /admin/users/:id/password
pub async fn set_password(
    State(state): State<AppState>,
    _admin: AdminUser,
    IdPath(id): IdPath,
    ValidatedJson(request): ValidatedJson<SetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let service = UserAdminService::new(state.service_context());
    Ok(Json(service.set_password(id, request).await?))
}
