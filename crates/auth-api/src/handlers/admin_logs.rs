//! Admin operation log handlers

use axum::{extract::State, Json};
use auth_service::dto::{
    CleanLogsRequest, CleanLogsResponse, ListLogsQuery, OperationLogResponse,
    OperationLogStatsResponse, PageResponse,
};
use auth_service::OperationLogService;

use crate::extractors::{AdminUser, JsonBody, QueryParams};
use crate::response::ApiResult;
use crate::state::AppState;

/// GET /admin/logs
pub async fn list_logs(
    State(state): State<AppState>,
    _admin: AdminUser,
    QueryParams(query): QueryParams<ListLogsQuery>,
) -> ApiResult<Json<PageResponse<OperationLogResponse>>> {
    let service = OperationLogService::new(state.service_context());
    Ok(Json(service.list(query).await?))
}

/// GET /admin/logs/stats
pub async fn log_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<OperationLogStatsResponse>> {
    let service = OperationLogService::new(state.service_context());
    Ok(Json(service.stats().await?))
}

/// POST /admin/logs/clean
pub async fn clean_logs(
    State(state): State<AppState>,
    _admin: AdminUser,
    JsonBody(request): JsonBody<CleanLogsRequest>,
) -> ApiResult<Json<CleanLogsResponse>> {
    let service = OperationLogService::new(state.service_context());
    Ok(Json(service.clean(request).await?))
}
