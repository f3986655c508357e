//! Authentication handlers
//!
//! Public endpoints for registration, login, token refresh and password reset.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use auth_service::dto::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest,
    RegisterRequest, ResetPasswordRequest, SendCodeRequest, TokenResponse,
};
use auth_service::AuthService;

use crate::extractors::{AcceptLanguage, CaptchaHeaders, ClientIp, JsonBody, ValidatedJson};
use crate::response::ApiResult;
use crate::state::AppState;

/// Register a new account with an emailed code
///
/// POST /public/register
pub async fn register(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    CaptchaHeaders(captcha): CaptchaHeaders,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.register(request, captcha, Some(ip)).await?;
    Ok(Json(response))
}

/// Mail a registration code
///
/// POST /public/send-register-code
pub async fn send_register_code(
    State(state): State<AppState>,
    language: AcceptLanguage,
    ValidatedJson(request): ValidatedJson<SendCodeRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service
        .send_register_code(request, language.as_deref())
        .await?;
    Ok(Json(response))
}

/// Login with username or email
///
/// POST /public/login
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    CaptchaHeaders(captcha): CaptchaHeaders,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.login(request, captcha, &ip).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new pair
///
/// POST /public/refresh-token
pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RefreshTokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.refresh(request).await?;
    Ok(Json(response))
}

/// Start a password reset. Always answers with the same message.
///
/// POST /public/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    language: AcceptLanguage,
    body: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Json<MessageResponse> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let service = AuthService::new(state.service_context());
    Json(
        service
            .send_reset_email(request, language.as_deref())
            .await,
    )
}

/// Confirm a password reset with the mailed code
///
/// POST /public/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let service = AuthService::new(state.service_context());
    let response = service.reset_password_confirm(request).await?;
    Ok(Json(response))
}
