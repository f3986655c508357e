//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize`, and those with input rules
//! implement `Validate` as well. Field names follow the wire format the
//! frontend sends (`userName`, `refreshToken`, ...), with snake_case aliases.

use auth_core::entities::Role;
use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Public auth requests
// ============================================================================

/// Registration with an emailed code
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Verification code is required"))]
    pub code: String,
}

/// Request for a code mailed to `email`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendCodeRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Preferred mail language; `Accept-Language` is used when absent
    #[serde(default)]
    pub lang: Option<String>,
}

/// Password reset request. Never rejected, so it carries no rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub lang: Option<String>,
}

/// Credential login; the identifier may be a username or an email
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "userName", alias = "username", default)]
    pub user_name: String,

    #[serde(default)]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(rename = "refreshToken", alias = "refresh_token", default)]
    pub refresh_token: String,
}

/// Confirm a password reset with the mailed code
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// The mailed code; the reset link carries it as `token`
    #[serde(alias = "token")]
    #[validate(length(min = 1, message = "Reset code is required"))]
    pub code: String,

    #[serde(alias = "newPassword")]
    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub new_password: String,
}

/// Password change by the signed-in account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[serde(alias = "oldPassword")]
    #[validate(length(min = 1, message = "Current password is required"))]
    pub old_password: String,

    #[serde(alias = "newPassword")]
    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub new_password: String,
}

// ============================================================================
// Admin user requests
// ============================================================================

/// Admin account listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub keyword: Option<String>,
    /// 1 = active, 0 = disabled
    pub status: Option<i16>,
}

/// Admin account creation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 50, message = "Nickname must be at most 50 characters"))]
    pub nickname: Option<String>,

    /// Defaults to `user`
    pub role: Option<Role>,

    /// Defaults to active
    pub status: Option<i16>,
}

/// Admin account update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(max = 50, message = "Nickname must be at most 50 characters"))]
    pub nickname: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub role: Option<Role>,

    pub status: Option<i16>,
}

/// Enable or disable an account
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: i16,
}

/// Set an account's password
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetPasswordRequest {
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,
}

// ============================================================================
// Operation log requests
// ============================================================================

/// Operation log listing filters. Times are unix seconds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLogsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub module: Option<String>,
    pub action: Option<String>,
    pub method: Option<String>,
    pub path: Option<String>,
    pub ip: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

/// Delete logs created before `before_time` (unix seconds)
#[derive(Debug, Clone, Deserialize)]
pub struct CleanLogsRequest {
    pub before_time: i64,
}
