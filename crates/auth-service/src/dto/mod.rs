//! Data transfer objects for API requests and responses
//!
//! This module provides:
//! - Request DTOs with validation for API inputs
//! - Response DTOs for serializing API outputs
//! - Mappers for converting domain entities to DTOs

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{
    ChangePasswordRequest, CleanLogsRequest, CreateUserRequest, ForgotPasswordRequest, ListLogsQuery, ListUsersQuery,
    LoginRequest, RefreshTokenRequest, RegisterRequest, ResetPasswordRequest, SendCodeRequest,
    SetPasswordRequest, UpdateStatusRequest, UpdateUserRequest,
};

pub use responses::{
    AccountDetailResponse, AccountResponse, CleanLogsResponse, HealthChecks, HealthResponse,
    LoginResponse, MessageResponse, NamedCountResponse, OperationLogResponse,
    OperationLogStatsResponse, PageResponse, ProfileResponse, ReadinessResponse, TokenResponse,
};
