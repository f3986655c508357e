//! # auth-service
//!
//! Application layer containing business logic, services, and DTOs.

pub mod dto;
pub mod services;

/// In-memory fakes and a wired `ServiceContext` for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use services::{
    AuthService, CaptchaProof, CleanupStatus, CleanupStatusSnapshot, CodeSweeper, OperationLogService, ServiceContext, ServiceError,
    ServiceResult, UserAdminService,
};
