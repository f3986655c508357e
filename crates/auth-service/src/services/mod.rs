//! Business logic services
//!
//! This module contains the service layer: authentication flows, code and
//! mail handling, the background sweeper, and the admin services.

pub mod admin_users;
pub mod auth;
pub mod captcha;
pub mod cleanup;
pub mod codes;
pub mod context;
pub mod error;
pub mod mail;
pub mod operation_logs;
pub mod paging;

// Re-export all services for convenience
pub use admin_users::UserAdminService;
pub use auth::AuthService;
pub use captcha::{verifier_from_config, CaptchaProof, GeetestVerifier, HumanVerifier};
pub use cleanup::{CleanupStatus, CleanupStatusSnapshot, CodeSweeper, SweepReport};
pub use codes::VerificationCodeManager;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use mail::{
    resolve_language, transport_from_config, LogMailTransport, MailDispatcher, MailError,
    MailTransport, OutgoingMail, SmtpMailTransport,
};
pub use operation_logs::OperationLogService;
pub use paging::{page_bounds, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
