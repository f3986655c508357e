//! # auth-core
//!
//! Domain layer containing entities, security policies and repository traits.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod policy;
pub mod traits;

// Re-export commonly used types at crate root
pub use entities::{
    action_for_method, generate_verification_code, render_placeholders, truncate_body, Account,
    AccountStatus, CodePurpose, EmailStatus, EmailTemplate, NewAccount, NewEmailLog,
    NewOperationLog, OperationLog, Role, VerificationCode, CODE_LENGTH, MAX_LOGGED_BODY_LEN,
};
pub use error::DomainError;
pub use policy::{validate_username, LockState, LockoutPolicy, USERNAME_RULE};
pub use traits::{
    AccountQuery, AccountRepository, CredentialRepository, EmailLogRepository,
    EmailTemplateRepository, NamedCount, OperationLogQuery, OperationLogRepository,
    OperationLogStats, Page, RepoResult, VerificationCodeRepository,
};
