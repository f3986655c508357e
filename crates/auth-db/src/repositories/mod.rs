//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in auth-core.

mod account;
mod credential;
mod email;
mod error;
mod operation_log;
mod verification_code;

pub use account::PgAccountRepository;
pub use credential::PgCredentialRepository;
pub use email::{PgEmailLogRepository, PgEmailTemplateRepository};
pub use operation_log::PgOperationLogRepository;
pub use verification_code::PgVerificationCodeRepository;
