//! Database models - SQLx-compatible structs for PostgreSQL tables

mod account;
mod email;
mod operation_log;
mod verification_code;

pub use account::AccountModel;
pub use email::EmailTemplateModel;
pub use operation_log::{NamedCountModel, OperationLogModel};
pub use verification_code::VerificationCodeModel;
