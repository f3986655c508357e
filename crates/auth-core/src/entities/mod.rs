//! Domain entities - core business objects

mod account;
mod email;
mod operation_log;
mod verification_code;

pub use account::{Account, AccountStatus, NewAccount, Role};
pub use email::{render_placeholders, EmailStatus, EmailTemplate, NewEmailLog};
pub use operation_log::{
    action_for_method, truncate_body, NewOperationLog, OperationLog, MAX_LOGGED_BODY_LEN,
};
pub use verification_code::{
    generate_verification_code, CodePurpose, VerificationCode, CODE_LENGTH,
};

#[cfg(test)]
pub(crate) use account::sample_account;
