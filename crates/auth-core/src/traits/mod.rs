//! Ports implemented by the infrastructure layer

mod repositories;

pub use repositories::{
    AccountQuery, AccountRepository, CredentialRepository, EmailLogRepository,
    EmailTemplateRepository, NamedCount, OperationLogQuery, OperationLogRepository,
    OperationLogStats, Page, RepoResult, VerificationCodeRepository,
};
