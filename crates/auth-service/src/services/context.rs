//! Service context - dependency container for services
//!
//! Holds all repositories, outbound integrations and shared settings needed by services.

use std::sync::Arc;

use auth_common::auth::{JwtService, PasswordService};
use auth_common::AppConfig;
use auth_core::policy::LockoutPolicy;
use auth_core::traits::{
    AccountRepository, CredentialRepository, EmailLogRepository, EmailTemplateRepository,
    OperationLogRepository, VerificationCodeRepository,
};

use super::captcha::HumanVerifier;
use super::cleanup::CleanupStatus;
use super::error::{ServiceError, ServiceResult};
use super::mail::MailTransport;

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// It provides access to:
/// - Repositories (accounts, codes, credential transactions, logs, templates)
/// - JWT and password services
/// - Optional mail transport and human verifier
/// - The shared sweeper status and the application configuration
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    account_repo: Arc<dyn AccountRepository>,
    code_repo: Arc<dyn VerificationCodeRepository>,
    credential_repo: Arc<dyn CredentialRepository>,
    operation_log_repo: Arc<dyn OperationLogRepository>,
    email_template_repo: Arc<dyn EmailTemplateRepository>,
    email_log_repo: Arc<dyn EmailLogRepository>,

    // Outbound integrations
    mail_transport: Option<Arc<dyn MailTransport>>,
    human_verifier: Option<Arc<dyn HumanVerifier>>,

    // Services
    jwt_service: Arc<JwtService>,
    password_service: PasswordService,
    lockout_policy: LockoutPolicy,

    cleanup_status: Arc<CleanupStatus>,
    config: Arc<AppConfig>,
}

impl ServiceContext {
    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Repositories ===

    /// Get the account repository
    pub fn account_repo(&self) -> &dyn AccountRepository {
        self.account_repo.as_ref()
    }

    /// Get the verification code repository
    pub fn code_repo(&self) -> &dyn VerificationCodeRepository {
        self.code_repo.as_ref()
    }

    /// Get the repository running code-consuming transactions
    pub fn credential_repo(&self) -> &dyn CredentialRepository {
        self.credential_repo.as_ref()
    }

    /// Get the operation log repository
    pub fn operation_log_repo(&self) -> &dyn OperationLogRepository {
        self.operation_log_repo.as_ref()
    }

    /// Get the email template repository
    pub fn email_template_repo(&self) -> &dyn EmailTemplateRepository {
        self.email_template_repo.as_ref()
    }

    /// Get the email log repository
    pub fn email_log_repo(&self) -> &dyn EmailLogRepository {
        self.email_log_repo.as_ref()
    }

    // === Integrations ===

    /// Mail transport, if one is configured
    pub fn mail_transport(&self) -> Option<&dyn MailTransport> {
        self.mail_transport.as_deref()
    }

    /// Human verifier, if the gate is active
    pub fn human_verifier(&self) -> Option<&dyn HumanVerifier> {
        self.human_verifier.as_deref()
    }

    // === Services ===

    /// Get the JWT service
    pub fn jwt_service(&self) -> &JwtService {
        self.jwt_service.as_ref()
    }

    /// Get the password service
    pub fn password_service(&self) -> &PasswordService {
        &self.password_service
    }

    /// Get the lockout policy derived from configuration
    pub fn lockout_policy(&self) -> LockoutPolicy {
        self.lockout_policy
    }

    /// Shared status of the code sweeper
    pub fn cleanup_status(&self) -> &Arc<CleanupStatus> {
        &self.cleanup_status
    }

    /// Application configuration
    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("mail_transport", &self.mail_transport.is_some())
            .field("human_verifier", &self.human_verifier.is_some())
            .field("lockout_policy", &self.lockout_policy)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    account_repo: Option<Arc<dyn AccountRepository>>,
    code_repo: Option<Arc<dyn VerificationCodeRepository>>,
    credential_repo: Option<Arc<dyn CredentialRepository>>,
    operation_log_repo: Option<Arc<dyn OperationLogRepository>>,
    email_template_repo: Option<Arc<dyn EmailTemplateRepository>>,
    email_log_repo: Option<Arc<dyn EmailLogRepository>>,
    mail_transport: Option<Arc<dyn MailTransport>>,
    human_verifier: Option<Arc<dyn HumanVerifier>>,
    jwt_service: Option<Arc<JwtService>>,
    cleanup_status: Option<Arc<CleanupStatus>>,
    config: Option<Arc<AppConfig>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_repo(mut self, repo: Arc<dyn AccountRepository>) -> Self {
        self.account_repo = Some(repo);
        self
    }

    pub fn code_repo(mut self, repo: Arc<dyn VerificationCodeRepository>) -> Self {
        self.code_repo = Some(repo);
        self
    }

    pub fn credential_repo(mut self, repo: Arc<dyn CredentialRepository>) -> Self {
        self.credential_repo = Some(repo);
        self
    }

    pub fn operation_log_repo(mut self, repo: Arc<dyn OperationLogRepository>) -> Self {
        self.operation_log_repo = Some(repo);
        self
    }

    pub fn email_template_repo(mut self, repo: Arc<dyn EmailTemplateRepository>) -> Self {
        self.email_template_repo = Some(repo);
        self
    }

    pub fn email_log_repo(mut self, repo: Arc<dyn EmailLogRepository>) -> Self {
        self.email_log_repo = Some(repo);
        self
    }

    pub fn mail_transport(mut self, transport: Option<Arc<dyn MailTransport>>) -> Self {
        self.mail_transport = transport;
        self
    }

    pub fn human_verifier(mut self, verifier: Option<Arc<dyn HumanVerifier>>) -> Self {
        self.human_verifier = verifier;
        self
    }

    pub fn jwt_service(mut self, service: Arc<JwtService>) -> Self {
        self.jwt_service = Some(service);
        self
    }

    pub fn cleanup_status(mut self, status: Arc<CleanupStatus>) -> Self {
        self.cleanup_status = Some(status);
        self
    }

    pub fn config(mut self, config: Arc<AppConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let config = self
            .config
            .ok_or_else(|| ServiceError::validation("config is required"))?;
        let security = &config.security;
        let lockout_policy = LockoutPolicy::new(
            security.login_max_failure_count,
            security.login_lock_duration_minutes,
        );
        let cleanup_status = self.cleanup_status.unwrap_or_else(|| {
            Arc::new(CleanupStatus::new(security.cleanup_interval_minutes))
        });

        Ok(ServiceContext {
            account_repo: self
                .account_repo
                .ok_or_else(|| ServiceError::validation("account_repo is required"))?,
            code_repo: self
                .code_repo
                .ok_or_else(|| ServiceError::validation("code_repo is required"))?,
            credential_repo: self
                .credential_repo
                .ok_or_else(|| ServiceError::validation("credential_repo is required"))?,
            operation_log_repo: self
                .operation_log_repo
                .ok_or_else(|| ServiceError::validation("operation_log_repo is required"))?,
            email_template_repo: self
                .email_template_repo
                .ok_or_else(|| ServiceError::validation("email_template_repo is required"))?,
            email_log_repo: self
                .email_log_repo
                .ok_or_else(|| ServiceError::validation("email_log_repo is required"))?,
            mail_transport: self.mail_transport,
            human_verifier: self.human_verifier,
            jwt_service: self
                .jwt_service
                .ok_or_else(|| ServiceError::validation("jwt_service is required"))?,
            password_service: PasswordService::new(),
            lockout_policy,
            cleanup_status,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[test]
    fn test_builder_requires_dependencies() {
        let err = ServiceContextBuilder::new().build().unwrap_err();
        assert_eq!(err.to_string(), "config is required");

        let err = ServiceContextBuilder::new()
            .config(Arc::new(crate::testing::test_config()))
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "account_repo is required");
    }

    #[test]
    fn test_lockout_policy_follows_config() {
        let harness = TestHarness::new();
        let policy = harness.ctx.lockout_policy();
        assert_eq!(policy.max_failures(), 3);
        assert_eq!(policy.lock_duration(), chrono::Duration::minutes(10));
    }
}
