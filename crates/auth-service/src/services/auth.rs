//! Authentication service
//!
//! Handles registration, verification-code mail, login with lockout, token
//! refresh, and password reset.

use auth_core::entities::{CodePurpose, NewAccount};
use auth_core::policy::{validate_username, LockState};
use auth_core::DomainError;
use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};

use crate::dto::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
    ProfileResponse, RefreshTokenRequest, RegisterRequest, ResetPasswordRequest, SendCodeRequest,
    TokenResponse,
};

use super::captcha::CaptchaProof;
use super::codes::VerificationCodeManager;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::mail::{
    resolve_language, MailDispatcher, REGISTER_CODE_TEMPLATE, RESET_PASSWORD_TEMPLATE,
};

pub const MSG_REGISTERED: &str = "User registered successfully";
pub const MSG_CODE_SENT: &str = "Verification code sent";
pub const MSG_RESET_REQUESTED: &str = "If the email exists, a reset code has been sent";
pub const MSG_PASSWORD_RESET: &str = "Password reset successfully";
pub const MSG_PASSWORD_CHANGED: &str = "Password changed successfully";

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Run the human verification gate when it is enabled
    async fn check_captcha(&self, proof: Option<&CaptchaProof>) -> ServiceResult<()> {
        let Some(verifier) = self.ctx.human_verifier() else {
            return Ok(());
        };
        let Some(proof) = proof else {
            warn!("Captcha required but no proof supplied");
            return Err(ServiceError::CaptchaRejected);
        };
        if verifier.verify(proof).await? {
            Ok(())
        } else {
            Err(ServiceError::CaptchaRejected)
        }
    }

    /// Register a new account with an emailed code
    #[instrument(skip(self, request, captcha), fields(username = %request.username, email = %request.email))]
    pub async fn register(
        &self,
        request: RegisterRequest,
        captcha: Option<CaptchaProof>,
        client_ip: Option<String>,
    ) -> ServiceResult<MessageResponse> {
        self.check_captcha(captcha.as_ref()).await?;

        let code = VerificationCodeManager::new(self.ctx)
            .verify_code(&request.email, &request.code, CodePurpose::Register)
            .await?
            .ok_or(ServiceError::InvalidCode(CodePurpose::Register))?;

        validate_username(&request.username)?;

        let accounts = self.ctx.account_repo();
        if accounts.username_exists(&request.username).await? {
            return Err(DomainError::UsernameAlreadyExists.into());
        }
        if accounts.email_exists(&request.email).await? {
            return Err(DomainError::EmailAlreadyExists.into());
        }

        let password_hash = self.ctx.password_service().hash(&request.password)?;
        let new_account =
            NewAccount::registered(request.username, request.email, password_hash, client_ip);

        let account = self
            .ctx
            .credential_repo()
            .register_with_code(&code, &new_account)
            .await
            .map_err(|e| match e {
                DomainError::CodeAlreadyConsumed => ServiceError::InvalidCode(CodePurpose::Register),
                other => other.into(),
            })?;

        info!(account_id = account.id, "Account registered");
        Ok(MessageResponse::new(MSG_REGISTERED))
    }

    /// Issue a registration code and mail it
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn send_register_code(
        &self,
        request: SendCodeRequest,
        accept_language: Option<&str>,
    ) -> ServiceResult<MessageResponse> {
        // No code is issued that could never be delivered
        if self.ctx.mail_transport().is_none() {
            return Err(ServiceError::MailUnavailable);
        }

        let minutes = self.ctx.config().security.register_code_expire_minutes;
        let code = VerificationCodeManager::new(self.ctx)
            .issue_code(
                &request.email,
                CodePurpose::Register,
                Duration::minutes(i64::from(minutes)),
            )
            .await?;

        let lang = resolve_language(request.lang.as_deref(), accept_language);
        let minutes = minutes.to_string();
        let mail = MailDispatcher::new(self.ctx);
        let (subject, body) = mail
            .render(
                REGISTER_CODE_TEMPLATE,
                lang,
                &[("code", code.as_str()), ("expire_minutes", minutes.as_str())],
            )
            .await;
        mail.deliver(&request.email, REGISTER_CODE_TEMPLATE, subject, body)
            .await?;

        info!(lang, "Registration code sent");
        Ok(MessageResponse::new(MSG_CODE_SENT))
    }

    /// Authenticate by username or email
    #[instrument(skip(self, request, captcha), fields(identifier = %request.user_name))]
    pub async fn login(
        &self,
        request: LoginRequest,
        captcha: Option<CaptchaProof>,
        client_ip: &str,
    ) -> ServiceResult<LoginResponse> {
        let identifier = request.user_name.trim();
        if identifier.is_empty() {
            return Err(ServiceError::validation("Username or email is required"));
        }

        self.check_captcha(captcha.as_ref()).await?;

        let accounts = self.ctx.account_repo();
        let mut account = accounts.find_by_login(identifier).await?.ok_or_else(|| {
            warn!("Login failed: unknown account");
            ServiceError::InvalidCredentials
        })?;

        let policy = self.ctx.lockout_policy();
        let now = Utc::now();
        match policy.evaluate(&account, now) {
            LockState::Locked { remaining_minutes } => {
                warn!(account_id = account.id, remaining_minutes, "Login refused: account locked");
                return Err(ServiceError::AccountLocked { remaining_minutes });
            }
            LockState::Lapsed => {
                accounts.clear_lock(account.id, now).await?;
                account.lock_until = None;
                account.login_failure = 0;
            }
            LockState::Unlocked => {}
        }

        if !account.is_active() {
            warn!(account_id = account.id, "Login refused: account disabled");
            return Err(ServiceError::AccountDisabled);
        }

        let hash = accounts.get_password_hash(account.id).await?;
        let matches = hash
            .as_deref()
            .is_some_and(|h| self.ctx.password_service().verify(&request.password, h));

        if !matches {
            let failures = accounts
                .record_login_failure(
                    account.id,
                    policy.max_failures(),
                    policy.lock_until_after_failure(now),
                )
                .await?;
            if policy.reaches_threshold(failures) {
                warn!(account_id = account.id, failures, "Account locked after repeated failures");
            } else {
                warn!(account_id = account.id, failures, "Login failed: wrong password");
            }
            return Err(ServiceError::InvalidCredentials);
        }

        accounts
            .record_login_success(account.id, client_ip, now)
            .await?;
        let tokens = self
            .ctx
            .jwt_service()
            .generate_token_pair(account.id, account.role)?;

        info!(account_id = account.id, "Login succeeded");
        Ok(LoginResponse::new(&account, tokens))
    }

    /// Exchange a refresh token for a new pair
    #[instrument(skip(self, request))]
    pub async fn refresh(&self, request: RefreshTokenRequest) -> ServiceResult<TokenResponse> {
        let claims = self
            .ctx
            .jwt_service()
            .validate_refresh_token(&request.refresh_token)
            .map_err(|_| ServiceError::InvalidToken)?;
        let account_id = claims.account_id().map_err(|_| ServiceError::InvalidToken)?;

        let account = self
            .ctx
            .account_repo()
            .find_by_id(account_id)
            .await?
            .ok_or(ServiceError::InvalidToken)?;
        if !account.is_active() || account.is_locked_at(Utc::now()) {
            warn!(account_id, "Refresh refused: account cannot sign in");
            return Err(ServiceError::InvalidToken);
        }

        let tokens = self
            .ctx
            .jwt_service()
            .generate_token_pair(account.id, account.role)?;

        info!(account_id, "Tokens refreshed");
        Ok(tokens.into())
    }

    /// Start a password reset. The answer never reveals whether the email is known.
    #[instrument(skip(self, request))]
    pub async fn send_reset_email(
        &self,
        request: ForgotPasswordRequest,
        accept_language: Option<&str>,
    ) -> MessageResponse {
        let email = request.email.trim().to_string();
        if !email.is_empty() {
            let lang = resolve_language(request.lang.as_deref(), accept_language);
            let ctx = self.ctx.clone();
            tokio::spawn(async move {
                if let Err(e) = AuthService::new(&ctx).dispatch_reset(&email, lang).await {
                    warn!(error = %e, "Password reset mail not sent");
                }
            });
        }

        MessageResponse::new(MSG_RESET_REQUESTED)
    }

    async fn dispatch_reset(&self, email: &str, lang: &str) -> ServiceResult<()> {
        let Some(account) = self.ctx.account_repo().find_by_email(email).await? else {
            return Ok(());
        };

        let minutes = self.ctx.config().security.reset_code_expire_minutes;
        let code = VerificationCodeManager::new(self.ctx)
            .issue_code(
                &account.email,
                CodePurpose::ResetPassword,
                Duration::minutes(i64::from(minutes)),
            )
            .await?;

        let link = format!(
            "{}/#/login/reset-password-confirm?email={}&token={code}",
            self.ctx.config().app.frontend_url,
            urlencoding::encode(&account.email),
        );
        let minutes = minutes.to_string();
        let mail = MailDispatcher::new(self.ctx);
        let (subject, body) = mail
            .render(
                RESET_PASSWORD_TEMPLATE,
                lang,
                &[
                    ("code", code.as_str()),
                    ("link", link.as_str()),
                    ("expire_minutes", minutes.as_str()),
                ],
            )
            .await;
        mail.deliver(&account.email, RESET_PASSWORD_TEMPLATE, subject, body)
            .await?;

        info!(account_id = account.id, "Password reset mail sent");
        Ok(())
    }

    /// Finish a password reset with the mailed code
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn reset_password_confirm(
        &self,
        request: ResetPasswordRequest,
    ) -> ServiceResult<MessageResponse> {
        let code = VerificationCodeManager::new(self.ctx)
            .verify_code(&request.email, &request.code, CodePurpose::ResetPassword)
            .await?
            .ok_or(ServiceError::InvalidCode(CodePurpose::ResetPassword))?;

        let account = self
            .ctx
            .account_repo()
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| ServiceError::validation("User not found"))?;

        let password_hash = self.ctx.password_service().hash(&request.new_password)?;
        self.ctx
            .credential_repo()
            .reset_password_with_code(&code, account.id, &password_hash)
            .await
            .map_err(|e| match e {
                DomainError::CodeAlreadyConsumed => {
                    ServiceError::InvalidCode(CodePurpose::ResetPassword)
                }
                other => other.into(),
            })?;

        info!(account_id = account.id, "Password reset");
        Ok(MessageResponse::new(MSG_PASSWORD_RESET))
    }

    /// The signed-in account's own summary
    #[instrument(skip(self))]
    pub async fn profile(&self, account_id: i64) -> ServiceResult<ProfileResponse> {
        let account = self
            .ctx
            .account_repo()
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", account_id.to_string()))?;
        Ok(ProfileResponse::from(&account))
    }

    /// Change the signed-in account's password; the current one must match
    #[instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        account_id: i64,
        request: ChangePasswordRequest,
    ) -> ServiceResult<MessageResponse> {
        let accounts = self.ctx.account_repo();
        let hash = accounts
            .get_password_hash(account_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", account_id.to_string()))?;

        if !self
            .ctx
            .password_service()
            .verify(&request.old_password, &hash)
        {
            warn!(account_id, "Password change refused: current password mismatch");
            return Err(ServiceError::validation("Current password is incorrect"));
        }

        let password_hash = self.ctx.password_service().hash(&request.new_password)?;
        accounts.update_password(account_id, &password_hash).await?;

        info!(account_id, "Password changed");
        Ok(MessageResponse::new(MSG_PASSWORD_CHANGED))
    }
}
