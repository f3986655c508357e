//! Verification-code manager
//!
//! Issues, checks and disposes of the six-digit codes used by registration
//! and password reset. Checking never consumes; consumption happens inside
//! the register/reset transactions.

use auth_core::entities::{generate_verification_code, CodePurpose, VerificationCode, CODE_LENGTH};
use chrono::{Duration, Utc};
use tracing::{debug, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Verification-code manager
pub struct VerificationCodeManager<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> VerificationCodeManager<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Issue a fresh code for (email, purpose), superseding any active one.
    /// Returns the plaintext code for delivery.
    #[instrument(skip(self))]
    pub async fn issue_code(
        &self,
        email: &str,
        purpose: CodePurpose,
        ttl: Duration,
    ) -> ServiceResult<String> {
        let code = generate_verification_code();
        let expires_at = Utc::now() + ttl;

        let stored = self
            .ctx
            .code_repo()
            .issue(email, purpose, &code, expires_at)
            .await?;

        debug!(code_id = stored.id, %expires_at, "Verification code issued");
        Ok(code)
    }

    /// Find the live code matching exactly, if any. Expired codes never match.
    #[instrument(skip(self, code))]
    pub async fn verify_code(
        &self,
        email: &str,
        code: &str,
        purpose: CodePurpose,
    ) -> ServiceResult<Option<VerificationCode>> {
        if code.len() != CODE_LENGTH || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(None);
        }

        let found = self
            .ctx
            .code_repo()
            .find_active(email, code, purpose)
            .await?;

        let now = Utc::now();
        Ok(found.filter(|c| c.is_active_at(now)))
    }

    /// Mark a code used. Repeating the call is harmless.
    pub async fn mark_used(&self, code_id: i64) -> ServiceResult<()> {
        self.ctx.code_repo().mark_used(code_id).await?;
        Ok(())
    }

    /// Remove every code for (email, purpose)
    pub async fn delete_all_for(&self, email: &str, purpose: CodePurpose) -> ServiceResult<u64> {
        Ok(self.ctx.code_repo().delete_all_for(email, purpose).await?)
    }

    /// Soft-delete codes whose expiry has passed
    pub async fn sweep_expired(&self) -> ServiceResult<u64> {
        Ok(self.ctx.code_repo().sweep_expired(Utc::now()).await?)
    }

    /// Hard-delete disposed codes older than `retention_days`
    pub async fn purge_old(&self, retention_days: u32) -> ServiceResult<u64> {
        let older_than = Utc::now() - Duration::days(i64::from(retention_days));
        Ok(self.ctx.code_repo().purge_disposed(older_than).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[tokio::test]
    async fn test_issue_then_verify() {
        let harness = TestHarness::new();
        let codes = VerificationCodeManager::new(&harness.ctx);

        let code = codes
            .issue_code("a@x.com", CodePurpose::Register, Duration::minutes(10))
            .await
            .unwrap();
        assert_eq!(code.len(), CODE_LENGTH);

        let found = codes
            .verify_code("a@x.com", &code, CodePurpose::Register)
            .await
            .unwrap();
        assert!(found.is_some());

        // Verification does not consume
        let again = codes
            .verify_code("a@x.com", &code, CodePurpose::Register)
            .await
            .unwrap();
        assert_eq!(found, again);
    }

    #[tokio::test]
    async fn test_purpose_and_email_must_match() {
        let harness = TestHarness::new();
        let codes = VerificationCodeManager::new(&harness.ctx);
        let code = codes
            .issue_code("a@x.com", CodePurpose::Register, Duration::minutes(10))
            .await
            .unwrap();

        assert!(codes
            .verify_code("a@x.com", &code, CodePurpose::ResetPassword)
            .await
            .unwrap()
            .is_none());
        assert!(codes
            .verify_code("b@x.com", &code, CodePurpose::Register)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_new_code_supersedes_old() {
        let harness = TestHarness::new();
        let codes = VerificationCodeManager::new(&harness.ctx);

        harness.codes.seed(
            "a@x.com",
            CodePurpose::Register,
            "111111",
            Utc::now() + Duration::minutes(10),
        );
        let second = codes
            .issue_code("a@x.com", CodePurpose::Register, Duration::minutes(10))
            .await
            .unwrap();

        assert!(codes
            .verify_code("a@x.com", "111111", CodePurpose::Register)
            .await
            .unwrap()
            .is_none());
        assert!(codes
            .verify_code("a@x.com", &second, CodePurpose::Register)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_expired_code_never_verifies() {
        let harness = TestHarness::new();
        let codes = VerificationCodeManager::new(&harness.ctx);
        harness.codes.seed(
            "a@x.com",
            CodePurpose::ResetPassword,
            "123456",
            Utc::now() - Duration::seconds(1),
        );

        assert!(codes
            .verify_code("a@x.com", "123456", CodePurpose::ResetPassword)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_malformed_code_short_circuits() {
        let harness = TestHarness::new();
        let codes = VerificationCodeManager::new(&harness.ctx);
        for bad in ["", "12345", "1234567", "12a456"] {
            assert!(codes
                .verify_code("a@x.com", bad, CodePurpose::Register)
                .await
                .unwrap()
                .is_none());
        }
    }

    #[tokio::test]
    async fn test_mark_used_is_idempotent() {
        let harness = TestHarness::new();
        let codes = VerificationCodeManager::new(&harness.ctx);
        let code = codes
            .issue_code("a@x.com", CodePurpose::Register, Duration::minutes(10))
            .await
            .unwrap();
        let found = codes
            .verify_code("a@x.com", &code, CodePurpose::Register)
            .await
            .unwrap()
            .unwrap();

        codes.mark_used(found.id).await.unwrap();
        codes.mark_used(found.id).await.unwrap();
        assert!(codes
            .verify_code("a@x.com", &code, CodePurpose::Register)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_all_for_pair() {
        let harness = TestHarness::new();
        let codes = VerificationCodeManager::new(&harness.ctx);
        codes
            .issue_code("a@x.com", CodePurpose::Register, Duration::minutes(10))
            .await
            .unwrap();
        codes
            .issue_code("a@x.com", CodePurpose::Register, Duration::minutes(10))
            .await
            .unwrap();
        codes
            .issue_code("a@x.com", CodePurpose::ResetPassword, Duration::minutes(10))
            .await
            .unwrap();

        assert_eq!(
            codes
                .delete_all_for("a@x.com", CodePurpose::Register)
                .await
                .unwrap(),
            2
        );
        assert_eq!(harness.codes.len(), 1);
    }

    #[tokio::test]
    async fn test_purge_respects_retention() {
        let harness = TestHarness::new();
        let codes = VerificationCodeManager::new(&harness.ctx);
        harness.codes.seed(
            "a@x.com",
            CodePurpose::Register,
            "111111",
            Utc::now() - Duration::days(30),
        );
        harness.codes.age_all(Duration::days(8));

        assert_eq!(codes.sweep_expired().await.unwrap(), 1);
        // Sweeping touched updated_at, so it is not old enough yet
        assert_eq!(codes.purge_old(7).await.unwrap(), 0);

        harness.codes.age_all(Duration::days(8));
        assert_eq!(codes.purge_old(7).await.unwrap(), 1);
        assert_eq!(harness.codes.len(), 0);
    }
}
