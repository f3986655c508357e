//! PostgreSQL implementation of CredentialRepository
//!
//! Both flows run in one transaction: consume the code, drop the rest of
//! its lineage, then mutate the account. Any failure rolls everything back.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use auth_core::entities::{Account, NewAccount, VerificationCode};
use auth_core::error::DomainError;
use auth_core::traits::{CredentialRepository, RepoResult};

use super::account::insert_account;
use super::error::{account_not_found, map_db_error};
use super::verification_code::{consume_code, delete_codes_for};

/// PostgreSQL implementation of CredentialRepository
#[derive(Clone)]
pub struct PgCredentialRepository {
    pool: PgPool,
}

impl PgCredentialRepository {
    /// Create a new PgCredentialRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialRepository for PgCredentialRepository {
    #[instrument(skip(self, code, account), fields(code_id = code.id, username = %account.username))]
    async fn register_with_code(
        &self,
        code: &VerificationCode,
        account: &NewAccount,
    ) -> RepoResult<Account> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        if !consume_code(&mut *tx, code.id).await? {
            return Err(DomainError::CodeAlreadyConsumed);
        }
        delete_codes_for(&mut *tx, &code.email, code.purpose).await?;
        let created = insert_account(&mut *tx, account).await?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(created)
    }

    #[instrument(skip(self, code, password_hash), fields(code_id = code.id))]
    async fn reset_password_with_code(
        &self,
        code: &VerificationCode,
        account_id: i64,
        password_hash: &str,
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        if !consume_code(&mut *tx, code.id).await? {
            return Err(DomainError::CodeAlreadyConsumed);
        }
        delete_codes_for(&mut *tx, &code.email, code.purpose).await?;

        let result = sqlx::query(
            r"
            UPDATE accounts
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(account_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(account_not_found(account_id));
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }
}
