//! PostgreSQL implementation of VerificationCodeRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use auth_core::entities::{CodePurpose, VerificationCode};
use auth_core::traits::{RepoResult, VerificationCodeRepository};

use crate::models::VerificationCodeModel;

use super::error::map_db_error;

/// PostgreSQL implementation of VerificationCodeRepository
#[derive(Clone)]
pub struct PgVerificationCodeRepository {
    pool: PgPool,
}

impl PgVerificationCodeRepository {
    /// Create a new PgVerificationCodeRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Hard-delete all codes for (email, purpose) on any executor
pub(crate) async fn delete_codes_for<'e, E>(
    executor: E,
    email: &str,
    purpose: CodePurpose,
) -> RepoResult<u64>
where
    E: sqlx::postgres::PgExecutor<'e>,
{
    let result = sqlx::query(
        r"
        DELETE FROM verification_codes
        WHERE email = $1 AND purpose = $2
        ",
    )
    .bind(email)
    .bind(purpose.as_str())
    .execute(executor)
    .await
    .map_err(map_db_error)?;

    Ok(result.rows_affected())
}

/// Conditionally mark a code used. Returns false if another request got there first.
pub(crate) async fn consume_code<'e, E>(executor: E, id: i64) -> RepoResult<bool>
where
    E: sqlx::postgres::PgExecutor<'e>,
{
    let result = sqlx::query(
        r"
        UPDATE verification_codes
        SET is_used = TRUE, updated_at = NOW()
        WHERE id = $1 AND is_used = FALSE AND is_deleted = FALSE
        ",
    )
    .bind(id)
    .execute(executor)
    .await
    .map_err(map_db_error)?;

    Ok(result.rows_affected() == 1)
}

#[async_trait]
impl VerificationCodeRepository for PgVerificationCodeRepository {
    #[instrument(skip(self, code))]
    async fn issue(
        &self,
        email: &str,
        purpose: CodePurpose,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<VerificationCode> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Supersede whatever is still active for this lineage
        sqlx::query(
            r"
            UPDATE verification_codes
            SET is_deleted = TRUE, updated_at = NOW()
            WHERE email = $1 AND purpose = $2 AND is_used = FALSE AND is_deleted = FALSE
            ",
        )
        .bind(email)
        .bind(purpose.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let model = sqlx::query_as::<_, VerificationCodeModel>(
            r"
            INSERT INTO verification_codes (email, code, purpose, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, code, purpose, expires_at, is_used, is_deleted,
                      created_at, updated_at
            ",
        )
        .bind(email)
        .bind(code)
        .bind(purpose.as_str())
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        VerificationCode::try_from(model)
    }

    #[instrument(skip(self, code))]
    async fn find_active(
        &self,
        email: &str,
        code: &str,
        purpose: CodePurpose,
    ) -> RepoResult<Option<VerificationCode>> {
        let result = sqlx::query_as::<_, VerificationCodeModel>(
            r"
            SELECT id, email, code, purpose, expires_at, is_used, is_deleted,
                   created_at, updated_at
            FROM verification_codes
            WHERE email = $1 AND code = $2 AND purpose = $3
              AND is_used = FALSE AND is_deleted = FALSE
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(email)
        .bind(code)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(VerificationCode::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn mark_used(&self, id: i64) -> RepoResult<()> {
        sqlx::query(
            r"
            UPDATE verification_codes
            SET is_used = TRUE, updated_at = NOW()
            WHERE id = $1 AND is_used = FALSE
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_all_for(&self, email: &str, purpose: CodePurpose) -> RepoResult<u64> {
        delete_codes_for(&self.pool, email, purpose).await
    }

    #[instrument(skip(self))]
    async fn sweep_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE verification_codes
            SET is_deleted = TRUE, updated_at = NOW()
            WHERE expires_at <= $1 AND is_deleted = FALSE
            ",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn purge_disposed(&self, older_than: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM verification_codes
            WHERE (is_used = TRUE OR is_deleted = TRUE) AND updated_at < $1
            ",
        )
        .bind(older_than)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgVerificationCodeRepository>();
    }
}
