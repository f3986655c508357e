//! PostgreSQL implementation of AccountRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use auth_core::entities::{Account, AccountStatus, NewAccount};
use auth_core::error::DomainError;
use auth_core::traits::{AccountQuery, AccountRepository, Page, RepoResult};

use crate::models::AccountModel;

use super::error::{account_not_found, map_account_conflict, map_db_error, map_unique_violation};

/// PostgreSQL implementation of AccountRepository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    /// Create a new PgAccountRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Insert an account on any executor, so the credential flows can reuse it
/// inside their transaction
pub(crate) async fn insert_account<'e, E>(executor: E, account: &NewAccount) -> RepoResult<Account>
where
    E: sqlx::postgres::PgExecutor<'e>,
{
    let model = sqlx::query_as::<_, AccountModel>(
        r"
        INSERT INTO accounts (username, email, nickname, password_hash, role, status, join_ip)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, username, email, nickname, role, status, login_failure, lock_until,
                  last_login_at, last_login_ip, join_ip, created_at, updated_at
        ",
    )
    .bind(&account.username)
    .bind(&account.email)
    .bind(&account.nickname)
    .bind(&account.password_hash)
    .bind(account.role.as_str())
    .bind(account.status.as_i16())
    .bind(&account.join_ip)
    .fetch_one(executor)
    .await
    .map_err(map_account_conflict)?;

    Ok(Account::from(model))
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Account>> {
        let result = sqlx::query_as::<_, AccountModel>(
            r"
            SELECT id, username, email, nickname, role, status, login_failure, lock_until,
                   last_login_at, last_login_ip, join_ip, created_at, updated_at
            FROM accounts
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Account::from))
    }

    #[instrument(skip(self))]
    async fn find_by_login(&self, identifier: &str) -> RepoResult<Option<Account>> {
        // Exact username match wins over an email match on another account
        let result = sqlx::query_as::<_, AccountModel>(
            r"
            SELECT id, username, email, nickname, role, status, login_failure, lock_until,
                   last_login_at, last_login_ip, join_ip, created_at, updated_at
            FROM accounts
            WHERE (username = $1 OR email = $1) AND deleted_at IS NULL
            ORDER BY (username = $1) DESC
            LIMIT 1
            ",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Account::from))
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        let result = sqlx::query_as::<_, AccountModel>(
            r"
            SELECT id, username, email, nickname, role, status, login_failure, lock_until,
                   last_login_at, last_login_ip, join_ip, created_at, updated_at
            FROM accounts
            WHERE email = $1 AND deleted_at IS NULL
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Account::from))
    }

    #[instrument(skip(self))]
    async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1 AND deleted_at IS NULL)
            ",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1 AND deleted_at IS NULL)
            ",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn get_password_hash(&self, id: i64) -> RepoResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r"
            SELECT password_hash FROM accounts WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self, account), fields(username = %account.username))]
    async fn create(&self, account: &NewAccount) -> RepoResult<Account> {
        insert_account(&self.pool, account).await
    }

    #[instrument(skip(self, account), fields(account_id = account.id))]
    async fn update(&self, account: &Account) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE accounts
            SET nickname = $2, email = $3, role = $4, status = $5, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(account.id)
        .bind(&account.nickname)
        .bind(&account.email)
        .bind(account.role.as_str())
        .bind(account.status.as_i16())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::EmailAlreadyExists))?;

        if result.rows_affected() == 0 {
            return Err(account_not_found(account.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: i64, status: AccountStatus) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE accounts
            SET status = $2,
                login_failure = CASE WHEN $2 = 1 THEN 0 ELSE login_failure END,
                lock_until = CASE WHEN $2 = 1 THEN NULL ELSE lock_until END,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(status.as_i16())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(account_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password(&self, id: i64, password_hash: &str) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE accounts
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(account_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE accounts
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(account_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &AccountQuery) -> RepoResult<Page<Account>> {
        let pattern = query
            .keyword
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(|k| format!("%{}%", escape_like(k)));
        let status = query.status.map(AccountStatus::as_i16);

        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM accounts
            WHERE deleted_at IS NULL
              AND ($1::TEXT IS NULL OR username ILIKE $1 OR nickname ILIKE $1 OR email ILIKE $1)
              AND ($2::SMALLINT IS NULL OR status = $2)
            ",
        )
        .bind(&pattern)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        let rows = sqlx::query_as::<_, AccountModel>(
            r"
            SELECT id, username, email, nickname, role, status, login_failure, lock_until,
                   last_login_at, last_login_ip, join_ip, created_at, updated_at
            FROM accounts
            WHERE deleted_at IS NULL
              AND ($1::TEXT IS NULL OR username ILIKE $1 OR nickname ILIKE $1 OR email ILIKE $1)
              AND ($2::SMALLINT IS NULL OR status = $2)
            ORDER BY id DESC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(&pattern)
        .bind(status)
        .bind(query.page_size)
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Page {
            items: rows.into_iter().map(Account::from).collect(),
            total,
        })
    }

    #[instrument(skip(self))]
    async fn record_login_success(&self, id: i64, ip: &str, at: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE accounts
            SET login_failure = 0, lock_until = NULL,
                last_login_at = $2, last_login_ip = $3, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id)
        .bind(at)
        .bind(ip)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(account_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn record_login_failure(
        &self,
        id: i64,
        max_failures: i32,
        lock_until: DateTime<Utc>,
    ) -> RepoResult<i32> {
        // Increment and conditional lock in one statement; the CASE sees the
        // pre-update counter, hence the + 1
        let failures = sqlx::query_scalar::<_, i32>(
            r"
            UPDATE accounts
            SET login_failure = login_failure + 1,
                lock_until = CASE WHEN login_failure + 1 >= $2 THEN $3 ELSE lock_until END,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING login_failure
            ",
        )
        .bind(id)
        .bind(max_failures)
        .bind(lock_until)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        failures.ok_or_else(|| account_not_found(id))
    }

    #[instrument(skip(self))]
    async fn clear_lock(&self, id: i64, now: DateTime<Utc>) -> RepoResult<()> {
        // Only a lapsed lock is cleared; a lock set since the caller read the
        // row must survive
        sqlx::query(
            r"
            UPDATE accounts
            SET lock_until = NULL, login_failure = 0, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL AND lock_until <= $2
            ",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}

/// Escape LIKE wildcards in user-supplied search terms
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
