//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Every method that has to be atomic says so;
//! implementations must honor it with a single statement or a transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    Account, AccountStatus, CodePurpose, EmailTemplate, NewAccount, NewEmailLog, NewOperationLog,
    OperationLog, VerificationCode,
};
use crate::error::DomainError;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

/// One page of results plus the unpaged total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

// ============================================================================
// Account Repository
// ============================================================================

/// Filters for the admin account listing
#[derive(Debug, Clone, Default)]
pub struct AccountQuery {
    /// 1-based page number
    pub page: i64,
    pub page_size: i64,
    /// Matched against username, nickname and email
    pub keyword: Option<String>,
    pub status: Option<AccountStatus>,
}

impl AccountQuery {
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.page_size
    }
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find a non-deleted account by ID
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Account>>;

    /// Find a non-deleted account whose username or email equals `identifier`
    async fn find_by_login(&self, identifier: &str) -> RepoResult<Option<Account>>;

    /// Find a non-deleted account by email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>>;

    /// Check if a non-deleted account uses this username
    async fn username_exists(&self, username: &str) -> RepoResult<bool>;

    /// Check if a non-deleted account uses this email
    async fn email_exists(&self, email: &str) -> RepoResult<bool>;

    /// Get password hash for authentication
    async fn get_password_hash(&self, id: i64) -> RepoResult<Option<String>>;

    /// Insert an account
    async fn create(&self, account: &NewAccount) -> RepoResult<Account>;

    /// Persist nickname, email, role and status
    async fn update(&self, account: &Account) -> RepoResult<()>;

    /// Change status. Re-enabling also clears any lock and failure count.
    async fn update_status(&self, id: i64, status: AccountStatus) -> RepoResult<()>;

    /// Update password hash
    async fn update_password(&self, id: i64, password_hash: &str) -> RepoResult<()>;

    /// Soft delete an account
    async fn soft_delete(&self, id: i64) -> RepoResult<()>;

    /// Paged admin listing, newest first
    async fn list(&self, query: &AccountQuery) -> RepoResult<Page<Account>>;

    /// Record a successful login: reset failures, clear lock, stamp time and address
    async fn record_login_success(&self, id: i64, ip: &str, at: DateTime<Utc>) -> RepoResult<()>;

    /// Atomically increment the failure counter and, if the new value reaches
    /// `max_failures`, set the lock expiry to `lock_until`. Returns the new count.
    async fn record_login_failure(
        &self,
        id: i64,
        max_failures: i32,
        lock_until: DateTime<Utc>,
    ) -> RepoResult<i32>;

    /// Clear a lock that has elapsed at `now`, together with the failure
    /// counter. A lock expiring after `now` is left in place.
    async fn clear_lock(&self, id: i64, now: DateTime<Utc>) -> RepoResult<()>;
}

// ============================================================================
// Verification Code Repository
// ============================================================================

#[async_trait]
pub trait VerificationCodeRepository: Send + Sync {
    /// Atomically soft-delete every active code for (email, purpose) and
    /// insert the new one
    async fn issue(
        &self,
        email: &str,
        purpose: CodePurpose,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<VerificationCode>;

    /// Most recent not-used, not-deleted code matching exactly. Expiry is
    /// left to the caller.
    async fn find_active(
        &self,
        email: &str,
        code: &str,
        purpose: CodePurpose,
    ) -> RepoResult<Option<VerificationCode>>;

    /// Mark a code used. Idempotent.
    async fn mark_used(&self, id: i64) -> RepoResult<()>;

    /// Hard-delete every code for (email, purpose)
    async fn delete_all_for(&self, email: &str, purpose: CodePurpose) -> RepoResult<u64>;

    /// Soft-delete codes expired at `now` that are not yet soft-deleted
    async fn sweep_expired(&self, now: DateTime<Utc>) -> RepoResult<u64>;

    /// Hard-delete used or soft-deleted codes last updated before `older_than`
    async fn purge_disposed(&self, older_than: DateTime<Utc>) -> RepoResult<u64>;
}

// ============================================================================
// Credential Repository
// ============================================================================

/// Flows that consume a code and mutate an account in one transaction.
///
/// Consumption is conditional on the code still being unused; losing that
/// race yields [`DomainError::CodeAlreadyConsumed`] and nothing is written.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Consume a register code, drop all codes for its email and insert the account
    async fn register_with_code(
        &self,
        code: &VerificationCode,
        account: &NewAccount,
    ) -> RepoResult<Account>;

    /// Consume a reset code, drop all codes for its email and replace the password hash
    async fn reset_password_with_code(
        &self,
        code: &VerificationCode,
        account_id: i64,
        password_hash: &str,
    ) -> RepoResult<()>;
}

// ============================================================================
// Operation Log Repository
// ============================================================================

/// Filters for the operation log listing
#[derive(Debug, Clone, Default)]
pub struct OperationLogQuery {
    pub page: i64,
    pub page_size: i64,
    pub user_id: Option<i64>,
    /// Substring match
    pub username: Option<String>,
    pub module: Option<String>,
    pub action: Option<String>,
    pub method: Option<String>,
    /// Substring match
    pub path: Option<String>,
    pub ip: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl OperationLogQuery {
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.page_size
    }
}

/// A label with a count, used by the log statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

/// Aggregates over the operation log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationLogStats {
    pub total_count: i64,
    pub today_count: i64,
    /// Top modules by volume
    pub module_stats: Vec<NamedCount>,
    pub method_stats: Vec<NamedCount>,
}

#[async_trait]
pub trait OperationLogRepository: Send + Sync {
    /// Append an entry
    async fn create(&self, log: &NewOperationLog) -> RepoResult<()>;

    /// Paged listing, newest first
    async fn list(&self, query: &OperationLogQuery) -> RepoResult<Page<OperationLog>>;

    /// Aggregate counts; `today_start` bounds the "today" bucket
    async fn stats(&self, today_start: DateTime<Utc>) -> RepoResult<OperationLogStats>;

    /// Delete entries created before `before`
    async fn delete_before(&self, before: DateTime<Utc>) -> RepoResult<u64>;
}

// ============================================================================
// Email Repositories
// ============================================================================

#[async_trait]
pub trait EmailTemplateRepository: Send + Sync {
    /// Enabled template by name and language
    async fn find_enabled(&self, name: &str, lang: &str) -> RepoResult<Option<EmailTemplate>>;
}

#[async_trait]
pub trait EmailLogRepository: Send + Sync {
    /// Record a delivery attempt
    async fn create(&self, log: &NewEmailLog) -> RepoResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_offsets() {
        let query = AccountQuery {
            page: 3,
            page_size: 20,
            ..Default::default()
        };
        assert_eq!(query.offset(), 40);

        let query = OperationLogQuery {
            page: 0,
            page_size: 20,
            ..Default::default()
        };
        assert_eq!(query.offset(), 0);
    }
}
