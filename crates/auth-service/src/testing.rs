//! In-memory fakes for service tests
//!
//! Each fake mirrors the atomicity its Postgres counterpart guarantees, so
//! flows can be exercised without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use auth_common::auth::{hash_password, JwtService};
use auth_common::AppConfig;
use auth_core::entities::{
    Account, AccountStatus, CodePurpose, EmailTemplate, NewAccount, NewEmailLog, NewOperationLog,
    OperationLog, VerificationCode,
};
use auth_core::error::DomainError;
use auth_core::traits::{
    AccountQuery, AccountRepository, CredentialRepository, EmailLogRepository,
    EmailTemplateRepository, NamedCount, OperationLogQuery, OperationLogRepository,
    OperationLogStats, Page, RepoResult, VerificationCodeRepository,
};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::services::captcha::{CaptchaProof, HumanVerifier};
use crate::services::context::ServiceContext;
use crate::services::mail::{MailError, MailTransport, OutgoingMail};
use crate::services::ServiceResult;

pub const TEST_JWT_SECRET: &str = "unit-test-secret-key-0123456789abcdef";

static NEXT_ID: AtomicI64 = AtomicI64::new(1);

fn next_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::SeqCst)
}

/// Configuration used by every harness: three failures lock for ten minutes
pub fn test_config() -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DATABASE_URL", "postgres://localhost/unused"),
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("APP_NAME", "TestApp"),
        ("FRONTEND_URL", "http://localhost:5173"),
        ("LOGIN_MAX_FAILURE_COUNT", "3"),
        ("LOGIN_LOCK_DURATION_MINUTES", "10"),
        ("REGISTER_CODE_EXPIRE_MINUTES", "60"),
    ]);
    AppConfig::from_lookup(|name| vars.get(name).map(|v| (*v).to_string()))
        .expect("test config is complete")
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Default)]
struct AccountTable {
    rows: Vec<Account>,
    hashes: HashMap<i64, String>,
}

impl AccountTable {
    fn live(&self) -> impl Iterator<Item = &Account> {
        self.rows.iter()
    }

    fn get_mut(&mut self, id: i64) -> RepoResult<&mut Account> {
        self.rows
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(DomainError::AccountNotFound(id))
    }

    fn check_unique(&self, username: &str, email: &str, except: Option<i64>) -> RepoResult<()> {
        let others = || self.live().filter(move |a| Some(a.id) != except);
        if others().any(|a| a.username == username) {
            return Err(DomainError::UsernameAlreadyExists);
        }
        if others().any(|a| a.email == email) {
            return Err(DomainError::EmailAlreadyExists);
        }
        Ok(())
    }

    fn insert(&mut self, new: &NewAccount) -> RepoResult<Account> {
        self.check_unique(&new.username, &new.email, None)?;
        let now = Utc::now();
        let account = Account {
            id: next_id(),
            username: new.username.clone(),
            email: new.email.clone(),
            nickname: new.nickname.clone(),
            role: new.role,
            status: new.status,
            login_failure: 0,
            lock_until: None,
            last_login_at: None,
            last_login_ip: None,
            join_ip: new.join_ip.clone(),
            created_at: now,
            updated_at: now,
        };
        self.hashes.insert(account.id, new.password_hash.clone());
        self.rows.push(account.clone());
        Ok(account)
    }
}

/// In-memory [`AccountRepository`]. Soft-deleted rows are simply removed.
#[derive(Default)]
pub struct InMemoryAccounts {
    table: Mutex<AccountTable>,
}

impl InMemoryAccounts {
    pub fn get(&self, id: i64) -> Option<Account> {
        self.table.lock().rows.iter().find(|a| a.id == id).cloned()
    }

    pub fn hash_of(&self, id: i64) -> Option<String> {
        self.table.lock().hashes.get(&id).cloned()
    }

    /// Overwrite the lock state directly
    pub fn set_lock(&self, id: i64, failures: i32, lock_until: Option<DateTime<Utc>>) {
        let mut table = self.table.lock();
        if let Ok(a) = table.get_mut(id) {
            a.login_failure = failures;
            a.lock_until = lock_until;
        }
    }

    pub fn set_status(&self, id: i64, status: AccountStatus) {
        let mut table = self.table.lock();
        if let Ok(a) = table.get_mut(id) {
            a.status = status;
        }
    }

    pub fn count(&self) -> usize {
        self.table.lock().rows.len()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccounts {
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Account>> {
        Ok(self.get(id))
    }

    async fn find_by_login(&self, identifier: &str) -> RepoResult<Option<Account>> {
        Ok(self
            .table
            .lock()
            .live()
            .find(|a| a.username == identifier || a.email == identifier)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Account>> {
        Ok(self.table.lock().live().find(|a| a.email == email).cloned())
    }

    async fn username_exists(&self, username: &str) -> RepoResult<bool> {
        Ok(self.table.lock().live().any(|a| a.username == username))
    }

    async fn email_exists(&self, email: &str) -> RepoResult<bool> {
        Ok(self.table.lock().live().any(|a| a.email == email))
    }

    async fn get_password_hash(&self, id: i64) -> RepoResult<Option<String>> {
        Ok(self.hash_of(id))
    }

    async fn create(&self, account: &NewAccount) -> RepoResult<Account> {
        self.table.lock().insert(account)
    }

    async fn update(&self, account: &Account) -> RepoResult<()> {
        let mut table = self.table.lock();
        let username = table.get_mut(account.id)?.username.clone();
        table.check_unique(&username, &account.email, Some(account.id))?;
        let row = table.get_mut(account.id)?;
        row.nickname.clone_from(&account.nickname);
        row.email.clone_from(&account.email);
        row.role = account.role;
        row.status = account.status;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(&self, id: i64, status: AccountStatus) -> RepoResult<()> {
        let mut table = self.table.lock();
        let row = table.get_mut(id)?;
        row.status = status;
        if status == AccountStatus::Active {
            row.login_failure = 0;
            row.lock_until = None;
        }
        Ok(())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> RepoResult<()> {
        let mut table = self.table.lock();
        table.get_mut(id)?;
        table.hashes.insert(id, password_hash.to_string());
        Ok(())
    }

    async fn soft_delete(&self, id: i64) -> RepoResult<()> {
        let mut table = self.table.lock();
        table.get_mut(id)?;
        table.rows.retain(|a| a.id != id);
        Ok(())
    }

    async fn list(&self, query: &AccountQuery) -> RepoResult<Page<Account>> {
        let table = self.table.lock();
        let keyword = query.keyword.as_deref().map(str::to_lowercase);
        let mut matched: Vec<Account> = table
            .live()
            .filter(|a| query.status.is_none_or(|s| a.status == s))
            .filter(|a| {
                keyword.as_deref().is_none_or(|k| {
                    a.username.to_lowercase().contains(k)
                        || a.email.to_lowercase().contains(k)
                        || a.nickname
                            .as_deref()
                            .is_some_and(|n| n.to_lowercase().contains(k))
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.id.cmp(&a.id));

        let total = matched.len() as i64;
        let items = matched
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn record_login_success(&self, id: i64, ip: &str, at: DateTime<Utc>) -> RepoResult<()> {
        let mut table = self.table.lock();
        let row = table.get_mut(id)?;
        row.login_failure = 0;
        row.lock_until = None;
        row.last_login_at = Some(at);
        row.last_login_ip = Some(ip.to_string());
        Ok(())
    }

    async fn record_login_failure(
        &self,
        id: i64,
        max_failures: i32,
        lock_until: DateTime<Utc>,
    ) -> RepoResult<i32> {
        let mut table = self.table.lock();
        let row = table.get_mut(id)?;
        row.login_failure += 1;
        if row.login_failure >= max_failures {
            row.lock_until = Some(lock_until);
        }
        Ok(row.login_failure)
    }

    async fn clear_lock(&self, id: i64, now: DateTime<Utc>) -> RepoResult<()> {
        let mut table = self.table.lock();
        let row = table.get_mut(id)?;
        if row.lock_until.is_some_and(|until| until <= now) {
            row.login_failure = 0;
            row.lock_until = None;
        }
        Ok(())
    }
}

// ============================================================================
// Verification codes
// ============================================================================

/// In-memory [`VerificationCodeRepository`]
#[derive(Default)]
pub struct InMemoryCodes {
    rows: Mutex<Vec<VerificationCode>>,
}

impl InMemoryCodes {
    /// Insert a code directly, superseding nothing
    pub fn seed(
        &self,
        email: &str,
        purpose: CodePurpose,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> VerificationCode {
        let now = Utc::now();
        let row = VerificationCode {
            id: next_id(),
            email: email.to_string(),
            code: code.to_string(),
            purpose,
            expires_at,
            is_used: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().push(row.clone());
        row
    }

    /// Plaintext of the newest live code for the pair
    pub fn latest(&self, email: &str, purpose: CodePurpose) -> Option<String> {
        self.rows
            .lock()
            .iter()
            .rev()
            .find(|c| c.email == email && c.purpose == purpose && !c.is_used && !c.is_deleted)
            .map(|c| c.code.clone())
    }

    /// Shift every timestamp into the past
    pub fn age_all(&self, by: Duration) {
        for row in self.rows.lock().iter_mut() {
            row.created_at -= by;
            row.updated_at -= by;
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    /// Conditional consume, as the store does inside a transaction
    fn consume(&self, id: i64) -> bool {
        let mut rows = self.rows.lock();
        match rows
            .iter_mut()
            .find(|c| c.id == id && !c.is_used && !c.is_deleted)
        {
            Some(row) => {
                row.is_used = true;
                row.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    fn remove_all(&self, email: &str, purpose: CodePurpose) -> u64 {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|c| !(c.email == email && c.purpose == purpose));
        (before - rows.len()) as u64
    }
}

#[async_trait]
impl VerificationCodeRepository for InMemoryCodes {
    async fn issue(
        &self,
        email: &str,
        purpose: CodePurpose,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> RepoResult<VerificationCode> {
        {
            let mut rows = self.rows.lock();
            let now = Utc::now();
            for row in rows.iter_mut().filter(|c| {
                c.email == email && c.purpose == purpose && !c.is_used && !c.is_deleted
            }) {
                row.is_deleted = true;
                row.updated_at = now;
            }
        }
        Ok(self.seed(email, purpose, code, expires_at))
    }

    async fn find_active(
        &self,
        email: &str,
        code: &str,
        purpose: CodePurpose,
    ) -> RepoResult<Option<VerificationCode>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|c| {
                c.email == email
                    && c.code == code
                    && c.purpose == purpose
                    && !c.is_used
                    && !c.is_deleted
            })
            .max_by_key(|c| (c.created_at, c.id))
            .cloned())
    }

    async fn mark_used(&self, id: i64) -> RepoResult<()> {
        if let Some(row) = self.rows.lock().iter_mut().find(|c| c.id == id) {
            if !row.is_used {
                row.is_used = true;
                row.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn delete_all_for(&self, email: &str, purpose: CodePurpose) -> RepoResult<u64> {
        Ok(self.remove_all(email, purpose))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut count = 0;
        for row in self
            .rows
            .lock()
            .iter_mut()
            .filter(|c| c.expires_at <= now && !c.is_deleted)
        {
            row.is_deleted = true;
            row.updated_at = Utc::now();
            count += 1;
        }
        Ok(count)
    }

    async fn purge_disposed(&self, older_than: DateTime<Utc>) -> RepoResult<u64> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|c| !((c.is_used || c.is_deleted) && c.updated_at < older_than));
        Ok((before - rows.len()) as u64)
    }
}

// ============================================================================
// Credential transactions
// ============================================================================

/// In-memory [`CredentialRepository`] over the account and code fakes
pub struct InMemoryCredentials {
    accounts: Arc<InMemoryAccounts>,
    codes: Arc<InMemoryCodes>,
}

#[async_trait]
impl CredentialRepository for InMemoryCredentials {
    async fn register_with_code(
        &self,
        code: &VerificationCode,
        account: &NewAccount,
    ) -> RepoResult<Account> {
        // Uniqueness first so a failed insert leaves the code untouched
        self.accounts
            .table
            .lock()
            .check_unique(&account.username, &account.email, None)?;
        if !self.codes.consume(code.id) {
            return Err(DomainError::CodeAlreadyConsumed);
        }
        self.codes.remove_all(&code.email, code.purpose);
        self.accounts.table.lock().insert(account)
    }

    async fn reset_password_with_code(
        &self,
        code: &VerificationCode,
        account_id: i64,
        password_hash: &str,
    ) -> RepoResult<()> {
        if self.accounts.get(account_id).is_none() {
            return Err(DomainError::AccountNotFound(account_id));
        }
        if !self.codes.consume(code.id) {
            return Err(DomainError::CodeAlreadyConsumed);
        }
        self.codes.remove_all(&code.email, code.purpose);
        self.accounts
            .table
            .lock()
            .hashes
            .insert(account_id, password_hash.to_string());
        Ok(())
    }
}

// ============================================================================
// Operation logs
// ============================================================================

/// In-memory [`OperationLogRepository`]
#[derive(Default)]
pub struct InMemoryOperationLogs {
    rows: Mutex<Vec<OperationLog>>,
}

impl InMemoryOperationLogs {
    /// Insert a log with an explicit timestamp
    pub fn seed(&self, module: &str, method: &str, created_at: DateTime<Utc>) {
        self.rows.lock().push(OperationLog {
            id: next_id(),
            user_id: Some(1),
            username: Some("admin".to_string()),
            module: module.to_string(),
            action: auth_core::entities::action_for_method(method).to_string(),
            method: method.to_string(),
            path: format!("/api/v1/admin/{module}"),
            ip: "127.0.0.1".to_string(),
            user_agent: None,
            request_body: None,
            response_body: None,
            status_code: 200,
            duration_ms: 1,
            created_at,
        });
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

#[async_trait]
impl OperationLogRepository for InMemoryOperationLogs {
    async fn create(&self, log: &NewOperationLog) -> RepoResult<()> {
        self.rows.lock().push(OperationLog {
            id: next_id(),
            user_id: log.user_id,
            username: log.username.clone(),
            module: log.module.clone(),
            action: log.action.clone(),
            method: log.method.clone(),
            path: log.path.clone(),
            ip: log.ip.clone(),
            user_agent: log.user_agent.clone(),
            request_body: log.request_body.clone(),
            response_body: log.response_body.clone(),
            status_code: log.status_code,
            duration_ms: log.duration_ms,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list(&self, query: &OperationLogQuery) -> RepoResult<Page<OperationLog>> {
        let rows = self.rows.lock();
        let mut matched: Vec<OperationLog> = rows
            .iter()
            .filter(|l| query.user_id.is_none_or(|id| l.user_id == Some(id)))
            .filter(|l| query.module.as_deref().is_none_or(|m| l.module == m))
            .filter(|l| query.method.as_deref().is_none_or(|m| l.method == m))
            .filter(|l| query.action.as_deref().is_none_or(|a| l.action == a))
            .filter(|l| query.path.as_deref().is_none_or(|p| l.path.contains(p)))
            .filter(|l| query.start_time.is_none_or(|t| l.created_at >= t))
            .filter(|l| query.end_time.is_none_or(|t| l.created_at <= t))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.id.cmp(&a.id));

        let total = matched.len() as i64;
        let offset = ((query.page.max(1) - 1) * query.page_size) as usize;
        let items = matched
            .into_iter()
            .skip(offset)
            .take(query.page_size as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn stats(&self, today_start: DateTime<Utc>) -> RepoResult<OperationLogStats> {
        let rows = self.rows.lock();
        let count_by = |key: fn(&OperationLog) -> &str| {
            let mut counts: HashMap<String, i64> = HashMap::new();
            for row in rows.iter() {
                *counts.entry(key(row).to_string()).or_default() += 1;
            }
            let mut out: Vec<NamedCount> = counts
                .into_iter()
                .map(|(name, count)| NamedCount { name, count })
                .collect();
            out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
            out
        };

        let mut module_stats = count_by(|l| l.module.as_str());
        module_stats.truncate(10);
        Ok(OperationLogStats {
            total_count: rows.len() as i64,
            today_count: rows.iter().filter(|l| l.created_at >= today_start).count() as i64,
            module_stats,
            method_stats: count_by(|l| l.method.as_str()),
        })
    }

    async fn delete_before(&self, before: DateTime<Utc>) -> RepoResult<u64> {
        let mut rows = self.rows.lock();
        let len = rows.len();
        rows.retain(|l| l.created_at >= before);
        Ok((len - rows.len()) as u64)
    }
}

// ============================================================================
// Mail
// ============================================================================

/// In-memory [`EmailTemplateRepository`]
#[derive(Default)]
pub struct InMemoryTemplates {
    rows: Mutex<Vec<EmailTemplate>>,
}

impl InMemoryTemplates {
    pub fn insert(&self, name: &str, lang: &str, subject: &str, content: &str) {
        self.rows.lock().push(EmailTemplate {
            id: next_id(),
            name: name.to_string(),
            lang: lang.to_string(),
            subject: subject.to_string(),
            content: content.to_string(),
            enabled: true,
            updated_at: Utc::now(),
        });
    }
}

#[async_trait]
impl EmailTemplateRepository for InMemoryTemplates {
    async fn find_enabled(&self, name: &str, lang: &str) -> RepoResult<Option<EmailTemplate>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|t| t.name == name && t.lang == lang && t.enabled)
            .cloned())
    }
}

/// In-memory [`EmailLogRepository`]
#[derive(Default)]
pub struct InMemoryEmailLogs {
    rows: Mutex<Vec<NewEmailLog>>,
}

impl InMemoryEmailLogs {
    /// Wait until at least `n` detached writes have landed
    pub async fn wait_for(&self, n: usize) -> Vec<NewEmailLog> {
        for _ in 0..200 {
            if self.rows.lock().len() >= n {
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(5)).await;
        }
        self.rows.lock().clone()
    }
}

#[async_trait]
impl EmailLogRepository for InMemoryEmailLogs {
    async fn create(&self, log: &NewEmailLog) -> RepoResult<()> {
        self.rows.lock().push(log.clone());
        Ok(())
    }
}

/// Transport that records every message instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail_next: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().clone()
    }

    /// Make the next send fail
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Wait until at least `n` messages went out
    pub async fn wait_for(&self, n: usize) -> Vec<OutgoingMail> {
        for _ in 0..200 {
            if self.sent.lock().len() >= n {
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(5)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            // A recipient without a domain never parses
            "undeliverable".parse::<lettre::Address>()?;
        }
        self.sent.lock().push(mail.clone());
        Ok(())
    }
}

// ============================================================================
// Captcha
// ============================================================================

/// Verifier with a fixed answer
pub struct StaticVerifier(pub bool);

#[async_trait]
impl HumanVerifier for StaticVerifier {
    async fn verify(&self, _proof: &CaptchaProof) -> ServiceResult<bool> {
        Ok(self.0)
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A `ServiceContext` wired to fakes, with handles to inspect them
pub struct TestHarness {
    pub ctx: ServiceContext,
    pub accounts: Arc<InMemoryAccounts>,
    pub codes: Arc<InMemoryCodes>,
    pub operation_logs: Arc<InMemoryOperationLogs>,
    pub templates: Arc<InMemoryTemplates>,
    pub email_logs: Arc<InMemoryEmailLogs>,
    pub mailer: Arc<RecordingMailer>,
}

pub struct TestHarnessBuilder {
    with_mail: bool,
    verifier: Option<bool>,
}

impl TestHarnessBuilder {
    pub fn without_mail(mut self) -> Self {
        self.with_mail = false;
        self
    }

    /// Enable the captcha gate with a fixed verdict
    pub fn captcha(mut self, passes: bool) -> Self {
        self.verifier = Some(passes);
        self
    }

    pub fn build(self) -> TestHarness {
        let config = test_config();
        let accounts = Arc::new(InMemoryAccounts::default());
        let codes = Arc::new(InMemoryCodes::default());
        let credentials = Arc::new(InMemoryCredentials {
            accounts: accounts.clone(),
            codes: codes.clone(),
        });
        let operation_logs = Arc::new(InMemoryOperationLogs::default());
        let templates = Arc::new(InMemoryTemplates::default());
        let email_logs = Arc::new(InMemoryEmailLogs::default());
        let mailer = Arc::new(RecordingMailer::default());

        let jwt = JwtService::new(
            &config.jwt.secret,
            config.jwt.access_token_expiry,
            config.jwt.refresh_token_expiry,
        );
        let transport: Option<Arc<dyn MailTransport>> = if self.with_mail {
            Some(mailer.clone())
        } else {
            None
        };
        let verifier: Option<Arc<dyn HumanVerifier>> = self
            .verifier
            .map(|passes| Arc::new(StaticVerifier(passes)) as Arc<dyn HumanVerifier>);

        let ctx = ServiceContext::builder()
            .account_repo(accounts.clone())
            .code_repo(codes.clone())
            .credential_repo(credentials)
            .operation_log_repo(operation_logs.clone())
            .email_template_repo(templates.clone())
            .email_log_repo(email_logs.clone())
            .mail_transport(transport)
            .human_verifier(verifier)
            .jwt_service(Arc::new(jwt))
            .config(Arc::new(config))
            .build()
            .expect("harness context is complete");

        TestHarness {
            ctx,
            accounts,
            codes,
            operation_logs,
            templates,
            email_logs,
            mailer,
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder {
            with_mail: true,
            verifier: None,
        }
    }

    /// Create an active regular account with the given password
    pub fn seed_account(&self, username: &str, email: &str, password: &str) -> Account {
        let hash = hash_password(password).expect("hashing works");
        self.accounts
            .table
            .lock()
            .insert(&NewAccount::registered(
                username.to_string(),
                email.to_string(),
                hash,
                None,
            ))
            .expect("seed account is unique")
    }
}
