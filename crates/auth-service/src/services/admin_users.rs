//! Admin user management
//!
//! CRUD over accounts for the admin surface.

use auth_core::entities::{AccountStatus, NewAccount, Role};
use auth_core::policy::validate_username;
use auth_core::traits::AccountQuery;
use auth_core::DomainError;
use tracing::{info, instrument};

use crate::dto::{
    AccountDetailResponse, AccountResponse, CreateUserRequest, ListUsersQuery, MessageResponse,
    PageResponse, SetPasswordRequest, UpdateStatusRequest, UpdateUserRequest,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::paging::page_bounds;

fn parse_status(code: i16) -> ServiceResult<AccountStatus> {
    AccountStatus::from_code(code)
        .ok_or_else(|| ServiceError::validation("Status must be 0 (disabled) or 1 (active)"))
}

/// Admin user management service
pub struct UserAdminService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> UserAdminService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Paginated account listing, newest first
    #[instrument(skip(self))]
    pub async fn list(&self, query: ListUsersQuery) -> ServiceResult<PageResponse<AccountResponse>> {
        let (page, page_size) = page_bounds(query.page, query.page_size);
        let status = query.status.map(parse_status).transpose()?;
        let keyword = query
            .keyword
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let result = self
            .ctx
            .account_repo()
            .list(&AccountQuery {
                page,
                page_size,
                keyword,
                status,
            })
            .await?;

        Ok(PageResponse {
            list: result.items.iter().map(AccountResponse::from).collect(),
            total: result.total,
            page,
            page_size,
        })
    }

    /// Single account
    #[instrument(skip(self))]
    pub async fn detail(&self, id: i64) -> ServiceResult<AccountDetailResponse> {
        let account = self
            .ctx
            .account_repo()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id.to_string()))?;

        Ok(AccountDetailResponse {
            user: account.into(),
        })
    }

    /// Create an account directly, without a verification code
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create(&self, request: CreateUserRequest) -> ServiceResult<AccountResponse> {
        validate_username(&request.username)?;
        let status = request.status.map(parse_status).transpose()?.unwrap_or_default();

        let accounts = self.ctx.account_repo();
        if accounts.username_exists(&request.username).await? {
            return Err(DomainError::UsernameAlreadyExists.into());
        }
        if accounts.email_exists(&request.email).await? {
            return Err(DomainError::EmailAlreadyExists.into());
        }

        let password_hash = self.ctx.password_service().hash(&request.password)?;
        let account = accounts
            .create(&NewAccount {
                username: request.username,
                email: request.email,
                nickname: request.nickname.filter(|n| !n.trim().is_empty()),
                password_hash,
                role: request.role.unwrap_or(Role::User),
                status,
                join_ip: None,
            })
            .await?;

        info!(account_id = account.id, "Account created by admin");
        Ok(account.into())
    }

    /// Update profile fields; absent fields stay as they are
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: UpdateUserRequest) -> ServiceResult<AccountResponse> {
        let accounts = self.ctx.account_repo();
        let mut account = accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id.to_string()))?;

        if let Some(email) = request.email.filter(|e| *e != account.email) {
            if accounts.email_exists(&email).await? {
                return Err(DomainError::EmailAlreadyExists.into());
            }
            account.email = email;
        }
        if let Some(nickname) = request.nickname {
            account.nickname = Some(nickname).filter(|n| !n.trim().is_empty());
        }
        if let Some(role) = request.role {
            account.role = role;
        }
        if let Some(status) = request.status {
            account.status = parse_status(status)?;
        }

        accounts.update(&account).await?;

        info!(account_id = id, "Account updated by admin");
        let updated = accounts.find_by_id(id).await?.unwrap_or(account);
        Ok(updated.into())
    }

    /// Soft-delete an account
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> ServiceResult<MessageResponse> {
        self.ctx
            .account_repo()
            .soft_delete(id)
            .await
            .map_err(|e| match e {
                DomainError::AccountNotFound(_) => ServiceError::not_found("User", id.to_string()),
                other => other.into(),
            })?;

        info!(account_id = id, "Account deleted by admin");
        Ok(MessageResponse::new("User deleted successfully"))
    }

    /// Enable or disable an account. Enabling also lifts any lock.
    #[instrument(skip(self))]
    pub async fn set_status(&self, id: i64, request: UpdateStatusRequest) -> ServiceResult<MessageResponse> {
        let status = parse_status(request.status)?;
        self.ctx
            .account_repo()
            .update_status(id, status)
            .await
            .map_err(|e| match e {
                DomainError::AccountNotFound(_) => ServiceError::not_found("User", id.to_string()),
                other => other.into(),
            })?;

        info!(account_id = id, status = status.as_i16(), "Account status changed");
        Ok(MessageResponse::new("Status updated successfully"))
    }

    /// Set a new password
    #[instrument(skip(self, request))]
    pub async fn set_password(&self, id: i64, request: SetPasswordRequest) -> ServiceResult<MessageResponse> {
        let password_hash = self.ctx.password_service().hash(&request.password)?;
        self.ctx
            .account_repo()
            .update_password(id, &password_hash)
            .await
            .map_err(|e| match e {
                DomainError::AccountNotFound(_) => ServiceError::not_found("User", id.to_string()),
                other => other.into(),
            })?;

        info!(account_id = id, "Password set by admin");
        Ok(MessageResponse::new("Password updated successfully"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::LoginRequest;
    use crate::services::AuthService;
    use crate::testing::TestHarness;
    use chrono::{Duration, Utc};

    fn create_request(username: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: "secret1".to_string(),
            email: email.to_string(),
            nickname: None,
            role: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_duplicates() {
        let harness = TestHarness::new();
        let admin = UserAdminService::new(&harness.ctx);

        let created = admin.create(create_request("zed_1", "z@x.com")).await.unwrap();
        assert_eq!(created.role, "user");
        assert_eq!(created.status, 1);

        let err = admin
            .create(create_request("zed_1", "other@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Username already exists");

        let err = admin
            .create(create_request("bad name", "b@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_list_pages_and_filters() {
        let harness = TestHarness::new();
        for i in 0..5 {
            harness.seed_account(&format!("user_{i}"), &format!("u{i}@x.com"), "password1");
        }
        let target = harness.seed_account("needle", "needle@x.com", "password1");
        harness
            .accounts
            .set_status(target.id, AccountStatus::Disabled);
        let admin = UserAdminService::new(&harness.ctx);

        let page = admin
            .list(ListUsersQuery {
                page: Some(1),
                page_size: Some(4),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.list.len(), 4);
        assert_eq!(page.list[0].username, "needle");

        let page = admin
            .list(ListUsersQuery {
                keyword: Some("NEED".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 20);

        let page = admin
            .list(ListUsersQuery {
                status: Some(0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let err = admin
            .list(ListUsersQuery {
                status: Some(7),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_detail_and_delete() {
        let harness = TestHarness::new();
        let account = harness.seed_account("amy_1", "amy@x.com", "password1");
        let admin = UserAdminService::new(&harness.ctx);

        let detail = admin.detail(account.id).await.unwrap();
        assert_eq!(detail.user.email, "amy@x.com");

        admin.delete(account.id).await.unwrap();
        let err = admin.detail(account.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "User not found");

        let err = admin.delete(account.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_update_checks_email_uniqueness() {
        let harness = TestHarness::new();
        let account = harness.seed_account("bea_1", "bea@x.com", "password1");
        harness.seed_account("cal_1", "cal@x.com", "password1");
        let admin = UserAdminService::new(&harness.ctx);

        let err = admin
            .update(
                account.id,
                UpdateUserRequest {
                    email: Some("cal@x.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email already exists");

        let updated = admin
            .update(
                account.id,
                UpdateUserRequest {
                    nickname: Some("Bea".into()),
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.nickname.as_deref(), Some("Bea"));
        assert_eq!(updated.role, "admin");
        assert_eq!(updated.email, "bea@x.com");
    }

    #[tokio::test]
    async fn test_enabling_clears_lock() {
        let harness = TestHarness::new();
        let account = harness.seed_account("dan_1", "dan@x.com", "password1");
        harness
            .accounts
            .set_lock(account.id, 3, Some(Utc::now() + Duration::minutes(10)));
        let admin = UserAdminService::new(&harness.ctx);

        admin
            .set_status(account.id, UpdateStatusRequest { status: 1 })
            .await
            .unwrap();
        let stored = harness.accounts.get(account.id).unwrap();
        assert_eq!(stored.login_failure, 0);
        assert!(stored.lock_until.is_none());

        let err = admin
            .set_status(account.id, UpdateStatusRequest { status: 2 })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_set_password_allows_login() {
        let harness = TestHarness::new();
        let account = harness.seed_account("eve_1", "eve@x.com", "password1");
        UserAdminService::new(&harness.ctx)
            .set_password(
                account.id,
                SetPasswordRequest {
                    password: "fresh-pass".into(),
                },
            )
            .await
            .unwrap();

        AuthService::new(&harness.ctx)
            .login(
                LoginRequest {
                    user_name: "eve_1".into(),
                    password: "fresh-pass".into(),
                },
                None,
                "127.0.0.1",
            )
            .await
            .unwrap();
    }
}
