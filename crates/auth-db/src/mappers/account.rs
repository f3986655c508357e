//! Account entity <-> model mapper

use auth_core::entities::{Account, AccountStatus, Role};

use crate::models::AccountModel;

/// Convert AccountModel to Account entity
impl From<AccountModel> for Account {
    fn from(model: AccountModel) -> Self {
        Account {
            id: model.id,
            username: model.username,
            email: model.email,
            nickname: model.nickname,
            // The column is constrained; an unknown value degrades to the least privilege
            role: model.role.parse().unwrap_or(Role::User),
            status: AccountStatus::from(model.status),
            login_failure: model.login_failure,
            lock_until: model.lock_until,
            last_login_at: model.last_login_at,
            last_login_ip: model.last_login_ip,
            join_ip: model.join_ip,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
