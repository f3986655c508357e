//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use auth_common::auth::TokenPair;
use auth_core::entities::{Account, OperationLog};
use auth_core::traits::{NamedCount, OperationLogStats};

use super::responses::{
    AccountResponse, LoginResponse, NamedCountResponse, OperationLogResponse,
    OperationLogStatsResponse, ProfileResponse, TokenResponse,
};

// ============================================================================
// Auth Mappers
// ============================================================================

impl LoginResponse {
    /// Combine an authenticated account with its freshly issued pair
    pub fn new(account: &Account, tokens: TokenPair) -> Self {
        Self {
            id: account.id,
            user_name: account.username.clone(),
            email: account.email.clone(),
            role: vec![account.role.as_str().to_string()],
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
        }
    }
}

impl From<TokenPair> for TokenResponse {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
        }
    }
}

impl From<&Account> for ProfileResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            user_name: account.username.clone(),
            email: account.email.clone(),
            nickname: account.nickname.clone(),
            role: vec![account.role.as_str().to_string()],
            last_login_at: account.last_login_at,
            created_at: account.created_at,
        }
    }
}

// ============================================================================
// Admin Mappers
// ============================================================================

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            nickname: account.nickname.clone(),
            role: account.role.as_str().to_string(),
            status: account.status.as_i16(),
            login_failure: account.login_failure,
            lock_until: account.lock_until,
            last_login_at: account.last_login_at,
            last_login_ip: account.last_login_ip.clone(),
            join_ip: account.join_ip.clone(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self::from(&account)
    }
}

impl From<OperationLog> for OperationLogResponse {
    fn from(log: OperationLog) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            username: log.username,
            module: log.module,
            action: log.action,
            method: log.method,
            path: log.path,
            ip: log.ip,
            user_agent: log.user_agent,
            request_body: log.request_body,
            response_body: log.response_body,
            status_code: log.status_code,
            duration_ms: log.duration_ms,
            created_at: log.created_at,
        }
    }
}

impl From<NamedCount> for NamedCountResponse {
    fn from(count: NamedCount) -> Self {
        Self {
            name: count.name,
            count: count.count,
        }
    }
}

impl From<OperationLogStats> for OperationLogStatsResponse {
    fn from(stats: OperationLogStats) -> Self {
        Self {
            total_count: stats.total_count,
            today_count: stats.today_count,
            module_stats: stats.module_stats.into_iter().map(Into::into).collect(),
            method_stats: stats.method_stats.into_iter().map(Into::into).collect(),
        }
    }
}
