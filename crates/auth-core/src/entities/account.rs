//! Account entity - a registered user of the system

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role. The system only distinguishes regular users from admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Account status, stored as a small integer (1 = active, 0 = disabled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i16)]
pub enum AccountStatus {
    Disabled = 0,
    #[default]
    Active = 1,
}

impl AccountStatus {
    #[inline]
    #[must_use]
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    /// Parse the stored representation, rejecting unknown values
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Disabled),
            1 => Some(Self::Active),
            _ => None,
        }
    }
}

impl From<i16> for AccountStatus {
    fn from(value: i16) -> Self {
        // Anything that is not explicitly active cannot authenticate
        Self::from_code(value).unwrap_or(Self::Disabled)
    }
}

impl From<AccountStatus> for i16 {
    fn from(status: AccountStatus) -> Self {
        status as i16
    }
}

/// Account entity. The password hash is deliberately kept out of it and is
/// only loaded on demand through the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub nickname: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub login_failure: i32,
    pub lock_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub join_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether a lock is in force at `now`
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }

    /// Name shown in the admin surface, falling back to the username
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.username)
    }
}

/// Data required to insert a new account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub nickname: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
    pub join_ip: Option<String>,
}

impl NewAccount {
    /// A self-registered account: regular role, active
    pub fn registered(
        username: String,
        email: String,
        password_hash: String,
        join_ip: Option<String>,
    ) -> Self {
        Self {
            username,
            email,
            nickname: None,
            password_hash,
            role: Role::User,
            status: AccountStatus::Active,
            join_ip,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_account() -> Account {
    let now = Utc::now();
    Account {
        id: 1,
        username: "bob_01".to_string(),
        email: "a@x.com".to_string(),
        nickname: None,
        role: Role::User,
        status: AccountStatus::Active,
        login_failure: 0,
        lock_until: None,
        last_login_at: None,
        last_login_ip: None,
        join_ip: None,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AccountStatus::from(1), AccountStatus::Active);
        assert_eq!(AccountStatus::from(0), AccountStatus::Disabled);
        // Unknown values never authenticate
        assert_eq!(AccountStatus::from(7), AccountStatus::Disabled);
        assert_eq!(AccountStatus::from_code(7), None);
        assert_eq!(i16::from(AccountStatus::Active), 1);
    }

    #[test]
    fn test_is_locked_at() {
        let now = Utc::now();
        let mut account = sample_account();
        assert!(!account.is_locked_at(now));

        account.lock_until = Some(now + Duration::minutes(5));
        assert!(account.is_locked_at(now));

        account.lock_until = Some(now - Duration::seconds(1));
        assert!(!account.is_locked_at(now));
    }

    #[test]
    fn test_registered_defaults() {
        let new = NewAccount::registered(
            "bob_01".to_string(),
            "a@x.com".to_string(),
            "hash".to_string(),
            None,
        );
        assert_eq!(new.role, Role::User);
        assert_eq!(new.status, AccountStatus::Active);
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut account = sample_account();
        assert_eq!(account.display_name(), "bob_01");
        account.nickname = Some("Bob".to_string());
        assert_eq!(account.display_name(), "Bob");
    }
}
