//! Account lockout policy
//!
//! Pure decisions over [`Account`] fields. Persisting the outcome is the
//! repository's job; the increment and the conditional lock must be applied
//! in a single statement so concurrent failures never under- or over-lock.

use chrono::{DateTime, Duration, Utc};

use crate::entities::Account;

/// Lock state of an account at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No lock recorded
    Unlocked,
    /// Lock in force; login must be rejected without checking the password
    Locked { remaining_minutes: i64 },
    /// A lock was recorded but has elapsed and should be cleared
    Lapsed,
}

/// Threshold and duration governing failed-login lockout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    max_failures: i32,
    lock_duration: Duration,
}

impl LockoutPolicy {
    /// Create a policy. A threshold of zero is treated as one.
    pub fn new(max_failures: u32, lock_minutes: u32) -> Self {
        Self {
            max_failures: i32::try_from(max_failures.max(1)).unwrap_or(i32::MAX),
            lock_duration: Duration::minutes(i64::from(lock_minutes)),
        }
    }

    #[inline]
    pub fn max_failures(&self) -> i32 {
        self.max_failures
    }

    #[inline]
    pub fn lock_duration(&self) -> Duration {
        self.lock_duration
    }

    /// Evaluate the lock gate. Only the lock expiry gates login; the failure
    /// counter alone never blocks.
    pub fn evaluate(&self, account: &Account, now: DateTime<Utc>) -> LockState {
        match account.lock_until {
            None => LockState::Unlocked,
            Some(until) if until > now => LockState::Locked {
                remaining_minutes: remaining_minutes(until, now),
            },
            Some(_) => LockState::Lapsed,
        }
    }

    /// Lock expiry to store if the incremented counter reaches the threshold
    pub fn lock_until_after_failure(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.lock_duration
    }

    /// Whether `failures` consecutive failures trigger a lock
    #[inline]
    pub fn reaches_threshold(&self, failures: i32) -> bool {
        failures >= self.max_failures
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::new(5, 10)
    }
}

/// Whole minutes left on a lock, rounded up and never below one
fn remaining_minutes(until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (until - now).num_seconds();
    ((secs + 59) / 60).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sample_account;

    #[test]
    fn test_unlocked_without_lock() {
        let policy = LockoutPolicy::default();
        let account = sample_account();
        assert_eq!(policy.evaluate(&account, Utc::now()), LockState::Unlocked);
    }

    #[test]
    fn test_counter_alone_does_not_lock() {
        let policy = LockoutPolicy::new(5, 10);
        let mut account = sample_account();
        account.login_failure = 9;
        assert_eq!(policy.evaluate(&account, Utc::now()), LockState::Unlocked);
    }

    #[test]
    fn test_locked_reports_remaining_minutes() {
        let policy = LockoutPolicy::new(5, 10);
        let now = Utc::now();
        let mut account = sample_account();

        account.lock_until = Some(now + Duration::minutes(10));
        assert_eq!(
            policy.evaluate(&account, now),
            LockState::Locked { remaining_minutes: 10 }
        );

        account.lock_until = Some(now + Duration::seconds(61));
        assert_eq!(
            policy.evaluate(&account, now),
            LockState::Locked { remaining_minutes: 2 }
        );

        // Less than a minute left still reports a positive value
        account.lock_until = Some(now + Duration::seconds(5));
        assert_eq!(
            policy.evaluate(&account, now),
            LockState::Locked { remaining_minutes: 1 }
        );
    }

    #[test]
    fn test_lapsed_lock() {
        let policy = LockoutPolicy::default();
        let now = Utc::now();
        let mut account = sample_account();
        account.lock_until = Some(now);
        assert_eq!(policy.evaluate(&account, now), LockState::Lapsed);
    }

    #[test]
    fn test_threshold() {
        let policy = LockoutPolicy::new(5, 10);
        assert!(!policy.reaches_threshold(4));
        assert!(policy.reaches_threshold(5));
        assert!(policy.reaches_threshold(6));

        let now = Utc::now();
        assert_eq!(policy.lock_until_after_failure(now), now + Duration::minutes(10));
    }

    #[test]
    fn test_zero_threshold_clamped() {
        assert_eq!(LockoutPolicy::new(0, 10).max_failures(), 1);
    }
}
