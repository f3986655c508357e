//! Username shape rule

use std::sync::LazyLock;

use regex::Regex;

use crate::error::DomainError;

/// Human readable form of the rule, returned to callers
pub const USERNAME_RULE: &str =
    "Username must be 3-50 characters long and contain only letters, numbers, and underscores";

static USERNAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,50}$").ok());

/// Check a username against the allowed shape
pub fn validate_username(username: &str) -> Result<(), DomainError> {
    let valid = USERNAME_RE
        .as_ref()
        .is_some_and(|re| re.is_match(username));
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidUsername(USERNAME_RULE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        for name in ["bob_01", "abc", "A_B_C", &"x".repeat(50)] {
            assert!(validate_username(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_usernames() {
        for name in ["ab", "", "bob-01", "bob 01", "bób", &"x".repeat(51)] {
            assert!(validate_username(name).is_err(), "{name} should be invalid");
        }
    }

    #[test]
    fn test_error_carries_rule() {
        let err = validate_username("a").unwrap_err();
        assert_eq!(err.to_string(), format!("Invalid username: {USERNAME_RULE}"));
    }
}
