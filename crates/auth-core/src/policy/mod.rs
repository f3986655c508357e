//! Security policies applied by the authentication flows

mod lockout;
mod username;

pub use lockout::{LockState, LockoutPolicy};
pub use username::{validate_username, USERNAME_RULE};
