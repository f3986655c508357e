//! Route handlers
//!
//! All HTTP request handlers organized by area.

pub mod account;
pub mod admin_logs;
pub mod admin_users;
pub mod auth;
pub mod health;
pub mod system;
