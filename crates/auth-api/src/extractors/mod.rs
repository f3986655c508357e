//! Axum extractors for request handling
//!
//! Custom extractors for authentication, validation, and request metadata.

mod auth;
mod client;
mod path;
mod validated;

pub use auth::{AdminUser, AuthUser};
pub use client::{AcceptLanguage, CaptchaHeaders, ClientIp, UNKNOWN_IP};
pub use path::IdPath;
pub use validated::{JsonBody, QueryParams, ValidatedJson};
