//! # auth-db
//!
//! Database layer implementing repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations for all repository traits
//! defined in `auth-core`. It handles:
//!
//! - Connection pool management and migrations
//! - Database models with SQLx `FromRow` derives
//! - Model → entity mappers
//! - Repository implementations, including the transactional credential flows
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_db::pool::{create_pool, run_migrations, PoolSettings};
//! use auth_db::repositories::PgAccountRepository;
//!
//! async fn example(config: &auth_common::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&PoolSettings::from(&config.database)).await?;
//!     run_migrations(&pool).await?;
//!     let account_repo = PgAccountRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, PgPool, PoolSettings};
pub use repositories::{
    PgAccountRepository, PgCredentialRepository, PgEmailLogRepository, PgEmailTemplateRepository,
    PgOperationLogRepository, PgVerificationCodeRepository,
};
