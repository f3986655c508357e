//! Entity to model mappers
//!
//! Conversions from database rows (models) to domain entities (auth-core).

mod account;
mod operation_log;
mod verification_code;
