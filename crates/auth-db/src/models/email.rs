//! Email template database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for email_templates table
#[derive(Debug, Clone, FromRow)]
pub struct EmailTemplateModel {
    pub id: i64,
    pub name: String,
    pub lang: String,
    pub subject: String,
    pub content: String,
    pub status: i16,
    pub updated_at: DateTime<Utc>,
}
