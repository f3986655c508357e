//! PostgreSQL implementations of the email template and email log repositories

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use auth_core::entities::{EmailTemplate, NewEmailLog};
use auth_core::traits::{EmailLogRepository, EmailTemplateRepository, RepoResult};

use crate::models::EmailTemplateModel;

use super::error::map_db_error;

/// PostgreSQL implementation of EmailTemplateRepository
#[derive(Clone)]
pub struct PgEmailTemplateRepository {
    pool: PgPool,
}

impl PgEmailTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailTemplateRepository for PgEmailTemplateRepository {
    #[instrument(skip(self))]
    async fn find_enabled(&self, name: &str, lang: &str) -> RepoResult<Option<EmailTemplate>> {
        let result = sqlx::query_as::<_, EmailTemplateModel>(
            r"
            SELECT id, name, lang, subject, content, status, updated_at
            FROM email_templates
            WHERE name = $1 AND lang = $2 AND status = 1
            ",
        )
        .bind(name)
        .bind(lang)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(EmailTemplate::from))
    }
}

/// PostgreSQL implementation of EmailLogRepository
#[derive(Clone)]
pub struct PgEmailLogRepository {
    pool: PgPool,
}

impl PgEmailLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailLogRepository for PgEmailLogRepository {
    #[instrument(skip(self, log), fields(to = %log.to_email))]
    async fn create(&self, log: &NewEmailLog) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO email_logs (to_email, subject, content, template_name, status, error_msg)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&log.to_email)
        .bind(&log.subject)
        .bind(&log.content)
        .bind(&log.template_name)
        .bind(i16::from(log.status))
        .bind(&log.error_msg)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repos_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgEmailTemplateRepository>();
        assert_send_sync::<PgEmailLogRepository>();
    }
}
