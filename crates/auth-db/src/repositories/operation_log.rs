//! PostgreSQL implementation of OperationLogRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use auth_core::entities::{NewOperationLog, OperationLog};
use auth_core::traits::{
    NamedCount, OperationLogQuery, OperationLogRepository, OperationLogStats, Page, RepoResult,
};

use crate::models::{NamedCountModel, OperationLogModel};

use super::account::escape_like;
use super::error::map_db_error;

/// PostgreSQL implementation of OperationLogRepository
#[derive(Clone)]
pub struct PgOperationLogRepository {
    pool: PgPool,
}

impl PgOperationLogRepository {
    /// Create a new PgOperationLogRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn like_pattern(term: Option<&str>) -> Option<String> {
    term.filter(|t| !t.is_empty())
        .map(|t| format!("%{}%", escape_like(t)))
}

#[async_trait]
impl OperationLogRepository for PgOperationLogRepository {
    #[instrument(skip(self, log), fields(module = %log.module, path = %log.path))]
    async fn create(&self, log: &NewOperationLog) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO operation_logs (user_id, username, module, action, method, path, ip,
                                        user_agent, request_body, response_body, status_code,
                                        duration_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(log.user_id)
        .bind(&log.username)
        .bind(&log.module)
        .bind(&log.action)
        .bind(&log.method)
        .bind(&log.path)
        .bind(&log.ip)
        .bind(&log.user_agent)
        .bind(&log.request_body)
        .bind(&log.response_body)
        .bind(log.status_code)
        .bind(log.duration_ms)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &OperationLogQuery) -> RepoResult<Page<OperationLog>> {
        let username = like_pattern(query.username.as_deref());
        let path = like_pattern(query.path.as_deref());

        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM operation_logs
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::TEXT IS NULL OR username ILIKE $2)
              AND ($3::TEXT IS NULL OR module = $3)
              AND ($4::TEXT IS NULL OR action = $4)
              AND ($5::TEXT IS NULL OR method = $5)
              AND ($6::TEXT IS NULL OR path ILIKE $6)
              AND ($7::TEXT IS NULL OR ip = $7)
              AND ($8::TIMESTAMPTZ IS NULL OR created_at >= $8)
              AND ($9::TIMESTAMPTZ IS NULL OR created_at <= $9)
            ",
        )
        .bind(query.user_id)
        .bind(&username)
        .bind(&query.module)
        .bind(&query.action)
        .bind(&query.method)
        .bind(&path)
        .bind(&query.ip)
        .bind(query.start_time)
        .bind(query.end_time)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        let rows = sqlx::query_as::<_, OperationLogModel>(
            r"
            SELECT id, user_id, username, module, action, method, path, ip, user_agent,
                   request_body, response_body, status_code, duration_ms, created_at
            FROM operation_logs
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::TEXT IS NULL OR username ILIKE $2)
              AND ($3::TEXT IS NULL OR module = $3)
              AND ($4::TEXT IS NULL OR action = $4)
              AND ($5::TEXT IS NULL OR method = $5)
              AND ($6::TEXT IS NULL OR path ILIKE $6)
              AND ($7::TEXT IS NULL OR ip = $7)
              AND ($8::TIMESTAMPTZ IS NULL OR created_at >= $8)
              AND ($9::TIMESTAMPTZ IS NULL OR created_at <= $9)
            ORDER BY id DESC
            LIMIT $10 OFFSET $11
            ",
        )
        .bind(query.user_id)
        .bind(&username)
        .bind(&query.module)
        .bind(&query.action)
        .bind(&query.method)
        .bind(&path)
        .bind(&query.ip)
        .bind(query.start_time)
        .bind(query.end_time)
        .bind(query.page_size)
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Page {
            items: rows.into_iter().map(OperationLog::from).collect(),
            total,
        })
    }

    #[instrument(skip(self))]
    async fn stats(&self, today_start: DateTime<Utc>) -> RepoResult<OperationLogStats> {
        let (total_count, today_count) = sqlx::query_as::<_, (i64, i64)>(
            r"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE created_at >= $1)
            FROM operation_logs
            ",
        )
        .bind(today_start)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        let module_stats = sqlx::query_as::<_, NamedCountModel>(
            r"
            SELECT module AS name, COUNT(*) AS count
            FROM operation_logs
            GROUP BY module
            ORDER BY count DESC, module
            LIMIT 10
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        let method_stats = sqlx::query_as::<_, NamedCountModel>(
            r"
            SELECT method AS name, COUNT(*) AS count
            FROM operation_logs
            GROUP BY method
            ORDER BY count DESC, method
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(OperationLogStats {
            total_count,
            today_count,
            module_stats: module_stats.into_iter().map(NamedCount::from).collect(),
            method_stats: method_stats.into_iter().map(NamedCount::from).collect(),
        })
    }

    #[instrument(skip(self))]
    async fn delete_before(&self, before: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM operation_logs WHERE created_at < $1
            ",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
