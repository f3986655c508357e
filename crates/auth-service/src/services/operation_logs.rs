//! Operation log service
//!
//! Records admin actions and serves the audit listing, statistics and cleanup.

use auth_core::entities::NewOperationLog;
use auth_core::traits::OperationLogQuery;
use chrono::{DateTime, NaiveTime, Utc};
use tracing::{info, instrument, warn};

use crate::dto::{
    CleanLogsRequest, CleanLogsResponse, ListLogsQuery, OperationLogResponse,
    OperationLogStatsResponse, PageResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::paging::page_bounds;

fn from_unix(field: &str, secs: i64) -> ServiceResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| ServiceError::validation(format!("Invalid {field}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Operation log service
pub struct OperationLogService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> OperationLogService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Write a log entry in a detached task; failures are only logged.
    /// A missing username is resolved from `user_id` first.
    pub fn record(&self, mut log: NewOperationLog) {
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            if let (None, Some(id)) = (&log.username, log.user_id) {
                match ctx.account_repo().find_by_id(id).await {
                    Ok(account) => log.username = account.map(|a| a.username),
                    Err(e) => warn!(error = %e, account_id = id, "Operation log user lookup failed"),
                }
            }
            if let Err(e) = ctx.operation_log_repo().create(&log).await {
                warn!(error = %e, path = %log.path, "Failed to write operation log");
            }
        });
    }

    /// Filtered, paginated listing, newest first
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        query: ListLogsQuery,
    ) -> ServiceResult<PageResponse<OperationLogResponse>> {
        let (page, page_size) = page_bounds(query.page, query.page_size);
        let start_time = query
            .start_time
            .map(|t| from_unix("start_time", t))
            .transpose()?;
        let end_time = query
            .end_time
            .map(|t| from_unix("end_time", t))
            .transpose()?;

        let result = self
            .ctx
            .operation_log_repo()
            .list(&OperationLogQuery {
                page,
                page_size,
                user_id: query.user_id,
                username: non_empty(query.username),
                module: non_empty(query.module),
                action: non_empty(query.action),
                method: non_empty(query.method).map(|m| m.to_ascii_uppercase()),
                path: non_empty(query.path),
                ip: non_empty(query.ip),
                start_time,
                end_time,
            })
            .await?;

        Ok(PageResponse {
            list: result.items.into_iter().map(Into::into).collect(),
            total: result.total,
            page,
            page_size,
        })
    }

    /// Totals, today's count (since UTC midnight) and per-module/method counts
    #[instrument(skip(self))]
    pub async fn stats(&self) -> ServiceResult<OperationLogStatsResponse> {
        let today_start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let stats = self.ctx.operation_log_repo().stats(today_start).await?;
        Ok(stats.into())
    }

    /// Delete every entry created before `before_time`
    #[instrument(skip(self))]
    pub async fn clean(&self, request: CleanLogsRequest) -> ServiceResult<CleanLogsResponse> {
        let before = from_unix("before_time", request.before_time)?;
        let affected = self.ctx.operation_log_repo().delete_before(before).await?;

        info!(affected, before = %before, "Operation logs cleaned");
        Ok(CleanLogsResponse { affected })
    }
}
