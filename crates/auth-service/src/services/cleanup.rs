//! Background verification-code sweeper
//!
//! Runs once at start-up and then on a fixed interval: expired codes are
//! soft-deleted, and disposed codes older than the retention window are
//! hard-deleted. Failures are logged and the loop keeps going.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::codes::VerificationCodeManager;
use super::context::ServiceContext;

/// Interval used when the configured one is zero
pub const DEFAULT_CLEANUP_INTERVAL_MINUTES: u32 = 10;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug)]
struct CleanupState {
    running: bool,
    interval_minutes: u32,
    last_run: Option<DateTime<Utc>>,
}

/// Process-local record of the sweeper, shared between the task and the HTTP layer
#[derive(Debug)]
pub struct CleanupStatus {
    inner: RwLock<CleanupState>,
}

/// Point-in-time view of [`CleanupStatus`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupStatusSnapshot {
    pub running: bool,
    pub interval_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cleanup_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cleanup_time: Option<String>,
}

impl CleanupStatus {
    pub fn new(interval_minutes: u32) -> Self {
        let interval_minutes = if interval_minutes == 0 {
            DEFAULT_CLEANUP_INTERVAL_MINUTES
        } else {
            interval_minutes
        };
        Self {
            inner: RwLock::new(CleanupState {
                running: false,
                interval_minutes,
                last_run: None,
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.inner.read().interval_minutes) * 60)
    }

    pub fn set_running(&self, running: bool) {
        self.inner.write().running = running;
    }

    pub fn record_run(&self, at: DateTime<Utc>) {
        self.inner.write().last_run = Some(at);
    }

    pub fn snapshot(&self) -> CleanupStatusSnapshot {
        let state = self.inner.read();
        let next = state
            .last_run
            .map(|last| last + chrono::Duration::minutes(i64::from(state.interval_minutes)));

        CleanupStatusSnapshot {
            running: state.running,
            interval_minutes: state.interval_minutes,
            last_cleanup_time: state.last_run.map(|t| t.format(TIME_FORMAT).to_string()),
            next_cleanup_time: next.map(|t| t.format(TIME_FORMAT).to_string()),
        }
    }
}

/// Counts from one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: u64,
    pub purged: u64,
}

/// Periodic code sweeper
pub struct CodeSweeper {
    ctx: ServiceContext,
}

impl CodeSweeper {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// One sweep. Store errors are logged and reported as zero.
    pub async fn run_once(&self) -> SweepReport {
        let codes = VerificationCodeManager::new(&self.ctx);
        let mut report = SweepReport::default();

        match codes.sweep_expired().await {
            Ok(n) => report.expired = n,
            Err(e) => error!(error = %e, "Failed to soft-delete expired verification codes"),
        }

        let retention = self.ctx.config().security.code_retention_days;
        match codes.purge_old(retention).await {
            Ok(n) => report.purged = n,
            Err(e) => error!(error = %e, "Failed to purge old verification codes"),
        }

        self.ctx.cleanup_status().record_run(Utc::now());
        if report.expired > 0 || report.purged > 0 {
            info!(
                expired = report.expired,
                purged = report.purged,
                "Verification code sweep finished"
            );
        }
        report
    }

    /// Run until `shutdown` turns true or its sender is dropped
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let status = self.ctx.cleanup_status().clone();
            let period = status.interval();
            status.set_running(true);
            info!(interval_secs = period.as_secs(), "Code sweeper started");

            // First tick completes immediately
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            status.set_running(false);
            info!("Code sweeper stopped");
        })
    }
}
