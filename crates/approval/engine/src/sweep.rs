//! Periodic re-notification of stalled reviews
//!
//! A sweep never transitions workflow state; it only re-sends review
//! notifications for stages that have sat in `PendingApproval` past the
//! configured age. Running it twice in a row just notifies twice, so it
//! is safe alongside live decisions.

use crate::service::ApprovalService;
use chrono::Duration;
use std::sync::Arc;
use tracing::info;

pub struct StaleSweeper {
    service: Arc<ApprovalService>,
    max_age: Duration,
}

impl StaleSweeper {
    pub fn new(service: Arc<ApprovalService>, max_age: Duration) -> Self {
        Self { service, max_age }
    }

    /// One pass over all instances; returns how many stale stages were
    /// re-notified
    pub async fn sweep(&self) -> usize {
        let renotified = self.service.renotify_stale(self.max_age).await;
        if renotified > 0 {
            info!(stages = renotified, "stale sweep re-notified reviewers");
        }
        renotified
    }

    /// Sweep on a fixed period until the task is aborted
    pub async fn run(&self, period: std::time::Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }
}
