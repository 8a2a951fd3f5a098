//! Periodic maintenance jobs.
//!
//! Each job runs on its own tokio task until the shared
//! [`CancellationToken`] is cancelled. The same jobs can be run once from
//! the CLI through [`Job::run_once`].

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::services::ServiceResult;
use crate::services::discounts::DiscountService;
use crate::services::notifications::NotificationService;
use crate::services::orders::OrderService;

/// When a job first runs, how often it repeats, and how soon it retries
/// after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub initial_delay: Duration,
    pub every: Duration,
    pub retry_after: Duration,
}

impl Schedule {
    /// Wait before the next run, given how the last one went.
    #[must_use]
    pub const fn next_delay(&self, succeeded: bool) -> Duration {
        if succeeded { self.every } else { self.retry_after }
    }
}

/// The maintenance jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Complete delivered orders whose refund window has closed.
    CompleteOrders,
    /// Deactivate discount codes past their end date.
    ExpireDiscounts,
    /// Send notification drafts whose scheduled time has come.
    SendScheduled,
}

impl Job {
    pub const ALL: [Self; 3] = [Self::CompleteOrders, Self::ExpireDiscounts, Self::SendScheduled];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CompleteOrders => "complete-orders",
            Self::ExpireDiscounts => "expire-discounts",
            Self::SendScheduled => "send-scheduled",
        }
    }

    #[must_use]
    pub const fn schedule(self) -> Schedule {
        const MINUTE: u64 = 60;
        match self {
            Self::CompleteOrders => Schedule {
                initial_delay: Duration::from_secs(MINUTE),
                every: Duration::from_secs(6 * 60 * MINUTE),
                retry_after: Duration::from_secs(10 * MINUTE),
            },
            Self::ExpireDiscounts => Schedule {
                initial_delay: Duration::from_secs(MINUTE),
                every: Duration::from_secs(60 * MINUTE),
                retry_after: Duration::from_secs(60 * MINUTE),
            },
            Self::SendScheduled => Schedule {
                initial_delay: Duration::from_secs(MINUTE),
                every: Duration::from_secs(5 * MINUTE),
                retry_after: Duration::from_secs(5 * MINUTE),
            },
        }
    }

    /// Run the job once and return how many rows it touched.
    ///
    /// # Errors
    ///
    /// Returns the service error of the underlying operation.
    pub async fn run_once(self, pool: &PgPool, now: DateTime<Utc>) -> ServiceResult<u64> {
        match self {
            Self::CompleteOrders => OrderService::new(pool).complete_delivered(now).await,
            Self::ExpireDiscounts => DiscountService::new(pool).expire(now).await,
            Self::SendScheduled => {
                let sent = NotificationService::new(pool).send_due(now).await?;
                Ok(u64::try_from(sent).unwrap_or(u64::MAX))
            }
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spawn every job on its own task.
#[must_use]
pub fn spawn_all(pool: &PgPool, shutdown: &CancellationToken) -> Vec<JoinHandle<()>> {
    Job::ALL
        .into_iter()
        .map(|job| tokio::spawn(run_loop(job, pool.clone(), shutdown.clone())))
        .collect()
}

#[tracing::instrument(name = "job", skip_all, fields(job = %job))]
async fn run_loop(job: Job, pool: PgPool, shutdown: CancellationToken) {
    let schedule = job.schedule();
    tracing::info!(every_secs = schedule.every.as_secs(), "Job started");

    let mut delay = schedule.initial_delay;
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        let succeeded = match job.run_once(&pool, Utc::now()).await {
            Ok(affected) => {
                tracing::debug!(affected, "Job run finished");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Job run failed");
                false
            }
        };
        delay = schedule.next_delay(succeeded);
    }

    tracing::info!("Job stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_complete_schedule() {
        let schedule = Job::CompleteOrders.schedule();
        assert_eq!(schedule.initial_delay, Duration::from_secs(60));
        assert_eq!(schedule.next_delay(true), Duration::from_secs(6 * 3600));
        assert_eq!(schedule.next_delay(false), Duration::from_secs(600));
    }

    #[test]
    fn test_other_schedules() {
        assert_eq!(Job::ExpireDiscounts.schedule().every, Duration::from_secs(3600));
        assert_eq!(Job::SendScheduled.schedule().every, Duration::from_secs(300));
    }

    #[test]
    fn test_names_are_distinct() {
        let names: std::collections::HashSet<_> = Job::ALL.iter().map(|j| j.name()).collect();
        assert_eq!(names.len(), Job::ALL.len());
        assert_eq!(Job::SendScheduled.to_string(), "send-scheduled");
    }

    #[tokio::test]
    async fn test_loop_stops_on_cancel() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let shutdown = CancellationToken::new();
        let handles = spawn_all(&pool, &shutdown);
        shutdown.cancel();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .unwrap()
                .unwrap();
        }
    }
}
