//! Run a maintenance job once, outside the server.
//!
//! ```bash
//! shopx jobs expire-discounts
//! shopx jobs complete-orders
//! shopx jobs send-scheduled
//! ```
//!
//! Useful when the server runs with `SHOPX_ENABLE_JOBS=false` and the jobs
//! are driven by an external scheduler instead.

use chrono::Utc;

use shopx_server::jobs::Job;

/// Run `job` once against the configured database.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the job fails.
pub async fn run(job: Job) -> Result<u64, Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let affected = job.run_once(&pool, Utc::now()).await?;
    tracing::info!(job = %job, affected, "Job finished");
    Ok(affected)
}
