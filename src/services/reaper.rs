use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::db::queries;
use crate::specs::jobs::{find_zombies, zombie_cutoff};

/// Fails jobs that still claim to be active but stopped updating.
pub struct ZombieReaper {
    pool: PgPool,
    threshold: Duration,
}

impl ZombieReaper {
    pub fn new(pool: PgPool, threshold: Duration) -> Self {
        Self { pool, threshold }
    }

    /// Run one pass as of `now`. Returns the ids of the jobs marked failed.
    pub async fn reap_once(&self, now: DateTime<Utc>) -> Result<Vec<String>, ReaperError> {
        let cutoff = zombie_cutoff(now, self.threshold);
        let filter = find_zombies(now, cutoff);
        tracing::debug!(%cutoff, %filter, "Looking for zombie jobs");

        let reaped = queries::fail_jobs(&self.pool, &filter, &zombie_message(cutoff)).await?;

        for id in &reaped {
            tracing::warn!(job_id = %id, %cutoff, "Marked zombie job as failed");
        }
        Ok(reaped)
    }
}

/// Status message recorded on a reaped job.
pub fn zombie_message(cutoff: DateTime<Utc>) -> String {
    format!("Job determined to be a zombie: no update since {}", cutoff.to_rfc3339())
}

#[derive(Debug, thiserror::Error)]
pub enum ReaperError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
