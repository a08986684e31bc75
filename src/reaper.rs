//! Expiration-driven cleanup of finished work.

use crate::state::JobRegistry;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Evicts job records older than the expiration window, deleting their
/// artifacts first.
#[derive(Clone)]
pub struct Reaper {
    registry: Arc<JobRegistry>,
    converted_dir: PathBuf,
    expiration: chrono::Duration,
}

impl Reaper {
    pub fn new(registry: Arc<JobRegistry>, converted_dir: PathBuf, expiration: Duration) -> Self {
        Self {
            registry,
            converted_dir,
            expiration: chrono::Duration::from_std(expiration)
                .unwrap_or_else(|_| chrono::Duration::days(36_500)),
        }
    }

    /// Run one sweep now. Returns the number of evicted jobs.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Run one sweep as of `now`.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;

        for id in self.registry.list_ids() {
            let Some(job) = self.registry.get(id) else {
                continue;
            };
            if !job.is_expired(now, self.expiration) {
                continue;
            }

            // Record first: a runner finishing after this point sees its
            // completion rejected and discards the artifact itself.
            if self.registry.remove(id).is_none() {
                continue;
            }
            evicted += 1;

            let artifact = self.converted_dir.join(id.artifact_name());
            match std::fs::remove_file(&artifact) {
                Ok(()) => tracing::debug!(job_id = %id, "Deleted artifact {:?}", artifact),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(job_id = %id, "Failed to delete artifact {:?}: {}", artifact, e)
                }
            }
        }

        if evicted > 0 {
            tracing::info!("Reaper evicted {} expired job(s)", evicted);
        }
        evicted
    }
}

/// Start a background task that sweeps every `interval`.
pub fn start_reaper_task(reaper: Reaper, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            reaper.sweep();
        }
    })
}
