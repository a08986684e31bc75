//! Job processing: submission, per-job runners and shutdown draining.

pub mod fetcher;
pub mod remux;
pub mod runner;

pub use fetcher::{FetchSummary, SegmentFetcher};
pub use remux::{FfmpegRemuxer, ProgressFn, Remuxer};
pub use runner::{download_url, TaskRunner};

use crate::config::Config;
use crate::manifest::{validate_manifest_reference, HttpManifestResolver};
use crate::state::{Job, JobRegistry, JobUpdate};
use hlsforged_common::{Error, JobId, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

/// Accepts submissions and supervises one runner task per job.
pub struct JobManager {
    runner: Arc<TaskRunner>,
    tracker: TaskTracker,
    permits: Option<Arc<Semaphore>>,
}

impl JobManager {
    /// `max_concurrent` bounds how many jobs run at once; 0 means no bound.
    /// Jobs waiting for a slot stay in `starting`.
    pub fn new(runner: TaskRunner, max_concurrent: usize) -> Self {
        let permits = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));
        Self {
            runner: Arc::new(runner),
            tracker: TaskTracker::new(),
            permits,
        }
    }

    /// Wire the HTTP resolver/fetcher and the ffmpeg remuxer from config.
    pub fn from_config(config: &Config, registry: Arc<JobRegistry>) -> anyhow::Result<Self> {
        let client = config.fetch.build_client()?;
        let remuxer = FfmpegRemuxer::from_config(&config.remux)?;

        let runner = TaskRunner::new(
            registry,
            Arc::new(HttpManifestResolver::new(client.clone())),
            SegmentFetcher::new(client),
            Arc::new(remuxer),
            config.storage.clone(),
        );

        Ok(Self::new(runner, config.jobs.max_concurrent))
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        self.runner.registry()
    }

    /// Create a job and start processing it in the background.
    ///
    /// Returns as soon as the record exists; the job is visible to pollers
    /// immediately in `starting`.
    pub fn submit(&self, manifest_reference: &str, audio_offset_centiseconds: i32) -> Result<JobId> {
        if self.tracker.is_closed() {
            return Err(Error::internal("server is shutting down"));
        }

        let url = validate_manifest_reference(manifest_reference)?;
        let job = Job::new(url.as_str(), audio_offset_centiseconds);
        let id = job.id;
        self.registry().create(job.clone())?;

        tracing::info!(
            job_id = %id,
            manifest = %url,
            audio_offset_centiseconds,
            "Job submitted"
        );

        let runner = self.runner.clone();
        let permits = self.permits.clone();
        self.tracker.spawn(async move {
            let registry = runner.registry().clone();

            let _permit = match permits {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        registry.update(
                            id,
                            JobUpdate::Error {
                                message: "Job scheduler closed".to_string(),
                            },
                        );
                        return;
                    }
                },
                None => None,
            };

            // Run on its own task so a panic surfaces as a JoinError here.
            let handle = tokio::spawn(async move { runner.run(job).await });
            if let Err(e) = handle.await {
                tracing::error!(job_id = %id, "Job task aborted: {}", e);
                registry.update(
                    id,
                    JobUpdate::Error {
                        message: "Internal error: job processing aborted".to_string(),
                    },
                );
            }
        });

        Ok(id)
    }

    /// Number of runner tasks not yet finished (including waiting ones).
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting jobs and wait up to `grace` for in-flight ones.
    /// Returns `true` if everything finished in time.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!("Waiting for {} in-flight job(s)", pending);
        }

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    "{} job(s) still running after {:?}, abandoning them",
                    self.tracker.len(),
                    grace
                );
                false
            }
        }
    }
}

/// Delete merged containers left in `dir` by a previous process.
pub fn purge_stale_containers(dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "ts") {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove stale container {:?}: {}", path, e),
            }
        }
    }
    Ok(removed)
}
