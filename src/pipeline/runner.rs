//! Drives one job from manifest to finished artifact.

use super::fetcher::SegmentFetcher;
use super::remux::Remuxer;
use crate::config::StorageConfig;
use crate::manifest::ManifestResolver;
use crate::state::{Job, JobRegistry, JobUpdate};
use hlsforged_common::{JobId, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// URL path under which finished artifacts are served.
pub fn download_url(id: JobId) -> String {
    format!("/download/{}", id.artifact_name())
}

/// Removes the merged container when the runner exits, however it exits.
struct MergeFileGuard {
    path: PathBuf,
}

impl Drop for MergeFileGuard {
    fn drop(&mut self) {
        remove_if_present(&self.path);
    }
}

fn remove_if_present(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {:?}: {}", path, e),
    }
}

/// Runs the fetch and remux stages for jobs, reporting into the registry.
pub struct TaskRunner {
    registry: Arc<JobRegistry>,
    resolver: Arc<dyn ManifestResolver>,
    fetcher: SegmentFetcher,
    remuxer: Arc<dyn Remuxer>,
    storage: StorageConfig,
}

impl TaskRunner {
    pub fn new(
        registry: Arc<JobRegistry>,
        resolver: Arc<dyn ManifestResolver>,
        fetcher: SegmentFetcher,
        remuxer: Arc<dyn Remuxer>,
        storage: StorageConfig,
    ) -> Self {
        Self {
            registry,
            resolver,
            fetcher,
            remuxer,
            storage,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Run a job to a terminal state. Never returns an error: failures are
    /// recorded on the job.
    pub async fn run(&self, job: Job) {
        let id = job.id;
        tracing::info!(job_id = %id, manifest = %job.manifest_url, "Job started");

        match self.process(&job).await {
            Ok(url) => {
                let recorded = self
                    .registry
                    .update(id, JobUpdate::Complete { download_url: url });
                if recorded {
                    tracing::info!(job_id = %id, "Job complete");
                } else {
                    // Reaped while still running; nobody can download it now.
                    tracing::warn!(job_id = %id, "Job record gone before completion, discarding artifact");
                    remove_if_present(&self.artifact_path(id));
                }
            }
            Err(e) => {
                tracing::error!(job_id = %id, "Job failed: {}", e);
                self.registry.update(
                    id,
                    JobUpdate::Error {
                        message: e.to_string(),
                    },
                );
            }
        }
    }

    fn artifact_path(&self, id: JobId) -> PathBuf {
        self.storage.converted_dir.join(id.artifact_name())
    }

    async fn process(&self, job: &Job) -> Result<String> {
        let id = job.id;
        let merge_path = self.storage.download_dir.join(id.container_name());
        let _guard = MergeFileGuard {
            path: merge_path.clone(),
        };

        let segments = self.resolver.resolve(&job.manifest_url).await?;

        self.registry.update(id, JobUpdate::Downloading);
        let summary = self
            .fetcher
            .fetch_all(&segments, &merge_path, |pct| {
                self.registry.update(id, JobUpdate::Progress(pct));
            })
            .await?;
        tracing::info!(
            job_id = %id,
            segments = summary.segments,
            bytes = summary.bytes,
            "Segments merged"
        );

        self.registry.update(id, JobUpdate::Converting);
        let artifact = self.artifact_path(id);
        let registry = &self.registry;
        let on_progress = move |pct: u8| {
            registry.update(id, JobUpdate::Progress(pct));
        };

        if let Err(e) = self
            .remuxer
            .remux(
                &merge_path,
                &artifact,
                job.audio_offset_centiseconds,
                &on_progress,
            )
            .await
        {
            remove_if_present(&artifact);
            return Err(e);
        }

        Ok(download_url(id))
    }
}
