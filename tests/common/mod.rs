//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires a real registry, manifest resolver
//! and segment fetcher to a scripted [`Remuxer`] so the whole pipeline runs
//! without ffmpeg. Segment servers are mocked with wiremock.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use hlsforged::config::Config;
use hlsforged::manifest::HttpManifestResolver;
use hlsforged::pipeline::{JobManager, ProgressFn, Remuxer, SegmentFetcher, TaskRunner};
use hlsforged::server::{create_router, AppContext};
use hlsforged::state::{Job, JobRegistry};
use hlsforged_common::{Error, JobId, Result};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Copies the merged container to the output and reports 50% then 100%.
/// Records the audio offset of every call.
#[derive(Default)]
pub struct CopyRemuxer {
    pub offsets: Mutex<Vec<i32>>,
}

#[async_trait]
impl Remuxer for CopyRemuxer {
    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        audio_offset_centiseconds: i32,
        on_progress: ProgressFn<'_>,
    ) -> Result<()> {
        self.offsets.lock().push(audio_offset_centiseconds);
        on_progress(50);
        tokio::fs::copy(input, output).await?;
        on_progress(100);
        Ok(())
    }
}

/// Leaves a partial output behind and fails like ffmpeg would.
pub struct FailingRemuxer;

#[async_trait]
impl Remuxer for FailingRemuxer {
    async fn remux(
        &self,
        _input: &Path,
        output: &Path,
        _audio_offset_centiseconds: i32,
        on_progress: ProgressFn<'_>,
    ) -> Result<()> {
        on_progress(10);
        tokio::fs::write(output, b"partial").await?;
        Err(Error::remux_failed(
            "merged.ts: Invalid data found when processing input",
        ))
    }
}

/// Panics mid-remux.
pub struct PanickingRemuxer;

#[async_trait]
impl Remuxer for PanickingRemuxer {
    async fn remux(
        &self,
        _input: &Path,
        _output: &Path,
        _audio_offset_centiseconds: i32,
        _on_progress: ProgressFn<'_>,
    ) -> Result<()> {
        panic!("remuxer blew up");
    }
}

/// Copies like [`CopyRemuxer`] but only once a permit is released by the test.
pub struct GatedRemuxer {
    pub gate: Arc<Semaphore>,
}

impl GatedRemuxer {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
        }
    }
}

#[async_trait]
impl Remuxer for GatedRemuxer {
    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        _audio_offset_centiseconds: i32,
        _on_progress: ProgressFn<'_>,
    ) -> Result<()> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| Error::internal(e.to_string()))?;
        permit.forget();
        tokio::fs::copy(input, output).await?;
        Ok(())
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] whose storage
/// lives in a temporary directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub jobs: Arc<JobManager>,
    pub registry: Arc<JobRegistry>,
    pub config: Config,
    _dir: TempDir,
}

impl TestHarness {
    /// Create a harness with default configuration and the given remuxer.
    pub fn new(remuxer: Arc<dyn Remuxer>) -> Self {
        Self::with_config(Config::default(), remuxer)
    }

    /// Create a harness with a custom configuration. Storage directories are
    /// always redirected into a fresh temp dir.
    pub fn with_config(mut config: Config, remuxer: Arc<dyn Remuxer>) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        config.storage.download_dir = dir.path().join("downloads");
        config.storage.converted_dir = dir.path().join("converted");
        std::fs::create_dir_all(&config.storage.download_dir).unwrap();
        std::fs::create_dir_all(&config.storage.converted_dir).unwrap();

        let registry = JobRegistry::new();
        let client = reqwest::Client::new();
        let runner = TaskRunner::new(
            registry.clone(),
            Arc::new(HttpManifestResolver::new(client.clone())),
            SegmentFetcher::new(client),
            remuxer,
            config.storage.clone(),
        );
        let jobs = Arc::new(JobManager::new(runner, config.jobs.max_concurrent));
        let ctx = AppContext::new(jobs.clone(), Arc::new(config.clone()));

        Self {
            ctx,
            jobs,
            registry,
            config,
            _dir: dir,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone(), None)
    }

    pub fn artifact_path(&self, id: JobId) -> std::path::PathBuf {
        self.config.storage.converted_dir.join(id.artifact_name())
    }

    pub fn container_path(&self, id: JobId) -> std::path::PathBuf {
        self.config.storage.download_dir.join(id.container_name())
    }

    /// Poll until the job reaches a terminal state.
    pub async fn wait_terminal(&self, id: JobId) -> Job {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let job = self.registry.get(id).expect("job disappeared");
            if job.status.is_terminal() {
                return job;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "job {id} stuck in {}",
                job.status
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Serve a media playlist at `/<name>/index.m3u8` whose segments are served
/// at `/<name>/segN.ts` with the given bodies. Returns the playlist URL.
pub async fn mount_stream(server: &MockServer, name: &str, segments: &[&[u8]]) -> String {
    let mut playlist = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:4\n");
    for (i, body) in segments.iter().enumerate() {
        playlist.push_str(&format!("#EXTINF:4.0,\nseg{i}.ts\n"));
        Mock::given(method("GET"))
            .and(path(format!("/{name}/seg{i}.ts")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
    }
    playlist.push_str("#EXT-X-ENDLIST\n");

    Mock::given(method("GET"))
        .and(path(format!("/{name}/index.m3u8")))
        .respond_with(ResponseTemplate::new(200).set_body_string(playlist))
        .mount(server)
        .await;

    format!("{}/{name}/index.m3u8", server.uri())
}
