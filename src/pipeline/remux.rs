//! The remux stage, behind a trait so the runner can be driven without ffmpeg.

use crate::config::RemuxConfig;
use async_trait::async_trait;
use hlsforged_av::RemuxTools;
use hlsforged_common::{Error, Result};
use std::path::Path;
use std::time::Duration;

/// Receives remux progress as a whole percentage.
pub type ProgressFn<'a> = &'a (dyn Fn(u8) + Send + Sync);

#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Remux `input` into an MP4 at `output`, shifting audio by
    /// `audio_offset_centiseconds` (0 for none).
    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        audio_offset_centiseconds: i32,
        on_progress: ProgressFn<'_>,
    ) -> Result<()>;
}

/// Remuxes with the external ffmpeg/ffprobe tools.
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    tools: RemuxTools,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new(tools: RemuxTools, timeout: Duration) -> Self {
        Self { tools, timeout }
    }

    /// Resolve the tools named in the config (or on `PATH`).
    pub fn from_config(config: &RemuxConfig) -> hlsforged_av::Result<Self> {
        let tools = RemuxTools::resolve(
            config.ffmpeg_path.as_deref(),
            config.ffprobe_path.as_deref(),
        )?;
        Ok(Self::new(tools, config.timeout()))
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    async fn remux(
        &self,
        input: &Path,
        output: &Path,
        audio_offset_centiseconds: i32,
        on_progress: ProgressFn<'_>,
    ) -> Result<()> {
        hlsforged_av::remux_to_mp4(
            &self.tools,
            input,
            output,
            audio_offset_centiseconds,
            self.timeout,
            on_progress,
        )
        .await
        .map(|mode| tracing::debug!("Remux finished using {:?}", mode))
        .map_err(|e| Error::remux_failed(e.to_string()))
    }
}
