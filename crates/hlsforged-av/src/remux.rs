//! MPEG-TS to MP4 remuxing with optional audio shift.

use crate::progress::ProgressTracker;
use crate::{probe_duration, tools, Error, Result, ToolCommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved locations of the tools a remux needs.
#[derive(Debug, Clone)]
pub struct RemuxTools {
    /// ffmpeg executable.
    pub ffmpeg: PathBuf,
    /// ffprobe executable.
    pub ffprobe: PathBuf,
}

impl RemuxTools {
    /// Resolve both tools, preferring the configured paths over `PATH`.
    pub fn resolve(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> Result<Self> {
        Ok(Self {
            ffmpeg: tools::get_tool_path("ffmpeg", ffmpeg)?,
            ffprobe: tools::get_tool_path("ffprobe", ffprobe)?,
        })
    }
}

/// How the output is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemuxMode {
    /// Every stream is copied; ADTS audio is rewrapped for MP4.
    StreamCopy,
    /// Video is copied, audio is retimed by the offset and re-encoded to AAC.
    AudioShift {
        /// Offset in hundredths of a second; positive delays the audio.
        centiseconds: i32,
    },
}

impl RemuxMode {
    /// Pick the mode for an audio offset in centiseconds.
    pub fn for_offset(centiseconds: i32) -> Self {
        if centiseconds == 0 {
            Self::StreamCopy
        } else {
            Self::AudioShift { centiseconds }
        }
    }

    /// The `asetpts` filter for an audio shift, e.g. `asetpts=PTS+1.50/TB`.
    pub fn audio_filter(&self) -> Option<String> {
        match self {
            Self::StreamCopy => None,
            Self::AudioShift { centiseconds } => {
                let secs = f64::from(*centiseconds) / 100.0;
                Some(format!("asetpts=PTS{secs:+.2}/TB"))
            }
        }
    }

    /// Full ffmpeg argument list for remuxing `input` into `output`.
    pub fn ffmpeg_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-y".into(),
            "-i".into(),
            input.to_string_lossy().into_owned(),
        ];

        match self.audio_filter() {
            None => args.extend(
                [
                    "-c",
                    "copy",
                    "-avoid_negative_ts",
                    "make_zero",
                    "-bsf:a",
                    "aac_adtstoasc",
                ]
                .map(String::from),
            ),
            Some(filter) => {
                args.extend(["-c:v", "copy", "-af"].map(String::from));
                args.push(filter);
                args.extend(["-c:a", "aac"].map(String::from));
            }
        }

        args.extend(["-movflags", "+faststart"].map(String::from));
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

/// Remux a merged MPEG-TS container into an MP4 file.
///
/// The input's duration is probed first; if that fails the remux still runs
/// but `on_progress` is never called. Otherwise `on_progress` receives each
/// new percentage parsed from ffmpeg's status output.
///
/// On failure any partial output file is removed.
///
/// # Errors
///
/// Returns [`Error::ToolFailed`] if ffmpeg exits unsuccessfully and
/// [`Error::Timeout`] if it exceeds `timeout`. Both carry the tail of
/// ffmpeg's stderr.
pub async fn remux_to_mp4<F>(
    tools: &RemuxTools,
    input: &Path,
    output: &Path,
    audio_offset_centiseconds: i32,
    timeout: Duration,
    mut on_progress: F,
) -> Result<RemuxMode>
where
    F: FnMut(u8),
{
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }

    let mode = RemuxMode::for_offset(audio_offset_centiseconds);

    let mut tracker = match probe_duration(&tools.ffprobe, input).await {
        Ok(secs) => ProgressTracker::new(secs),
        Err(e) => {
            tracing::warn!(
                "Could not probe duration of {:?}, progress will not be reported: {}",
                input,
                e
            );
            None
        }
    };

    tracing::info!("Remuxing {:?} -> {:?} ({:?})", input, output, mode);

    let result = ToolCommand::new(tools.ffmpeg.clone())
        .args(mode.ffmpeg_args(input, output))
        .timeout(timeout)
        .execute_streaming(|line| {
            if let Some(pct) = tracker.as_mut().and_then(|t| t.observe(line)) {
                on_progress(pct);
            }
        })
        .await;

    match result {
        Ok(_) => Ok(mode),
        Err(e) => {
            if output.exists() {
                if let Err(rm) = std::fs::remove_file(output) {
                    tracing::warn!("Failed to remove partial output {:?}: {}", output, rm);
                }
            }
            Err(e)
        }
    }
}
