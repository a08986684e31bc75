//! Duration probing with ffprobe.

use crate::{Error, Result, ToolCommand};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe the total duration of a media container, in seconds.
///
/// # Errors
///
/// Fails if the file does not exist, ffprobe fails, or the container reports
/// no usable duration.
pub async fn probe_duration(ffprobe: &Path, input: &Path) -> Result<f64> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }

    let output = ToolCommand::new(ffprobe.to_path_buf())
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
        .arg(input.to_string_lossy())
        .timeout(PROBE_TIMEOUT)
        .execute()
        .await?;

    parse_duration_json(&output.stdout)
}

/// Extract `format.duration` from ffprobe's JSON output.
pub fn parse_duration_json(json: &str) -> Result<f64> {
    let parsed: FfprobeOutput = serde_json::from_str(json)?;
    let raw = parsed
        .format
        .duration
        .ok_or_else(|| Error::parse_error("ffprobe", "no duration reported"))?;

    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::parse_error("ffprobe", format!("invalid duration: {raw}")))?;

    if !secs.is_finite() || secs <= 0.0 {
        return Err(Error::parse_error(
            "ffprobe",
            format!("unusable duration: {raw}"),
        ));
    }

    Ok(secs)
}
