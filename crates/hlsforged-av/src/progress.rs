//! Parsing of ffmpeg's elapsed-time status markers.
//!
//! ffmpeg periodically rewrites a status line on stderr such as
//!
//! ```text
//! frame=  240 fps=0.0 q=-1.0 size=    1024kB time=00:00:08.00 bitrate=1048.6kbits/s speed=16x
//! ```
//!
//! The `time=HH:MM:SS.cc` field is the output position, which against the
//! probed input duration gives a completion percentage.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

static TIME_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=(\d+):(\d{2}):(\d{2})\.(\d{2})").expect("time marker regex is valid")
});

/// Extract the elapsed output position from a single stderr line.
///
/// Returns `None` for lines without a well-formed marker, including
/// `time=N/A` and negative positions.
pub fn parse_elapsed(line: &str) -> Option<Duration> {
    let caps = TIME_MARKER.captures(line)?;
    let hours: u64 = caps[1].parse().ok()?;
    let minutes: u64 = caps[2].parse().ok()?;
    let seconds: u64 = caps[3].parse().ok()?;
    let hundredths: u64 = caps[4].parse().ok()?;

    let total_ms = ((hours * 3600 + minutes * 60 + seconds) * 100 + hundredths) * 10;
    Some(Duration::from_millis(total_ms))
}

/// `floor(100 * elapsed / total)` capped at 100.
pub fn percent_complete(elapsed: Duration, total_secs: f64) -> u8 {
    if total_secs <= 0.0 || !total_secs.is_finite() {
        return 0;
    }
    // Elapsed is whole centiseconds, so cs / total_secs is already the
    // percentage without an extra multiply.
    let centis = elapsed.as_millis() as f64 / 10.0;
    let pct = (centis / total_secs).floor();
    pct.clamp(0.0, 100.0) as u8
}

/// Turns a stream of stderr lines into percentage updates.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_secs: f64,
    last: Option<u8>,
}

impl ProgressTracker {
    /// Create a tracker for an input of the given duration.
    ///
    /// Returns `None` when the duration is unusable (zero, negative or not
    /// finite), in which case no progress should be reported.
    pub fn new(total_secs: f64) -> Option<Self> {
        (total_secs.is_finite() && total_secs > 0.0).then_some(Self {
            total_secs,
            last: None,
        })
    }

    /// Feed one stderr line. Returns the new percentage when the line carries
    /// a marker and the value differs from the last one reported.
    pub fn observe(&mut self, line: &str) -> Option<u8> {
        let elapsed = parse_elapsed(line)?;
        let pct = percent_complete(elapsed, self.total_secs);
        if self.last == Some(pct) {
            return None;
        }
        self.last = Some(pct);
        Some(pct)
    }
}
