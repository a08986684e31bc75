//! # hlsforged-av
//!
//! Thin async layer over the external ffmpeg/ffprobe tools.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`check_tools`], [`require_tool`]) for ffmpeg and
//!   ffprobe.
//! - **Command execution** ([`ToolCommand`]) with a wall-clock budget, either
//!   capturing output or streaming stderr line by line.
//! - **Progress parsing** ([`progress`]) of ffmpeg's `time=HH:MM:SS.cc`
//!   status markers.
//! - **Probing** ([`probe_duration`]) of a container's total duration.
//! - **Remuxing** ([`remux_to_mp4`]) of a merged MPEG-TS container into MP4,
//!   optionally shifting the audio track.
//!
//! ## Example
//!
//! ```no_run
//! use hlsforged_av::{remux_to_mp4, RemuxTools};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # async fn example() -> hlsforged_av::Result<()> {
//! let tools = RemuxTools::resolve(None, None)?;
//! remux_to_mp4(
//!     &tools,
//!     Path::new("/tmp/merged.ts"),
//!     Path::new("/tmp/out.mp4"),
//!     0,
//!     Duration::from_secs(600),
//!     |pct| println!("{pct}%"),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
mod error;
pub mod probe;
pub mod progress;
pub mod remux;
pub mod tools;

pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use probe::probe_duration;
pub use progress::{parse_elapsed, ProgressTracker};
pub use remux::{remux_to_mp4, RemuxMode, RemuxTools};
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo};
