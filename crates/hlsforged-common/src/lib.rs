//! hlsforged-common: shared types used across hlsforged.
//!
//! - **Typed IDs**: [`JobId`], a UUID wrapper identifying a conversion job
//! - **Error Handling**: the pipeline error taxonomy and a result alias
//!
//! # Examples
//!
//! ```
//! use hlsforged_common::{Error, JobId, Result};
//!
//! let id = JobId::new();
//! assert_eq!(id.artifact_name(), format!("{id}.mp4"));
//!
//! fn lookup() -> Result<()> {
//!     Err(Error::not_found("job", "abc"))
//! }
//! assert!(lookup().is_err());
//! ```

pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::JobId;
