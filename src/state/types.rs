use chrono::{DateTime, Utc};
use hlsforged_common::JobId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub manifest_url: String,
    pub audio_offset_centiseconds: i32,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Starting,
    Downloading,
    Converting,
    Complete,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Starting, Downloading)
                | (Downloading, Converting)
                | (Converting, Complete)
                | (Starting | Downloading | Converting, Error)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Starting => "starting",
            JobStatus::Downloading => "downloading",
            JobStatus::Converting => "converting",
            JobStatus::Complete => "complete",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "starting" => Ok(JobStatus::Starting),
            "downloading" => Ok(JobStatus::Downloading),
            "converting" => Ok(JobStatus::Converting),
            "complete" => Ok(JobStatus::Complete),
            "error" => Ok(JobStatus::Error),
            _ => Err(format!("Unknown job status: {}", s)),
        }
    }
}

/// A mutation requested by a job's runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    Downloading,
    Converting,
    Progress(u8),
    Complete { download_url: String },
    Error { message: String },
}

impl JobUpdate {
    /// Status this update moves the job into, if any.
    pub fn target_status(&self) -> Option<JobStatus> {
        match self {
            JobUpdate::Downloading => Some(JobStatus::Downloading),
            JobUpdate::Converting => Some(JobStatus::Converting),
            JobUpdate::Progress(_) => None,
            JobUpdate::Complete { .. } => Some(JobStatus::Complete),
            JobUpdate::Error { .. } => Some(JobStatus::Error),
        }
    }
}

/// A rejected lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl Job {
    pub fn new(manifest_url: impl Into<String>, audio_offset_centiseconds: i32) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            manifest_url: manifest_url.into(),
            audio_offset_centiseconds,
            status: JobStatus::Starting,
            progress: 0,
            download_url: None,
            message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update in place.
    ///
    /// Returns `Ok(false)` when the update is a no-op (a progress value that
    /// would not advance the current stage).
    pub fn apply(&mut self, update: &JobUpdate) -> Result<bool, IllegalTransition> {
        if let Some(next) = update.target_status() {
            if !self.status.can_transition_to(next) {
                return Err(IllegalTransition {
                    from: self.status,
                    to: next,
                });
            }
        }

        match update {
            JobUpdate::Progress(pct) => {
                if self.status.is_terminal() {
                    return Err(IllegalTransition {
                        from: self.status,
                        to: self.status,
                    });
                }
                let pct = (*pct).min(100);
                if pct <= self.progress {
                    return Ok(false);
                }
                self.progress = pct;
            }
            JobUpdate::Downloading => {
                self.status = JobStatus::Downloading;
                self.progress = 0;
            }
            JobUpdate::Converting => {
                self.status = JobStatus::Converting;
                self.progress = 0;
            }
            JobUpdate::Complete { download_url } => {
                self.status = JobStatus::Complete;
                self.progress = 100;
                self.download_url = Some(download_url.clone());
            }
            JobUpdate::Error { message } => {
                self.status = JobStatus::Error;
                self.message = Some(message.clone());
            }
        }

        self.updated_at = Utc::now();
        Ok(true)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, expiration: chrono::Duration) -> bool {
        now - self.created_at > expiration
    }

    pub fn view(&self) -> JobView {
        JobView {
            status: self.status,
            progress: self.progress,
            download_url: self.download_url.clone(),
            message: self.message.clone(),
        }
    }
}

/// What a poller sees for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobView {
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
