mod types;

pub use types::*;

use hlsforged_common::{Error, JobId, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Job lifecycle event for SSE broadcasting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum JobEvent {
    /// A job was submitted.
    JobCreated {
        #[serde(flatten)]
        job: Job,
    },
    /// A job's status or progress changed.
    JobUpdated {
        #[serde(flatten)]
        job: Job,
    },
    /// A job expired and was removed.
    JobEvicted { id: JobId },
}

impl JobEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            JobEvent::JobCreated { job } | JobEvent::JobUpdated { job } => job.id,
            JobEvent::JobEvicted { id } => *id,
        }
    }
}

/// Authoritative in-memory store of job records.
///
/// Every write holds the lock only for the map mutation; events are sent
/// after it is released.
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Job>>,
    event_tx: broadcast::Sender<JobEvent>,
}

impl JobRegistry {
    pub fn new() -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(256);

        Arc::new(Self {
            jobs: RwLock::new(HashMap::new()),
            event_tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.event_tx.subscribe()
    }

    fn broadcast(&self, event: JobEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("No subscribers for job event");
        }
    }

    /// Insert a freshly created job. Fails if the id is already present.
    pub fn create(&self, job: Job) -> Result<()> {
        {
            let mut jobs = self.jobs.write();
            if jobs.contains_key(&job.id) {
                return Err(Error::Conflict(format!("job {} already exists", job.id)));
            }
            jobs.insert(job.id, job.clone());
        }

        self.broadcast(JobEvent::JobCreated { job });
        Ok(())
    }

    /// Get a job by ID
    pub fn get(&self, id: JobId) -> Option<Job> {
        let jobs = self.jobs.read();
        jobs.get(&id).cloned()
    }

    /// Apply an update to a job.
    ///
    /// Returns `true` only if the record changed. Unknown ids and no-op
    /// progress values return `false` quietly; illegal transitions are
    /// logged and also return `false`.
    pub fn update(&self, id: JobId, update: JobUpdate) -> bool {
        let updated = {
            let mut jobs = self.jobs.write();
            let Some(job) = jobs.get_mut(&id) else {
                return false;
            };
            match job.apply(&update) {
                Ok(true) => job.clone(),
                Ok(false) => return false,
                Err(e) => {
                    tracing::warn!(job_id = %id, "Rejected job update {:?}: {}", update, e);
                    return false;
                }
            }
        };

        self.broadcast(JobEvent::JobUpdated { job: updated });
        true
    }

    /// Point-in-time copy of every job id.
    pub fn list_ids(&self) -> Vec<JobId> {
        let jobs = self.jobs.read();
        jobs.keys().copied().collect()
    }

    /// Snapshot of every job, newest first.
    pub fn list(&self) -> Vec<Job> {
        let mut list: Vec<Job> = {
            let jobs = self.jobs.read();
            jobs.values().cloned().collect()
        };
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    /// Remove a job record.
    pub fn remove(&self, id: JobId) -> Option<Job> {
        let removed = {
            let mut jobs = self.jobs.write();
            jobs.remove(&id)
        };

        if removed.is_some() {
            self.broadcast(JobEvent::JobEvicted { id });
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}
