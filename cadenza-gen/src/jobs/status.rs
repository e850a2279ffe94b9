//! Status store
//!
//! Concurrent-safe registry of job snapshots queried by client polling.
//! Reads clone a snapshot and never block on in-flight synthesis:
//! writers (each job's own worker) hold the lock only for the brief
//! field update. Status movement is forward-only: a regression attempt
//! is logged and dropped, so repeated polls never observe a status
//! earlier than one already seen.

use cadenza_common::{Job, JobEvent, JobMetadata, JobStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Concurrent-safe mapping from job id to the latest job snapshot
pub struct StatusStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
    event_tx: broadcast::Sender<JobEvent>,
}

impl StatusStore {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            jobs: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Subscribe to job events for SSE
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.event_tx.subscribe()
    }

    fn broadcast(&self, event: JobEvent) {
        // No receivers is fine
        let _ = self.event_tx.send(event);
    }

    /// Register a freshly created job (Queued)
    pub async fn insert(&self, job: Job) {
        let job_id = job.id;
        self.jobs.write().await.insert(job_id, job);
        self.broadcast(JobEvent::JobQueued {
            job_id,
            timestamp: Utc::now(),
        });
    }

    /// Snapshot of a job, or None if unknown
    pub async fn get(&self, job_id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    /// Number of registered jobs
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Advance a job's status. Only the job's own worker calls this.
    ///
    /// Backward transitions and writes to terminal jobs are dropped
    /// with a warning rather than applied.
    pub async fn set_status(&self, job_id: Uuid, status: JobStatus) {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&job_id) else {
            warn!("set_status for unknown job {}", job_id);
            return;
        };
        if job.status.is_terminal() || status.rank() <= job.status.rank() {
            warn!(
                "Ignoring status regression for job {}: {} -> {}",
                job_id, job.status, status
            );
            return;
        }
        job.status = status;
        drop(jobs);
        self.broadcast(JobEvent::JobStatusChanged {
            job_id,
            status,
            timestamp: Utc::now(),
        });
    }

    /// Update the human-readable progress label, e.g. "section 2/4"
    pub async fn set_progress(&self, job_id: Uuid, progress: String) {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&job_id) else {
            return;
        };
        if job.status.is_terminal() {
            return;
        }
        job.progress = Some(progress.clone());
        drop(jobs);
        self.broadcast(JobEvent::JobProgress {
            job_id,
            progress,
            timestamp: Utc::now(),
        });
    }

    /// Terminal transition to Completed with artifact and metadata
    pub async fn complete(&self, job_id: Uuid, artifact_path: PathBuf, metadata: JobMetadata) {
        let duration_sec = metadata.duration_sec;
        {
            let mut jobs = self.jobs.write().await;
            let Some(job) = jobs.get_mut(&job_id) else {
                warn!("complete for unknown job {}", job_id);
                return;
            };
            if job.status.is_terminal() {
                warn!("complete on already-terminal job {}", job_id);
                return;
            }
            job.status = JobStatus::Completed;
            job.artifact_path = Some(artifact_path);
            job.metadata = Some(metadata);
            job.completed_at = Some(Utc::now());
        }
        info!("Job {} completed ({:.2}s)", job_id, duration_sec);
        self.broadcast(JobEvent::JobCompleted {
            job_id,
            duration_sec,
            timestamp: Utc::now(),
        });
    }

    /// Terminal transition to Failed with a human-readable error
    pub async fn fail(&self, job_id: Uuid, error: String) {
        {
            let mut jobs = self.jobs.write().await;
            let Some(job) = jobs.get_mut(&job_id) else {
                warn!("fail for unknown job {}", job_id);
                return;
            };
            if job.status.is_terminal() {
                warn!("fail on already-terminal job {}", job_id);
                return;
            }
            job.status = JobStatus::Failed;
            job.error = Some(error.clone());
            job.completed_at = Some(Utc::now());
        }
        warn!("Job {} failed: {}", job_id, error);
        self.broadcast(JobEvent::JobFailed {
            job_id,
            error,
            timestamp: Utc::now(),
        });
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}
