//! Job event types
//!
//! Events are broadcast by the status store whenever a job changes and
//! can be serialized for SSE transmission. Clients still poll the
//! status endpoint; the event stream is a push-style supplement, not a
//! replacement for the polling contract.

use crate::job::JobStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    /// Job accepted and placed on the FIFO queue
    JobQueued {
        job_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Job moved forward in its lifecycle
    JobStatusChanged {
        job_id: Uuid,
        status: JobStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Per-section progress update, e.g. "section 2/4"
    JobProgress {
        job_id: Uuid,
        progress: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Artifact published, job complete
    JobCompleted {
        job_id: Uuid,
        duration_sec: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Job failed; error is the stable human-readable message also
    /// reported by the status endpoint
    JobFailed {
        job_id: Uuid,
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl JobEvent {
    /// Event type string for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            JobEvent::JobQueued { .. } => "JobQueued",
            JobEvent::JobStatusChanged { .. } => "JobStatusChanged",
            JobEvent::JobProgress { .. } => "JobProgress",
            JobEvent::JobCompleted { .. } => "JobCompleted",
            JobEvent::JobFailed { .. } => "JobFailed",
        }
    }
}
