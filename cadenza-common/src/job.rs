//! Job lifecycle types
//!
//! A `Job` is one asynchronous generation request. Its status moves
//! forward only: Queued → Composing → Stitching → Completed, with
//! Failed reachable from any non-terminal state. Exactly one worker
//! owns a job's mutable fields for its active lifetime; everyone else
//! sees immutable snapshots.

use crate::model::{GenerationOptions, Plan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Composing,
    Stitching,
    Completed,
    Failed,
}

impl JobStatus {
    /// Position in the forward-only partial order
    /// Queued < Composing < Stitching < {Completed, Failed}
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Composing => 1,
            JobStatus::Stitching => 2,
            JobStatus::Completed | JobStatus::Failed => 3,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Public status string: internal Queued/Composing/Stitching all
    /// collapse to "processing"; only terminal states are distinguished
    /// externally.
    pub fn public_str(&self) -> &'static str {
        match self {
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            _ => "processing",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Composing => "composing",
            JobStatus::Stitching => "stitching",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Metadata recorded when a job completes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    /// Echo of the originating prompt
    pub prompt: String,
    /// Duration of the published track in seconds
    pub duration_sec: f64,
    /// Sample rate of the published track
    pub sample_rate: u32,
    /// Number of sections synthesized
    pub num_sections: usize,
}

/// One generation job and its lifecycle state
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    /// Prompt echo for metadata
    pub prompt: String,
    /// Captured by value at creation, never mutated after
    pub plan: Plan,
    pub options: GenerationOptions,
    pub status: JobStatus,
    /// Human-readable progress label, e.g. "section 2/4"
    pub progress: Option<String>,
    /// Present iff status is Failed
    pub error: Option<String>,
    /// Present iff status is Completed
    pub artifact_path: Option<PathBuf>,
    /// Populated only on completion
    pub metadata: Option<JobMetadata>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new job in the Queued state
    pub fn new(prompt: String, plan: Plan, options: GenerationOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt,
            plan,
            options,
            status: JobStatus::Queued,
            progress: None,
            error: None,
            artifact_path: None,
            metadata: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}
