//! Error types for the Cadenza service
//!
//! Defines the service-wide error taxonomy using thiserror. Each variant
//! maps to one failure class of the generation pipeline:
//!
//! - `Validation` is returned synchronously before a job is created and
//!   is never stored in a job.
//! - `Synthesis` covers engine failures and per-section timeouts; the
//!   synthesizer adapter retries once before it becomes terminal.
//! - `Stitch` indicates a synthesis contract violation (sample rate or
//!   channel mismatch, empty section list) and is never retried.
//! - `Io` covers artifact write failures; terminal for the job.

use thiserror::Error;

/// Main error type for Cadenza
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid plan or unsupported generation option
    #[error("Validation error: {0}")]
    Validation(String),

    /// Synthesis engine failure or timeout
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Section assembly failure (mismatched formats, empty input)
    #[error("Stitch error: {0}")]
    Stitch(String),

    /// File I/O errors (artifact staging, rename, read-back)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found (unknown job id, missing artifact)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the Cadenza Error
pub type Result<T> = std::result::Result<T, Error>;
