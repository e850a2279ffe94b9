//! # Cadenza Common Library
//!
//! Shared code for the Cadenza music-generation service:
//! - Error taxonomy (Error enum)
//! - Generation plan and options data model
//! - Job lifecycle types (Job, JobStatus)
//! - Job event types (JobEvent enum, broadcast over SSE)
//! - Fade curve definitions and calculations

pub mod error;
pub mod events;
pub mod fade_curves;
pub mod job;
pub mod model;

pub use error::{Error, Result};
pub use events::JobEvent;
pub use fade_curves::FadeCurve;
pub use job::{Job, JobMetadata, JobStatus};
pub use model::{GenerationOptions, Plan, TargetDuration};
