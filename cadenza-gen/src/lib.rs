//! # Cadenza Generation Service (cadenza-gen)
//!
//! Turns a structured musical plan (ordered section labels, key, tempo,
//! instrument set) into a single playable audio artifact, tracking the
//! long-running work as an asynchronous job that clients poll to
//! completion.
//!
//! **Architecture:** bounded worker pool over a FIFO job queue; each
//! worker synthesizes sections sequentially, stitches them with
//! equal-power crossfades, normalizes, and publishes the artifact via
//! an atomic rename. HTTP/SSE control interface on axum.

pub mod api;
pub mod audio;
pub mod config;
pub mod jobs;
pub mod planner;
pub mod publish;
pub mod synth;

pub use cadenza_common::{Error, Result};
