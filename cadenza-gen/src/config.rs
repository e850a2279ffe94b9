//! Service configuration
//!
//! Populated from command-line arguments and environment variables in
//! `main.rs`; tests construct it directly with the defaults and
//! override what they need.

use std::path::PathBuf;
use std::time::Duration;

/// Generation service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub port: u16,

    /// Directory receiving published artifacts (one WAV per job)
    pub output_dir: PathBuf,

    /// Worker pool size. Synthesis is memory and compute heavy;
    /// jobs beyond this wait in the FIFO queue.
    pub workers: usize,

    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Output channel count
    pub channels: u16,

    /// Crossfade overlap at each section boundary, in milliseconds
    pub crossfade_ms: u32,

    /// Head fade-in window, in milliseconds
    pub fade_in_ms: u32,

    /// Tail fade-out window, in milliseconds
    pub fade_out_ms: u32,

    /// Normalization target ceiling in dBFS (negative; -1.0 dBFS
    /// corresponds to a peak amplitude of ~0.891)
    pub ceiling_db: f32,

    /// Per-section synthesis call timeout; expiry counts as a
    /// synthesis error subject to the one-retry policy
    pub synthesis_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5750,
            output_dir: PathBuf::from("outputs"),
            workers: 2,
            sample_rate: 44100,
            channels: 1,
            crossfade_ms: 250,
            fade_in_ms: 500,
            fade_out_ms: 500,
            ceiling_db: -1.0,
            synthesis_timeout: Duration::from_secs(60),
        }
    }
}
