//! Core audio data types
//!
//! Buffers flowing through the generation pipeline. Section buffers are
//! ephemeral: owned by the worker assembling one job, discarded after
//! stitching, never shared across jobs.
//!
//! **Format:**
//! - Samples are f32 (floating point -1.0 to 1.0)
//! - Channel-interleaved: [c0, c1, c0, c1, ...] for two channels
//! - All sections of one job share sample rate and channel count
//!   (validated by the stitcher, not assumed)

/// Raw audio rendered for one structure section
#[derive(Debug, Clone)]
pub struct SectionAudio {
    /// PCM samples, channel-interleaved
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count
    pub channels: u16,
}

impl SectionAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Number of frames (samples.len() / channels)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// The assembled track produced by the stitcher, ready for publication
#[derive(Debug, Clone)]
pub struct FinalTrack {
    /// PCM samples, channel-interleaved
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count
    pub channels: u16,
}

impl FinalTrack {
    /// Number of frames
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Duration in seconds
    pub fn duration_sec(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Peak absolute amplitude across the track
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |p, s| p.max(s.abs()))
    }
}
