//! Section synthesis
//!
//! `SynthesisEngine` is the seam for the external audio model: a pure
//! capability from section spec to samples. `SectionSynthesizer` is the
//! adapter the job workers call; it owns the per-call timeout and the
//! one-retry policy.

pub mod tone;

use crate::audio::types::SectionAudio;
use cadenza_common::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub use tone::ToneEngine;

/// Everything an engine needs to render one section
///
/// Key and tempo context is passed explicitly into every call rather
/// than carried as shared mutable state, so each section is
/// reproducible and testable in isolation.
#[derive(Debug, Clone)]
pub struct SectionSpec {
    /// Section label from the plan structure, e.g. "Chorus"
    pub label: String,

    /// Musical key, e.g. "C Major"
    pub key: String,

    /// Tempo in beats per minute
    pub bpm: u32,

    /// Instrument tags
    pub instruments: Vec<String>,

    /// Exact frame count this section must fill
    pub frames: u64,

    /// Seed for reproducible output; None lets the engine vary
    pub seed: Option<u64>,

    /// Zero-based position of this section in the structure
    pub index: usize,

    /// Total number of sections in the structure
    pub total: usize,
}

impl SectionSpec {
    /// Slice duration in seconds at the given sample rate
    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        self.frames as f64 / sample_rate as f64
    }
}

/// External synthesis capability: section spec in, audio samples out
///
/// Implementations must be deterministic given identical inputs and an
/// explicit seed; without a seed, output may vary run to run.
pub trait SynthesisEngine: Send + Sync {
    /// Render one section. Blocking and CPU-bound; the adapter moves
    /// calls onto the blocking thread pool.
    fn render(&self, spec: &SectionSpec) -> Result<SectionAudio>;

    /// Sample rate of rendered audio
    fn sample_rate(&self) -> u32;

    /// Channel count of rendered audio
    fn channels(&self) -> u16;
}

/// Adapter over the synthesis engine used by job workers
///
/// Bounds every call with a timeout (expiry counts as a synthesis
/// error) and retries exactly once on synthesis failure before
/// surfacing the error to the job. Retries never change section order.
pub struct SectionSynthesizer {
    engine: Arc<dyn SynthesisEngine>,
    timeout: Duration,
}

impl SectionSynthesizer {
    pub fn new(engine: Arc<dyn SynthesisEngine>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    pub fn sample_rate(&self) -> u32 {
        self.engine.sample_rate()
    }

    pub fn channels(&self) -> u16 {
        self.engine.channels()
    }

    /// Synthesize one section, retrying once on synthesis failure
    pub async fn synthesize(&self, spec: &SectionSpec) -> Result<SectionAudio> {
        match self.render_once(spec).await {
            Ok(audio) => Ok(audio),
            Err(Error::Synthesis(first)) => {
                warn!(
                    "Synthesis of section '{}' failed, retrying once: {}",
                    spec.label, first
                );
                self.render_once(spec).await.map_err(|e| {
                    Error::Synthesis(format!(
                        "section '{}' failed after retry: {} (first attempt: {})",
                        spec.label, e, first
                    ))
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn render_once(&self, spec: &SectionSpec) -> Result<SectionAudio> {
        let engine = Arc::clone(&self.engine);
        let spec_clone = spec.clone();
        let render = tokio::task::spawn_blocking(move || engine.render(&spec_clone));

        let audio = match tokio::time::timeout(self.timeout, render).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_err)) => {
                return Err(Error::Synthesis(format!(
                    "engine task failed for section '{}': {}",
                    spec.label, join_err
                )))
            }
            Err(_) => {
                return Err(Error::Synthesis(format!(
                    "section '{}' timed out after {:?}",
                    spec.label, self.timeout
                )))
            }
        };

        // The engine must honor its advertised format contract
        if audio.samples.is_empty() {
            return Err(Error::Synthesis(format!(
                "engine returned no samples for section '{}'",
                spec.label
            )));
        }
        if audio.sample_rate != self.engine.sample_rate()
            || audio.channels != self.engine.channels()
        {
            return Err(Error::Synthesis(format!(
                "engine format mismatch for section '{}': got {} Hz / {} ch, expected {} Hz / {} ch",
                spec.label,
                audio.sample_rate,
                audio.channels,
                self.engine.sample_rate(),
                self.engine.channels()
            )));
        }
        Ok(audio)
    }
}

/// Split a target duration into per-section frame counts
///
/// Equal split across sections; the rounding remainder goes to the
/// last section, so the slice frames always sum to the target exactly.
pub fn slice_frames(target_secs: u32, num_sections: usize, sample_rate: u32) -> Vec<u64> {
    let total = target_secs as u64 * sample_rate as u64;
    let n = num_sections as u64;
    let base = total / n;
    let mut slices = vec![base; num_sections];
    if let Some(last) = slices.last_mut() {
        *last = base + total % n;
    }
    slices
}

/// Derive a per-section seed from the job seed
///
/// Sections get distinct but stable seeds so a seeded job reproduces
/// exactly while sections still differ from each other.
pub fn section_seed(job_seed: Option<u64>, index: usize) -> Option<u64> {
    job_seed.map(|s| s.wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_sum_to_target() {
        for n in 1..=7 {
            for secs in [10u32, 30, 60, 120] {
                let slices = slice_frames(secs, n, 44100);
                assert_eq!(slices.len(), n);
                let sum: u64 = slices.iter().sum();
                assert_eq!(sum, secs as u64 * 44100, "n={} secs={}", n, secs);
            }
        }
    }

    #[test]
    fn remainder_goes_to_last_section() {
        // 30s at 44100 Hz over 7 sections does not divide evenly
        let slices = slice_frames(30, 7, 44100);
        let base = slices[0];
        for s in &slices[..6] {
            assert_eq!(*s, base);
        }
        assert!(slices[6] >= base);
        assert_eq!(slices.iter().sum::<u64>(), 30 * 44100);
    }

    #[test]
    fn section_seeds_are_distinct_and_stable() {
        let a = section_seed(Some(42), 0);
        let b = section_seed(Some(42), 1);
        assert_ne!(a, b);
        assert_eq!(a, section_seed(Some(42), 0));
        assert_eq!(section_seed(None, 3), None);
    }
}
