//! Audio stitcher
//!
//! Assembles ordered section buffers into one track:
//!
//! 1. Validate uniform sample rate and channel count.
//! 2. Optionally match RMS loudness across sections.
//! 3. Concatenate with a sum-normalized equal-power crossfade at each
//!    internal boundary. The overlap consumes time from both neighbors,
//!    so the output is shorter than the sum of the inputs by
//!    `(n - 1) × overlap`.
//! 4. Optionally apply linear head/tail fades to the assembled track.
//! 5. Optionally normalize: one global gain scaling the track peak to
//!    the configured ceiling. Peak-based, never per-section, so
//!    relative section dynamics are preserved.

use crate::audio::types::{FinalTrack, SectionAudio};
use crate::config::Config;
use cadenza_common::{Error, FadeCurve, GenerationOptions, Result};
use tracing::debug;

/// Combines section buffers into a single track
#[derive(Debug, Clone)]
pub struct AudioStitcher {
    crossfade_ms: u32,
    fade_in_ms: u32,
    fade_out_ms: u32,
    ceiling_db: f32,
}

impl AudioStitcher {
    pub fn new(crossfade_ms: u32, fade_in_ms: u32, fade_out_ms: u32, ceiling_db: f32) -> Self {
        Self {
            crossfade_ms,
            fade_in_ms,
            fade_out_ms,
            ceiling_db,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.crossfade_ms,
            config.fade_in_ms,
            config.fade_out_ms,
            config.ceiling_db,
        )
    }

    /// Normalization target as a linear amplitude (ceiling_db in dBFS)
    pub fn ceiling_amplitude(&self) -> f32 {
        10f32.powf(self.ceiling_db / 20.0)
    }

    /// Assemble ordered sections into the final track
    ///
    /// Fails with `Error::Stitch` if the section list is empty or any
    /// two sections disagree in sample rate or channel count.
    pub fn stitch(
        &self,
        mut sections: Vec<SectionAudio>,
        options: &GenerationOptions,
    ) -> Result<FinalTrack> {
        if sections.is_empty() {
            return Err(Error::Stitch("no sections to stitch".to_string()));
        }

        let sample_rate = sections[0].sample_rate;
        let channels = sections[0].channels;
        for (i, section) in sections.iter().enumerate() {
            if section.sample_rate != sample_rate {
                return Err(Error::Stitch(format!(
                    "section {} sample rate {} != {}",
                    i, section.sample_rate, sample_rate
                )));
            }
            if section.channels != channels {
                return Err(Error::Stitch(format!(
                    "section {} channel count {} != {}",
                    i, section.channels, channels
                )));
            }
        }

        if options.match_loudness {
            match_loudness(&mut sections);
        }

        let overlap_frames = (self.crossfade_ms as u64 * sample_rate as u64 / 1000) as usize;
        let ch = channels as usize;

        let mut samples = sections[0].samples.clone();
        for section in &sections[1..] {
            crossfade_append(&mut samples, &section.samples, overlap_frames, ch);
        }

        if options.apply_fades {
            let fade_in_frames = (self.fade_in_ms as u64 * sample_rate as u64 / 1000) as usize;
            let fade_out_frames = (self.fade_out_ms as u64 * sample_rate as u64 / 1000) as usize;
            apply_fade_in(&mut samples, fade_in_frames, ch);
            apply_fade_out(&mut samples, fade_out_frames, ch);
        }

        if options.normalize {
            normalize_peak(&mut samples, self.ceiling_amplitude());
        }

        let track = FinalTrack {
            samples,
            sample_rate,
            channels,
        };
        debug!(
            "Stitched {} sections into {:.2}s track ({} Hz, {} ch)",
            sections.len(),
            track.duration_sec(),
            sample_rate,
            channels
        );
        Ok(track)
    }
}

impl Default for AudioStitcher {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Blend `next` onto the tail of `out` with an equal-power crossfade
///
/// The gain pair is normalized by its sum so the two gains total 1.0
/// at every sample: coherent material crosses the boundary at constant
/// amplitude instead of spiking toward sqrt(2) mid-overlap.
///
/// The overlap window is clamped to the shorter of the two neighbors
/// when a section is shorter than the configured window.
fn crossfade_append(out: &mut Vec<f32>, next: &[f32], overlap_frames: usize, channels: usize) {
    let overlap = overlap_frames
        .min(out.len() / channels)
        .min(next.len() / channels);

    if overlap == 0 {
        out.extend_from_slice(next);
        return;
    }

    let tail_start = out.len() - overlap * channels;
    for i in 0..overlap {
        let t = if overlap > 1 {
            i as f32 / (overlap - 1) as f32
        } else {
            1.0
        };
        let raw_out = FadeCurve::EqualPower.fade_out_gain(t);
        let raw_in = FadeCurve::EqualPower.fade_in_gain(t);
        // cos + sin >= 1.0 on [0, pi/2], so this never divides by zero
        let total = raw_out + raw_in;
        let g_out = raw_out / total;
        let g_in = raw_in / total;
        for c in 0..channels {
            let idx = tail_start + i * channels + c;
            out[idx] = out[idx] * g_out + next[i * channels + c] * g_in;
        }
    }
    out.extend_from_slice(&next[overlap * channels..]);
}

/// Linear fade-in over the first `fade_frames` frames
fn apply_fade_in(samples: &mut [f32], fade_frames: usize, channels: usize) {
    let fade = fade_frames.min(samples.len() / channels);
    if fade == 0 {
        return;
    }
    for i in 0..fade {
        let gain = FadeCurve::Linear.fade_in_gain(i as f32 / fade as f32);
        for c in 0..channels {
            samples[i * channels + c] *= gain;
        }
    }
}

/// Linear fade-out over the last `fade_frames` frames
fn apply_fade_out(samples: &mut [f32], fade_frames: usize, channels: usize) {
    let total_frames = samples.len() / channels;
    let fade = fade_frames.min(total_frames);
    if fade == 0 {
        return;
    }
    let start = total_frames - fade;
    for i in 0..fade {
        let gain = FadeCurve::Linear.fade_out_gain((i + 1) as f32 / fade as f32);
        for c in 0..channels {
            samples[(start + i) * channels + c] *= gain;
        }
    }
}

/// Scale the whole buffer so its peak equals `ceiling`
///
/// One global multiply: upward when the track is quieter than the
/// ceiling, downward when louder. Silence is left untouched.
fn normalize_peak(samples: &mut [f32], ceiling: f32) {
    let peak = samples.iter().fold(0.0f32, |p, s| p.max(s.abs()));
    if peak <= 0.0 {
        return;
    }
    let gain = ceiling / peak;
    for s in samples.iter_mut() {
        *s *= gain;
    }
}

/// Match RMS loudness across sections before stitching
///
/// Each section is scaled toward the mean RMS of the set; silent
/// sections are left as-is.
fn match_loudness(sections: &mut [SectionAudio]) {
    let rms_values: Vec<f32> = sections.iter().map(|s| rms(&s.samples)).collect();
    let target = rms_values.iter().sum::<f32>() / rms_values.len() as f32;
    if target <= 0.0 {
        return;
    }
    for (section, &rms) in sections.iter_mut().zip(rms_values.iter()) {
        if rms > 0.0 {
            let gain = target / rms;
            for s in section.samples.iter_mut() {
                *s *= gain;
            }
        }
    }
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}
