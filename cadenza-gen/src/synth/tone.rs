//! Procedural tone engine
//!
//! Default `SynthesisEngine` implementation standing in for the
//! external neural model: renders a chord-tone pad derived from the
//! plan key, pulsed at the plan tempo. Seeded, so identical inputs and
//! seed reproduce bit-identical output.

use crate::audio::types::SectionAudio;
use crate::synth::{SectionSpec, SynthesisEngine};
use cadenza_common::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::{PI, TAU};

/// Reference frequency for C4
const C4_HZ: f32 = 261.63;

#[derive(Debug, Clone)]
struct Voice {
    freq: f32,
    phase: f32,
    amp: f32,
}

/// Deterministic chord-pad synthesis engine
pub struct ToneEngine {
    sample_rate: u32,
    channels: u16,
}

impl ToneEngine {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    fn build_voices(&self, spec: &SectionSpec, rng: &mut StdRng) -> Vec<Voice> {
        let (root, minor) = parse_key(&spec.key);
        let third = if minor { 3 } else { 4 };

        // Root, third, fifth; choruses get an octave on top and the
        // outer sections sit lower in the mix.
        let mut semitones = vec![0i32, third, 7];
        if spec.label.to_lowercase().contains("chorus") {
            semitones.push(12);
        }
        let register = if spec.index == 0 || spec.index + 1 == spec.total {
            0.8
        } else {
            1.0
        };

        let has_bass = spec
            .instruments
            .iter()
            .any(|i| i.to_lowercase().contains("bass"));
        if has_bass {
            semitones.push(-12);
        }

        let base_amp = 0.22 * register / (semitones.len() as f32 / 3.0);
        semitones
            .iter()
            .map(|&s| Voice {
                // Slight random detune keeps the pad from sounding static
                freq: root * 2f32.powf(s as f32 / 12.0) * (1.0 + rng.gen_range(-0.002..0.002)),
                phase: rng.gen_range(0.0..TAU),
                amp: base_amp * rng.gen_range(0.9..1.1),
            })
            .collect()
    }
}

impl SynthesisEngine for ToneEngine {
    fn render(&self, spec: &SectionSpec) -> Result<SectionAudio> {
        let mut rng = match spec.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let voices = self.build_voices(spec, &mut rng);
        let beat_hz = spec.bpm.max(1) as f32 / 60.0;
        let rate = self.sample_rate as f32;
        let frames = spec.frames as usize;
        let ch = self.channels as usize;

        let mut samples = vec![0.0f32; frames * ch];
        for i in 0..frames {
            let t = i as f32 / rate;
            // Gentle pulse locked to the beat grid
            let env = 0.55 + 0.45 * (PI * beat_hz * t).sin().abs();
            let mut value = 0.0;
            for voice in &voices {
                value += (TAU * voice.freq * t + voice.phase).sin() * voice.amp;
            }
            value *= env;
            for c in 0..ch {
                samples[i * ch + c] = value;
            }
        }

        Ok(SectionAudio::new(samples, self.sample_rate, self.channels))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }
}

/// Parse a key string like "C Major" or "F# Minor" into a root
/// frequency and a minor flag. Unrecognized keys fall back to C Major.
fn parse_key(key: &str) -> (f32, bool) {
    let lower = key.to_lowercase();
    let minor = lower.contains("minor");

    let mut chars = lower.chars();
    let semitone = match chars.next() {
        Some('c') => 0,
        Some('d') => 2,
        Some('e') => 4,
        Some('f') => 5,
        Some('g') => 7,
        Some('a') => 9,
        Some('b') => 11,
        _ => 0,
    };
    let accidental = match chars.next() {
        Some('#') => 1,
        Some('b') => -1,
        _ => 0,
    };

    let root = C4_HZ * 2f32.powf((semitone + accidental) as f32 / 12.0);
    (root, minor)
}
