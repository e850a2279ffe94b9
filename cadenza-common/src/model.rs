//! Generation plan and options data model
//!
//! A `Plan` is the structured musical blueprint that drives generation.
//! It is produced by the planner (or supplied by the client in edited
//! form) and consumed by the job pipeline as an immutable value.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Structured musical blueprint for one generation request
///
/// Immutable once submitted: the pipeline captures it by value at job
/// creation and never mutates it. Clients may edit a plan locally and
/// submit the edited value with the next generate call; the service
/// tracks no edit history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Ordered section labels, e.g. ["Intro", "Verse", "Chorus", "Outro"].
    /// Must be non-empty.
    pub structure: Vec<String>,

    /// Musical key, e.g. "C Major" or "A Minor"
    pub key: String,

    /// Tempo in beats per minute (must be positive)
    pub bpm: u32,

    /// Instrument tags (may be empty)
    #[serde(default)]
    pub instruments: Vec<String>,

    /// Genre tag extracted from the prompt
    #[serde(default)]
    pub genre: String,

    /// Mood tag extracted from the prompt
    #[serde(default)]
    pub mood: String,

    /// Conditioning text handed to the synthesis engine
    #[serde(default)]
    pub description: String,
}

/// Target track length preset
///
/// Presets map to fixed second counts; an unrecognized string fails
/// deserialization before any job is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetDuration {
    Short,
    Medium,
    Long,
}

impl TargetDuration {
    /// Total target duration in seconds
    pub fn seconds(&self) -> u32 {
        match self {
            TargetDuration::Short => 30,
            TargetDuration::Medium => 60,
            TargetDuration::Long => 120,
        }
    }
}

impl Default for TargetDuration {
    fn default() -> Self {
        TargetDuration::Short
    }
}

/// Per-request generation options, captured by value at job creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default)]
    pub target_duration: TargetDuration,

    /// Scale the assembled track so its peak hits the loudness ceiling
    #[serde(default = "default_true")]
    pub normalize: bool,

    /// Apply linear fade-in/fade-out to the head and tail of the track
    #[serde(default = "default_true")]
    pub apply_fades: bool,

    /// Match RMS loudness across sections before stitching
    #[serde(default)]
    pub match_loudness: bool,

    /// Vocal synthesis is unsupported; requests with `use_lyrics = true`
    /// are rejected with a validation error.
    #[serde(default)]
    pub use_lyrics: bool,

    /// Optional seed for reproducible synthesis. With a seed, identical
    /// inputs produce identical output; without one, output may vary.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            target_duration: TargetDuration::default(),
            normalize: true,
            apply_fades: true,
            match_loudness: false,
            use_lyrics: false,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_duration_seconds() {
        assert_eq!(TargetDuration::Short.seconds(), 30);
        assert_eq!(TargetDuration::Medium.seconds(), 60);
        assert_eq!(TargetDuration::Long.seconds(), 120);
    }

    #[test]
    fn target_duration_parses_lowercase() {
        let d: TargetDuration = serde_json::from_str("\"short\"").unwrap();
        assert_eq!(d, TargetDuration::Short);
        let d: TargetDuration = serde_json::from_str("\"long\"").unwrap();
        assert_eq!(d, TargetDuration::Long);
    }

    #[test]
    fn target_duration_rejects_unknown() {
        assert!(serde_json::from_str::<TargetDuration>("\"epic\"").is_err());
    }

    #[test]
    fn options_defaults() {
        let opts: GenerationOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.target_duration, TargetDuration::Short);
        assert!(opts.normalize);
        assert!(opts.apply_fades);
        assert!(!opts.match_loudness);
        assert!(!opts.use_lyrics);
        assert!(opts.seed.is_none());
    }

    #[test]
    fn plan_round_trip() {
        let plan = Plan {
            structure: vec!["Intro".into(), "Outro".into()],
            key: "A Minor".into(),
            bpm: 92,
            instruments: vec!["piano".into()],
            genre: "jazz".into(),
            mood: "sad".into(),
            description: "jazz, sad, 92 bpm".into(),
        };
        let json = serde_json::to_string(&plan).unwrap();
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.structure, plan.structure);
        assert_eq!(back.bpm, 92);
    }
}
