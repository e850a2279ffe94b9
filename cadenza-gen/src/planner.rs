//! Prompt planner
//!
//! Rule-based extraction of a structured `Plan` from a natural-language
//! prompt. The planner is a pure function: same prompt, same plan. It
//! is an external collaborator to the generation core; the core only
//! consumes the resulting `Plan` value, which clients may also edit and
//! resubmit themselves.

use cadenza_common::Plan;

const GENRES: &[&str] = &[
    "rock", "pop", "jazz", "classical", "edm", "hip hop", "rap", "metal", "country", "blues",
];

const MOODS: &[&str] = &[
    "happy", "sad", "energetic", "relaxed", "dark", "romantic", "angry", "uplifting",
];

const INSTRUMENTS: &[&str] = &[
    "piano", "guitar", "bass", "drums", "violin", "synth", "strings", "flute", "trumpet",
];

/// Analyze the prompt and return a structured plan
pub fn plan(prompt: &str) -> Plan {
    let lower = prompt.to_lowercase();

    let bpm = extract_bpm(&lower).unwrap_or(120);
    let genre = GENRES
        .iter()
        .find(|g| lower.contains(**g))
        .copied()
        .unwrap_or("pop")
        .to_string();
    let mood = MOODS
        .iter()
        .find(|m| lower.contains(**m))
        .copied()
        .unwrap_or("neutral")
        .to_string();
    let instruments: Vec<String> = INSTRUMENTS
        .iter()
        .filter(|i| lower.contains(**i))
        .map(|i| i.to_string())
        .collect();

    // Sad and dark prompts lean minor
    let key = if lower.contains("minor") || mood == "sad" || mood == "dark" {
        "A Minor".to_string()
    } else {
        "C Major".to_string()
    };

    // Comma-separated tags condition the synthesis engine best
    let mut tags = vec![genre.clone(), mood.clone()];
    if extract_bpm(&lower).is_some() {
        tags.push(format!("{} bpm", bpm));
    }
    let description = format!("{}, {}", tags.join(", "), prompt);

    Plan {
        structure: vec![
            "Intro".to_string(),
            "Verse".to_string(),
            "Chorus".to_string(),
            "Outro".to_string(),
        ],
        key,
        bpm,
        instruments,
        genre,
        mood,
        description,
    }
}

/// Find a "<number> bpm" or "<number>bpm" mention in the prompt
fn extract_bpm(lower: &str) -> Option<u32> {
    let tokens: Vec<&str> = lower.split_whitespace().collect();
    for (i, token) in tokens.iter().enumerate() {
        if let Some(num) = token.strip_suffix("bpm") {
            if let Ok(v) = num.parse::<u32>() {
                if v > 0 {
                    return Some(v);
                }
            }
        }
        if *token == "bpm" && i > 0 {
            if let Ok(v) = tokens[i - 1].parse::<u32>() {
                if v > 0 {
                    return Some(v);
                }
            }
        }
    }
    None
}
