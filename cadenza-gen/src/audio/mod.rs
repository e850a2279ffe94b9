//! Audio buffer types and the stitching pipeline

pub mod stitcher;
pub mod types;

pub use stitcher::AudioStitcher;
pub use types::{FinalTrack, SectionAudio};
