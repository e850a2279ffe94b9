//! Artifact publisher
//!
//! Writes the final track as 16-bit PCM WAV. The write goes to a
//! job-scoped staging file first and is moved into the public path with
//! an atomic rename, so the public path is either absent or fully
//! written, never partial.

use crate::audio::types::FinalTrack;
use cadenza_common::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Publishes one WAV artifact per completed job under the output dir
#[derive(Debug, Clone)]
pub struct ArtifactPublisher {
    output_dir: PathBuf,
}

impl ArtifactPublisher {
    /// Create a publisher rooted at `output_dir`, creating it if needed
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Public artifact path for a job
    pub fn artifact_path(&self, job_id: Uuid) -> PathBuf {
        self.output_dir.join(format!("{}.wav", job_id))
    }

    fn staging_path(&self, job_id: Uuid) -> PathBuf {
        // Hidden, job-scoped; same directory as the final path so the
        // rename stays on one filesystem and is atomic
        self.output_dir.join(format!(".{}.wav.tmp", job_id))
    }

    /// Write the track to staging, then atomically move it into the
    /// public path. Fails with `Error::Io` on any write failure; the
    /// staging file is removed on error.
    pub fn publish(&self, job_id: Uuid, track: &FinalTrack) -> Result<PathBuf> {
        let staging = self.staging_path(job_id);

        if let Err(e) = write_wav(&staging, track) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        let public = self.artifact_path(job_id);
        fs::rename(&staging, &public)?;
        info!(
            "Published artifact for job {}: {} ({:.2}s)",
            job_id,
            public.display(),
            track.duration_sec()
        );
        Ok(public)
    }

    /// Read back a published artifact as bytes
    pub fn retrieve(&self, job_id: Uuid) -> Result<Vec<u8>> {
        let path = self.artifact_path(job_id);
        if !path.exists() {
            return Err(Error::NotFound(format!("no artifact for job {}", job_id)));
        }
        debug!("Serving artifact {}", path.display());
        Ok(fs::read(&path)?)
    }
}

fn write_wav(path: &Path, track: &FinalTrack) -> Result<()> {
    let spec = hound::WavSpec {
        channels: track.channels,
        sample_rate: track.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(to_io)?;
    for &sample in &track.samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value).map_err(to_io)?;
    }
    writer.finalize().map_err(to_io)?;
    Ok(())
}

fn to_io(e: hound::Error) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}
