//! Job worker
//!
//! Each worker processes exactly one job end-to-end: synthesize
//! sections in order, stitch, publish, record the terminal state. Any
//! error inside the run is caught at the job boundary and recorded into
//! the job. It never crashes the orchestrator and never touches other
//! jobs.

use crate::audio::AudioStitcher;
use crate::jobs::status::StatusStore;
use crate::publish::ArtifactPublisher;
use crate::synth::{section_seed, slice_frames, SectionSpec, SectionSynthesizer};
use cadenza_common::{Error, JobMetadata, JobStatus, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// Everything a worker needs, shared across the pool
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<StatusStore>,
    pub synthesizer: Arc<SectionSynthesizer>,
    pub stitcher: Arc<AudioStitcher>,
    pub publisher: Arc<ArtifactPublisher>,
}

/// Worker loop: pull job ids off the shared FIFO queue until it closes
///
/// The receiver sits behind a mutex so any number of workers share one
/// queue; whichever worker holds the lock takes the next job, which
/// preserves FIFO order with no priorities and no preemption.
pub async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<Uuid>>>,
    ctx: WorkerContext,
) {
    debug!("Worker {} started", worker_id);
    loop {
        let job_id = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(job_id) = job_id else {
            debug!("Worker {} shutting down: queue closed", worker_id);
            break;
        };

        info!("Worker {} picked up job {}", worker_id, job_id);
        if let Err(e) = run_job(job_id, &ctx).await {
            // Error boundary: record and move on, other jobs unaffected
            ctx.store.fail(job_id, e.to_string()).await;
        }
    }
}

/// Run one job through composing, stitching, and publication
async fn run_job(job_id: Uuid, ctx: &WorkerContext) -> Result<()> {
    let job = ctx
        .store
        .get(job_id)
        .await
        .ok_or_else(|| Error::Internal(format!("queued job {} missing from store", job_id)))?;

    ctx.store.set_status(job_id, JobStatus::Composing).await;

    let num_sections = job.plan.structure.len();
    let sample_rate = ctx.synthesizer.sample_rate();
    let slices = slice_frames(
        job.options.target_duration.seconds(),
        num_sections,
        sample_rate,
    );

    // Sections are ordered and may depend on prior tempo/key context,
    // so they are synthesized sequentially, never in parallel.
    let mut sections = Vec::with_capacity(num_sections);
    for (index, label) in job.plan.structure.iter().enumerate() {
        ctx.store
            .set_progress(job_id, format!("section {}/{}", index + 1, num_sections))
            .await;

        let spec = SectionSpec {
            label: label.clone(),
            key: job.plan.key.clone(),
            bpm: job.plan.bpm,
            instruments: job.plan.instruments.clone(),
            frames: slices[index],
            seed: section_seed(job.options.seed, index),
            index,
            total: num_sections,
        };
        let audio = ctx.synthesizer.synthesize(&spec).await?;
        debug!(
            "Job {}: section {}/{} '{}' rendered ({:.2}s)",
            job_id,
            index + 1,
            num_sections,
            label,
            audio.duration_secs()
        );
        sections.push(audio);
    }

    ctx.store.set_status(job_id, JobStatus::Stitching).await;
    let track = ctx.stitcher.stitch(sections, &job.options)?;

    let artifact_path = ctx.publisher.publish(job_id, &track)?;

    let metadata = JobMetadata {
        prompt: job.prompt.clone(),
        duration_sec: track.duration_sec(),
        sample_rate: track.sample_rate,
        num_sections,
    };
    ctx.store.complete(job_id, artifact_path, metadata).await;
    Ok(())
}
