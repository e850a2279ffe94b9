//! Job manager
//!
//! Validates generation requests, allocates jobs, and feeds them to a
//! bounded pool of workers through a FIFO queue. Validation failures
//! are returned synchronously and never create a job. A job accepted
//! here is processed by exactly one worker for its entire lifetime and
//! is never re-queued after failure; retry policy lives in the
//! synthesizer adapter, not at this layer.

use crate::audio::AudioStitcher;
use crate::config::Config;
use crate::jobs::status::StatusStore;
use crate::jobs::worker::{worker_loop, WorkerContext};
use crate::publish::ArtifactPublisher;
use crate::synth::SectionSynthesizer;
use cadenza_common::{Error, GenerationOptions, Job, Plan, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

/// Creates jobs and owns the worker pool
pub struct JobManager {
    store: Arc<StatusStore>,
    queue_tx: mpsc::UnboundedSender<Uuid>,
    workers: Vec<JoinHandle<()>>,
}

impl JobManager {
    /// Start the manager and its worker pool
    ///
    /// Pool size comes from `config.workers` and is intentionally
    /// small: synthesis is memory and compute heavy, so jobs beyond
    /// pool capacity wait in the queue.
    pub fn start(
        config: &Config,
        store: Arc<StatusStore>,
        synthesizer: Arc<SectionSynthesizer>,
        publisher: Arc<ArtifactPublisher>,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let queue_rx = Arc::new(Mutex::new(queue_rx));

        let ctx = WorkerContext {
            store: Arc::clone(&store),
            synthesizer,
            stitcher: Arc::new(AudioStitcher::from_config(config)),
            publisher,
        };

        let pool_size = config.workers.max(1);
        let mut workers = Vec::with_capacity(pool_size);
        for worker_id in 0..pool_size {
            let queue = Arc::clone(&queue_rx);
            let ctx = ctx.clone();
            workers.push(tokio::spawn(worker_loop(worker_id, queue, ctx)));
        }
        info!("Job manager started with {} workers", pool_size);

        Self {
            store,
            queue_tx,
            workers,
        }
    }

    /// Validate the request, allocate a job, and enqueue it
    ///
    /// Returns the job id immediately; processing happens on the pool.
    /// Fails with `Error::Validation` (and creates nothing) for an
    /// empty structure, a zero bpm, or `use_lyrics = true`.
    pub async fn create(
        &self,
        prompt: String,
        plan: Plan,
        options: GenerationOptions,
    ) -> Result<Uuid> {
        validate(&plan, &options)?;

        let job = Job::new(prompt, plan, options);
        let job_id = job.id;
        self.store.insert(job).await;
        self.queue_tx
            .send(job_id)
            .map_err(|_| Error::Internal("job queue is closed".to_string()))?;
        info!("Job {} created and queued", job_id);
        Ok(job_id)
    }

    /// Immutable snapshot of a job, or `Error::NotFound`
    pub async fn get_status(&self, job_id: Uuid) -> Result<Job> {
        self.store
            .get(job_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("job {} not found", job_id)))
    }

    /// Number of worker tasks in the pool
    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }
}

fn validate(plan: &Plan, options: &GenerationOptions) -> Result<()> {
    if plan.structure.is_empty() {
        return Err(Error::Validation(
            "plan structure must not be empty".to_string(),
        ));
    }
    if plan.bpm == 0 {
        return Err(Error::Validation("bpm must be positive".to_string()));
    }
    if options.use_lyrics {
        return Err(Error::Validation(
            "vocal synthesis is not supported (use_lyrics must be false)".to_string(),
        ));
    }
    Ok(())
}
