//! End-to-end pipeline tests with deterministic fake engines
//!
//! Drives the job manager, worker pool, stitcher, and publisher
//! together. Fake engines return constant-amplitude buffers so the
//! tests can assert structural properties (duration, peaks, status
//! flow) without depending on real synthesis output.

use cadenza_common::{Error, GenerationOptions, JobStatus, Plan, TargetDuration};
use cadenza_gen::audio::types::SectionAudio;
use cadenza_gen::config::Config;
use cadenza_gen::jobs::{JobManager, StatusStore};
use cadenza_gen::publish::ArtifactPublisher;
use cadenza_gen::synth::{SectionSpec, SectionSynthesizer, SynthesisEngine};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

// Low sample rate keeps the buffers small and the tests fast
const TEST_RATE: u32 = 8000;

/// Engine returning constant-amplitude buffers of exactly the
/// requested length
struct ConstantEngine {
    amplitude: f32,
}

impl SynthesisEngine for ConstantEngine {
    fn render(&self, spec: &SectionSpec) -> cadenza_common::Result<SectionAudio> {
        Ok(SectionAudio::new(
            vec![self.amplitude; spec.frames as usize],
            TEST_RATE,
            1,
        ))
    }

    fn sample_rate(&self) -> u32 {
        TEST_RATE
    }

    fn channels(&self) -> u16 {
        1
    }
}

/// Engine whose output amplitude is derived from the plan bpm, so
/// concurrent jobs produce distinguishable artifacts
struct BpmAmplitudeEngine;

impl SynthesisEngine for BpmAmplitudeEngine {
    fn render(&self, spec: &SectionSpec) -> cadenza_common::Result<SectionAudio> {
        let amplitude = spec.bpm as f32 / 1000.0;
        Ok(SectionAudio::new(
            vec![amplitude; spec.frames as usize],
            TEST_RATE,
            1,
        ))
    }

    fn sample_rate(&self) -> u32 {
        TEST_RATE
    }

    fn channels(&self) -> u16 {
        1
    }
}

/// Engine that always fails for one section index
struct FailingEngine {
    fail_index: usize,
    calls: AtomicU32,
}

impl SynthesisEngine for FailingEngine {
    fn render(&self, spec: &SectionSpec) -> cadenza_common::Result<SectionAudio> {
        if spec.index == self.fail_index {
            self.calls.fetch_add(1, Ordering::SeqCst);
            return Err(Error::Synthesis("engine fault injected".to_string()));
        }
        Ok(SectionAudio::new(
            vec![0.1; spec.frames as usize],
            TEST_RATE,
            1,
        ))
    }

    fn sample_rate(&self) -> u32 {
        TEST_RATE
    }

    fn channels(&self) -> u16 {
        1
    }
}

/// Engine that fails the first attempt for every section and succeeds
/// on the retry
struct FlakyEngine {
    attempts: Mutex<HashMap<usize, u32>>,
}

impl SynthesisEngine for FlakyEngine {
    fn render(&self, spec: &SectionSpec) -> cadenza_common::Result<SectionAudio> {
        let mut attempts = self.attempts.lock().unwrap();
        let count = attempts.entry(spec.index).or_insert(0);
        *count += 1;
        if *count == 1 {
            return Err(Error::Synthesis("transient fault".to_string()));
        }
        Ok(SectionAudio::new(
            vec![0.2; spec.frames as usize],
            TEST_RATE,
            1,
        ))
    }

    fn sample_rate(&self) -> u32 {
        TEST_RATE
    }

    fn channels(&self) -> u16 {
        1
    }
}

/// Engine that sleeps per section so pollers can observe intermediate
/// states
struct SlowEngine {
    delay: Duration,
}

impl SynthesisEngine for SlowEngine {
    fn render(&self, spec: &SectionSpec) -> cadenza_common::Result<SectionAudio> {
        std::thread::sleep(self.delay);
        Ok(SectionAudio::new(
            vec![0.3; spec.frames as usize],
            TEST_RATE,
            1,
        ))
    }

    fn sample_rate(&self) -> u32 {
        TEST_RATE
    }

    fn channels(&self) -> u16 {
        1
    }
}

struct Harness {
    manager: JobManager,
    store: Arc<StatusStore>,
    publisher: Arc<ArtifactPublisher>,
    _dir: TempDir,
}

fn harness(engine: Arc<dyn SynthesisEngine>, workers: usize) -> Harness {
    let dir = TempDir::new().unwrap();
    let config = Config {
        output_dir: dir.path().to_path_buf(),
        workers,
        synthesis_timeout: Duration::from_secs(5),
        ..Config::default()
    };
    let store = Arc::new(StatusStore::new());
    let publisher = Arc::new(ArtifactPublisher::new(dir.path()).unwrap());
    let synthesizer = Arc::new(SectionSynthesizer::new(engine, config.synthesis_timeout));
    let manager = JobManager::start(
        &config,
        Arc::clone(&store),
        synthesizer,
        Arc::clone(&publisher),
    );
    Harness {
        manager,
        store,
        publisher,
        _dir: dir,
    }
}

fn plan_with_structure(structure: &[&str], bpm: u32) -> Plan {
    Plan {
        structure: structure.iter().map(|s| s.to_string()).collect(),
        key: "C Major".to_string(),
        bpm,
        instruments: vec![],
        genre: "pop".to_string(),
        mood: "neutral".to_string(),
        description: String::new(),
    }
}

async fn wait_terminal(store: &StatusStore, job_id: Uuid) -> cadenza_common::Job {
    for _ in 0..1000 {
        if let Some(job) = store.get(job_id).await {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached a terminal state", job_id);
}

/// Decode a published WAV back into normalized f32 samples
fn read_artifact(publisher: &ArtifactPublisher, job_id: Uuid) -> Vec<f32> {
    let bytes = publisher.retrieve(job_id).unwrap();
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    reader
        .samples::<i16>()
        .map(|s| s.unwrap() as f32 / i16::MAX as f32)
        .collect()
}

#[tokio::test]
async fn short_job_completes_with_expected_duration() {
    // Three sections, 30s target, 250ms overlap at each of the two
    // boundaries: final duration is 30 - 2 * 0.25 = 29.5s
    let h = harness(Arc::new(ConstantEngine { amplitude: 0.0 }), 1);
    let job_id = h
        .manager
        .create(
            "ambient test".to_string(),
            plan_with_structure(&["Intro", "Loop", "Outro"], 120),
            GenerationOptions {
                target_duration: TargetDuration::Short,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let job = wait_terminal(&h.store, job_id).await;
    assert_eq!(job.status, JobStatus::Completed);

    let meta = job.metadata.expect("completed job must carry metadata");
    assert!((meta.duration_sec - 29.5).abs() < 1e-6);
    assert_eq!(meta.sample_rate, TEST_RATE);
    assert_eq!(meta.num_sections, 3);
    assert_eq!(meta.prompt, "ambient test");
    assert!(job.artifact_path.unwrap().exists());
    assert!(job.completed_at.is_some());
}

#[tokio::test]
async fn lyrics_request_is_rejected_without_creating_a_job() {
    let h = harness(Arc::new(ConstantEngine { amplitude: 0.1 }), 1);
    let result = h
        .manager
        .create(
            "sing to me".to_string(),
            plan_with_structure(&["Intro"], 120),
            GenerationOptions {
                use_lyrics: true,
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn empty_structure_is_rejected_without_creating_a_job() {
    let h = harness(Arc::new(ConstantEngine { amplitude: 0.1 }), 1);
    let result = h
        .manager
        .create(
            "nothing".to_string(),
            plan_with_structure(&[], 120),
            GenerationOptions::default(),
        )
        .await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn persistent_section_failure_fails_the_job() {
    // Section 2 fails on both attempts: the job must end Failed with a
    // non-empty error, and no artifact may exist
    let engine = Arc::new(FailingEngine {
        fail_index: 1,
        calls: AtomicU32::new(0),
    });
    let h = harness(Arc::clone(&engine) as Arc<dyn SynthesisEngine>, 1);
    let job_id = h
        .manager
        .create(
            "doomed".to_string(),
            plan_with_structure(&["Intro", "Verse", "Outro"], 120),
            GenerationOptions::default(),
        )
        .await
        .unwrap();

    let job = wait_terminal(&h.store, job_id).await;
    assert_eq!(job.status, JobStatus::Failed);
    let error = job.error.expect("failed job must carry an error");
    assert!(!error.is_empty());
    assert!(error.contains("after retry"), "error was: {}", error);

    // One retry, no more
    assert_eq!(engine.calls.load(Ordering::SeqCst), 2);

    assert!(job.artifact_path.is_none());
    assert!(matches!(
        h.publisher.retrieve(job_id),
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn transient_failures_are_retried_once_and_succeed() {
    let engine = Arc::new(FlakyEngine {
        attempts: Mutex::new(HashMap::new()),
    });
    let h = harness(engine, 1);
    let job_id = h
        .manager
        .create(
            "flaky".to_string(),
            plan_with_structure(&["Intro", "Outro"], 120),
            GenerationOptions::default(),
        )
        .await
        .unwrap();

    let job = wait_terminal(&h.store, job_id).await;
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn quiet_track_is_normalized_up_to_the_ceiling() {
    // All sections at amplitude 0.1 with normalize on: the published
    // peak must sit at the -1 dBFS ceiling (~0.891), not at 0.1
    let h = harness(Arc::new(ConstantEngine { amplitude: 0.1 }), 1);
    let job_id = h
        .manager
        .create(
            "quiet".to_string(),
            plan_with_structure(&["A", "B"], 120),
            GenerationOptions {
                normalize: true,
                apply_fades: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let job = wait_terminal(&h.store, job_id).await;
    assert_eq!(job.status, JobStatus::Completed);

    let samples = read_artifact(&h.publisher, job_id);
    let peak = samples.iter().fold(0.0f32, |p, s| p.max(s.abs()));
    assert!((peak - 0.891).abs() < 0.005, "peak was {}", peak);
}

#[tokio::test]
async fn fades_zero_the_head_and_tail() {
    let h = harness(Arc::new(ConstantEngine { amplitude: 0.5 }), 1);
    let job_id = h
        .manager
        .create(
            "faded".to_string(),
            plan_with_structure(&["A"], 120),
            GenerationOptions {
                normalize: false,
                apply_fades: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let job = wait_terminal(&h.store, job_id).await;
    assert_eq!(job.status, JobStatus::Completed);

    let samples = read_artifact(&h.publisher, job_id);
    // 500ms fade at 8000 Hz = 4000 frames
    assert_eq!(samples[0], 0.0);
    assert!((samples[4000] - 0.5).abs() < 0.01);
    for i in 1..4000 {
        assert!(samples[i] >= samples[i - 1] - 1e-4);
    }
    assert!(samples[samples.len() - 1].abs() < 0.01);
}

#[tokio::test]
async fn polled_statuses_never_regress() {
    let h = harness(
        Arc::new(SlowEngine {
            delay: Duration::from_millis(40),
        }),
        1,
    );
    let job_id = h
        .manager
        .create(
            "slow".to_string(),
            plan_with_structure(&["A", "B", "C"], 120),
            GenerationOptions {
                target_duration: TargetDuration::Short,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mut observed = Vec::new();
    loop {
        let job = h.store.get(job_id).await.unwrap();
        observed.push(job.status);
        if job.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    for pair in observed.windows(2) {
        assert!(
            pair[0].rank() <= pair[1].rank(),
            "status regressed: {:?}",
            observed
        );
    }
    assert_eq!(*observed.last().unwrap(), JobStatus::Completed);

    // Terminal state never changes on further polls
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        h.store.get(job_id).await.unwrap().status,
        JobStatus::Completed
    );
}

#[tokio::test]
async fn concurrent_jobs_stay_isolated() {
    // Four jobs on a two-worker pool; each artifact must carry its own
    // job's amplitude with no cross-contamination
    let h = harness(Arc::new(BpmAmplitudeEngine), 2);
    let opts = GenerationOptions {
        normalize: false,
        apply_fades: false,
        ..Default::default()
    };

    let mut jobs = Vec::new();
    for bpm in [100u32, 200, 300, 400] {
        let job_id = h
            .manager
            .create(
                format!("job at {} bpm", bpm),
                plan_with_structure(&["A", "B"], bpm),
                opts.clone(),
            )
            .await
            .unwrap();
        jobs.push((job_id, bpm));
    }

    for (job_id, bpm) in jobs {
        let job = wait_terminal(&h.store, job_id).await;
        assert_eq!(job.status, JobStatus::Completed, "job {} failed", job_id);

        // Check well clear of the crossfade boundary: the head and
        // tail must carry this job's own amplitude
        let samples = read_artifact(&h.publisher, job_id);
        let expected = bpm as f32 / 1000.0;
        assert!(
            (samples[0] - expected).abs() < 0.005,
            "job {} expected head amplitude {}, got {}",
            job_id,
            expected,
            samples[0]
        );
        let last = samples[samples.len() - 1];
        assert!(
            (last - expected).abs() < 0.005,
            "job {} expected tail amplitude {}, got {}",
            job_id,
            expected,
            last
        );
    }
}

#[tokio::test]
async fn synthesis_timeout_counts_as_failure() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        output_dir: dir.path().to_path_buf(),
        workers: 1,
        synthesis_timeout: Duration::from_millis(30),
        ..Config::default()
    };
    let store = Arc::new(StatusStore::new());
    let publisher = Arc::new(ArtifactPublisher::new(dir.path()).unwrap());
    let synthesizer = Arc::new(SectionSynthesizer::new(
        Arc::new(SlowEngine {
            delay: Duration::from_millis(200),
        }),
        config.synthesis_timeout,
    ));
    let manager = JobManager::start(&config, Arc::clone(&store), synthesizer, publisher);

    let job_id = manager
        .create(
            "too slow".to_string(),
            plan_with_structure(&["A"], 120),
            GenerationOptions::default(),
        )
        .await
        .unwrap();

    let job = wait_terminal(&store, job_id).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let h = harness(Arc::new(ConstantEngine { amplitude: 0.1 }), 1);
    let result = h.manager.get_status(Uuid::new_v4()).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}
