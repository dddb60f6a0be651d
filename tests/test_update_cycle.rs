//! Integration tests for the update cycle and scheduler lifecycle
//!
//! Drive `run_cycle` and `Scheduler` against scripted mock collaborators to
//! verify the fault-isolation contract: a failing source still produces a
//! zero sample, a failing publisher never blocks persistence or pruning, and
//! the session is released on shutdown.

use {
    async_trait::async_trait,
    playerwatch::{
        error::{PublishError, ResourceError, SampleError},
        publisher::Publisher,
        scheduler::{run_cycle, Scheduler, SchedulerError},
        source::MetricSource,
        stats::AggregateReport,
        store::StatsStore,
    },
    std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    },
    tempfile::tempdir,
};

/// Mock source with scripted acquire failures and sample outcomes
#[derive(Clone, Default)]
struct ScriptedSource {
    /// Number of acquire calls that should fail before succeeding
    fail_acquires: Arc<AtomicUsize>,
    /// Outcomes returned by successive sample calls (empty -> Ok(1))
    samples: Arc<Mutex<VecDeque<Result<u32, SampleError>>>>,
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn with_samples(samples: Vec<Result<u32, SampleError>>) -> Self {
        Self {
            samples: Arc::new(Mutex::new(samples.into())),
            ..Self::default()
        }
    }
}

#[async_trait]
impl MetricSource for ScriptedSource {
    type Session = ();

    async fn acquire(&self) -> Result<(), ResourceError> {
        let remaining = self.fail_acquires.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_acquires.store(remaining - 1, Ordering::SeqCst);
            return Err(ResourceError::Unavailable("scripted failure".into()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sample(&self, _session: &mut ()) -> Result<u32, SampleError> {
        self.samples.lock().unwrap().pop_front().unwrap_or(Ok(1))
    }

    async fn release(&self, _session: ()) -> Result<(), ResourceError> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock publisher recording every call, optionally failing each delivery
#[derive(Clone, Default)]
struct RecordingPublisher {
    calls: Arc<Mutex<Vec<(u32, AggregateReport)>>>,
    fail: bool,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, current: u32, report: &AggregateReport) -> Result<(), PublishError> {
        self.calls.lock().unwrap().push((current, report.clone()));
        if self.fail {
            return Err(PublishError::Status(reqwest::StatusCode::BAD_GATEWAY));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_sample_failure_degrades_to_zero_sample() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("stats_db.json");

    let source = ScriptedSource::with_samples(vec![Err(SampleError::Status(
        reqwest::StatusCode::BAD_GATEWAY,
    ))]);
    let publisher = RecordingPublisher::default();

    let mut session = Some(());
    let mut store = StatsStore::new();
    run_cycle(&source, &publisher, &mut session, &mut store, &path).await;

    // The cycle still appended a zero-value sample
    assert_eq!(store.len(), 1);
    assert_eq!(store.samples()[0].players, 0);

    // It still attempted publish and persist
    let calls = publisher.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, 0);
    assert!(path.exists());

    // The broken session was released for a fresh start next cycle
    assert!(session.is_none());
    assert_eq!(source.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_publish_failure_does_not_block_persistence() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("stats_db.json");

    let source = ScriptedSource::with_samples(vec![Ok(7)]);
    let publisher = RecordingPublisher {
        fail: true,
        ..RecordingPublisher::default()
    };

    let mut session = Some(());
    let mut store = StatsStore::new();
    run_cycle(&source, &publisher, &mut session, &mut store, &path).await;

    assert_eq!(store.samples()[0].players, 7);

    let persisted = StatsStore::load(&path);
    assert_eq!(persisted.samples(), store.samples());
}

#[tokio::test]
async fn test_save_failure_does_not_abort_cycle() {
    let dir = tempdir().expect("tempdir");
    // Parent directory does not exist, so every save in the cycle fails
    let path = dir.path().join("no_such_dir").join("stats_db.json");

    let source = ScriptedSource::with_samples(vec![Ok(11)]);
    let publisher = RecordingPublisher::default();

    let mut session = Some(());
    let mut store = StatsStore::new();
    // An over-retention entry that the cycle's prune step must still remove
    let now = chrono::Utc::now().timestamp_millis();
    store.append(playerwatch::store::Sample {
        timestamp: now - playerwatch::store::RETENTION_MS - 1,
        players: 3,
    });

    run_cycle(&source, &publisher, &mut session, &mut store, &path).await;

    // Nothing reached disk, memory stays the source of truth
    assert!(!path.exists());
    assert_eq!(store.len(), 1);
    assert_eq!(store.samples()[0].players, 11);

    // Publish ran before the failed save, prune ran after it
    assert_eq!(publisher.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_acquire_is_retried_lazily() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("stats_db.json");

    let source = ScriptedSource::with_samples(vec![Ok(9)]);
    source.fail_acquires.store(1, Ordering::SeqCst);
    let publisher = RecordingPublisher::default();

    let mut session = None;
    let mut store = StatsStore::new();

    // First cycle: acquire fails, sample degrades to 0
    run_cycle(&source, &publisher, &mut session, &mut store, &path).await;
    assert!(session.is_none());
    assert_eq!(store.samples()[0].players, 0);

    // Second cycle: acquire succeeds lazily and sampling resumes
    run_cycle(&source, &publisher, &mut session, &mut store, &path).await;
    assert!(session.is_some());
    assert_eq!(store.samples()[1].players, 9);
    assert_eq!(source.acquired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scheduler_lifecycle() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("stats_db.json");

    let source = ScriptedSource::with_samples(vec![Ok(5)]);
    let publisher = RecordingPublisher::default();
    let calls = publisher.calls.clone();
    let released = source.released.clone();

    let mut scheduler = Scheduler::new(
        source.clone(),
        publisher,
        Duration::from_secs(3600),
        &path,
    );

    scheduler.start().await.expect("start");
    assert!(scheduler.is_running());

    // The initial cycle ran synchronously inside start()
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(calls.lock().unwrap()[0].0, 5);
    let persisted = StatsStore::load(&path);
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted.samples()[0].players, 5);

    // Running is not a restartable state
    assert!(matches!(
        scheduler.start().await,
        Err(SchedulerError::AlreadyRunning)
    ));

    scheduler.stop().await;
    assert!(!scheduler.is_running());
    assert_eq!(released.load(Ordering::SeqCst), 1);

    // Stopped is terminal
    assert!(matches!(
        scheduler.start().await,
        Err(SchedulerError::Stopped)
    ));
}

#[tokio::test]
async fn test_scheduler_loads_existing_history() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("stats_db.json");

    // Seed a prior history on disk
    let mut seed = StatsStore::new();
    seed.append(playerwatch::store::Sample {
        timestamp: chrono::Utc::now().timestamp_millis() - 3_600_000,
        players: 15,
    });
    seed.save(&path).expect("seed save");

    let source = ScriptedSource::with_samples(vec![Ok(25)]);
    let publisher = RecordingPublisher::default();
    let calls = publisher.calls.clone();

    let mut scheduler =
        Scheduler::new(source, publisher, Duration::from_secs(3600), &path);
    scheduler.start().await.expect("start");
    scheduler.stop().await;

    // Report covers the seeded sample and the fresh one
    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].0, 25);
    assert_eq!(calls[0].1.day.average, 20.0);
    assert_eq!(calls[0].1.day.max, 25);
    assert_eq!(calls[0].1.day.min, 15);

    let persisted = StatsStore::load(&path);
    assert_eq!(persisted.len(), 2);
}
