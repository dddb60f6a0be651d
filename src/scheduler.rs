//! Update-cycle scheduling and lifecycle
//!
//! A single spawned task owns the rolling store and the source session and
//! drives one update cycle per interval tick. Cycles never overlap: the
//! ticker uses delayed missed-tick behavior, so a slow cycle pushes the next
//! tick back instead of running it concurrently.
//!
//! Every step of a cycle is independently fault-tolerant. A failed sample
//! degrades to a zero-value entry, a failed publish or save is logged and the
//! remaining steps still run.

use {
    crate::{
        error::SampleError,
        publisher::Publisher,
        source::MetricSource,
        stats::AggregateReport,
        store::{Sample, StatsStore},
    },
    chrono::Utc,
    std::{
        path::{Path, PathBuf},
        sync::Arc,
        time::Duration,
    },
    thiserror::Error,
    tokio::{
        sync::watch,
        task::JoinHandle,
        time::{interval_at, Instant, MissedTickBehavior},
    },
};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler already running")]
    AlreadyRunning,
    #[error("scheduler is stopped")]
    Stopped,
}

enum State {
    Uninitialized,
    Running {
        shutdown: watch::Sender<bool>,
        worker: JoinHandle<()>,
    },
    Stopped,
}

/// Drives fetch → append → aggregate → publish → persist → prune on a fixed
/// cadence
///
/// `Uninitialized → Running → Stopped`; Stopped is terminal, a restart needs
/// a fresh scheduler.
pub struct Scheduler<S: MetricSource, P: Publisher> {
    source: Arc<S>,
    publisher: Arc<P>,
    update_interval: Duration,
    stats_path: PathBuf,
    state: State,
}

impl<S, P> Scheduler<S, P>
where
    S: MetricSource + 'static,
    P: Publisher + 'static,
{
    pub fn new(
        source: S,
        publisher: P,
        update_interval: Duration,
        stats_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: Arc::new(source),
            publisher: Arc::new(publisher),
            update_interval,
            stats_path: stats_path.into(),
            state: State::Uninitialized,
        }
    }

    /// Load history, run one cycle immediately, then tick on the interval
    ///
    /// A failed session acquisition is logged and left unset; the next cycle
    /// re-attempts it lazily before sampling.
    pub async fn start(&mut self) -> Result<(), SchedulerError> {
        match self.state {
            State::Uninitialized => {}
            State::Running { .. } => return Err(SchedulerError::AlreadyRunning),
            State::Stopped => return Err(SchedulerError::Stopped),
        }

        let mut session = match self.source.acquire().await {
            Ok(s) => Some(s),
            Err(e) => {
                log::error!("Fehler beim Aufbau der Sitzung: {}", e);
                None
            }
        };

        let mut store = StatsStore::load(&self.stats_path);

        run_cycle(
            &*self.source,
            &*self.publisher,
            &mut session,
            &mut store,
            &self.stats_path,
        )
        .await;

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let source = Arc::clone(&self.source);
        let publisher = Arc::clone(&self.publisher);
        let period = self.update_interval;
        let stats_path = self.stats_path.clone();

        let worker = tokio::spawn(async move {
            // First tick fires one full period from now; the initial cycle
            // already ran synchronously in start()
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_cycle(&*source, &*publisher, &mut session, &mut store, &stats_path)
                            .await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            if let Some(s) = session.take() {
                if let Err(e) = source.release(s).await {
                    log::warn!("Fehler beim Schließen der Sitzung: {}", e);
                }
            }
        });

        self.state = State::Running { shutdown, worker };
        log::info!(
            "Bot läuft - Update-Intervall: {} Sekunden",
            period.as_secs()
        );
        Ok(())
    }

    /// Stop scheduling and wait for the worker to wind down
    ///
    /// A cycle already in flight finishes; the session is released even when
    /// release itself errors.
    pub async fn stop(&mut self) {
        let state = std::mem::replace(&mut self.state, State::Stopped);
        if let State::Running { shutdown, worker } = state {
            let _ = shutdown.send(true);
            if let Err(e) = worker.await {
                log::warn!("Update-Task endete mit Fehler: {}", e);
            }
            log::info!("Bot wurde beendet");
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }
}

/// One full update cycle
///
/// Public so tests can drive cycles directly against a store and mock
/// collaborators without a running scheduler.
pub async fn run_cycle<S: MetricSource, P: Publisher>(
    source: &S,
    publisher: &P,
    session: &mut Option<S::Session>,
    store: &mut StatsStore,
    stats_path: &Path,
) {
    let now = Utc::now();
    log::info!("Führe Update aus - {}", now.format("%H:%M:%S"));
    let now_ms = now.timestamp_millis();

    if session.is_none() {
        match source.acquire().await {
            Ok(s) => *session = Some(s),
            Err(e) => log::error!("Fehler beim Aufbau der Sitzung: {}", e),
        }
    }

    let sampled = match session.as_mut() {
        Some(s) => source.sample(s).await,
        None => Err(SampleError::NoSession),
    };

    let players = match sampled {
        Ok(count) => count,
        Err(e) => {
            log::error!("Fehler beim Abruf der Spielerzahl: {}", e);
            // Discard the session so the next cycle starts fresh
            if let Some(s) = session.take() {
                if let Err(re) = source.release(s).await {
                    log::warn!("Fehler beim Schließen der Sitzung: {}", re);
                }
            }
            0
        }
    };

    store.append(Sample {
        timestamp: now_ms,
        players,
    });

    let report = AggregateReport::from_store(store, now_ms);

    if let Err(e) = publisher.publish(players, &report).await {
        log::error!("Fehler beim Senden der Benachrichtigung: {}", e);
    }

    if let Err(e) = store.save(stats_path) {
        log::error!("Fehler beim Speichern der Statistiken: {}", e);
    }

    store.prune(now_ms);

    log::info!("Update abgeschlossen - {} Spieler online", players);
}
