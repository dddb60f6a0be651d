//! Rolling player-count history with JSON snapshot persistence
//!
//! The store is an append-only log of (timestamp, players) samples ordered by
//! insertion time. Retention is bounded to 30 days; `prune` is called at the
//! end of every update cycle. Loading is best-effort: a missing or corrupt
//! snapshot resets to an empty history instead of failing startup.

use {
    crate::error::PersistenceError,
    serde::{Deserialize, Serialize},
    std::{fs, path::Path},
};

/// Maximum sample age kept by `prune` (30 days in milliseconds)
pub const RETENTION_MS: i64 = 2_592_000_000;

/// One hour in milliseconds
pub const HOUR_MS: i64 = 3_600_000;

/// A single observation of the online player count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub players: u32,
}

/// Snapshot format written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub samples: Vec<Sample>,
}

/// In-memory rolling history, owned by the scheduler
#[derive(Debug, Default)]
pub struct StatsStore {
    samples: Vec<Sample>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// Append a sample to the end of the log
    ///
    /// The scheduler appends in real time, so insertion order is
    /// chronological. No validation is performed here.
    pub fn append(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Drop every sample older than 30 days
    ///
    /// A sample exactly at the retention boundary is kept. Idempotent for a
    /// fixed `now`.
    pub fn prune(&mut self, now: i64) {
        self.samples.retain(|s| now - s.timestamp <= RETENTION_MS);
    }

    /// Samples within the trailing window of `hours`, in original order
    ///
    /// The cutoff is inclusive: `now - timestamp <= hours * 3_600_000`.
    pub fn window(&self, now: i64, hours: i64) -> Vec<Sample> {
        let span = hours * HOUR_MS;
        self.samples
            .iter()
            .filter(|s| now - s.timestamp <= span)
            .copied()
            .collect()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Load the history snapshot, falling back to an empty store
    ///
    /// Losing history is non-fatal, so read or parse errors are logged and
    /// swallowed rather than propagated.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => store,
            Err(e) => {
                log::warn!(
                    "Fehler beim Laden der Statistiken, starte mit leerer Historie: {}",
                    e
                );
                Self::new()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self, PersistenceError> {
        if !path.exists() {
            log::info!("Keine gespeicherten Statistiken gefunden: {}", path.display());
            return Ok(Self::new());
        }

        let json = fs::read_to_string(path)?;
        let snapshot: StatsSnapshot = serde_json::from_str(&json)?;
        log::info!(
            "{} Einträge aus {} geladen",
            snapshot.samples.len(),
            path.display()
        );
        Ok(Self {
            samples: snapshot.samples,
        })
    }

    /// Write the current samples to `path`
    ///
    /// On failure the in-memory state stays untouched and remains the source
    /// of truth; the caller logs and continues.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let snapshot = StatsSnapshot {
            samples: self.samples.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(path, json)?;
        log::debug!(
            "{} Einträge nach {} gespeichert",
            self.samples.len(),
            path.display()
        );
        Ok(())
    }
}
