//! Window aggregation over the rolling history
//!
//! Pure functions: the store is read, never mutated. Uses strict time-cutoff
//! windows (24h / 7d / 30d), matching the retention horizon of the store.

use crate::store::StatsStore;

/// Aggregate statistics for one trailing window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// Mean player count, rounded half-up to one decimal
    pub average: f64,
    pub max: u32,
    pub min: u32,
}

impl WindowStats {
    /// Aggregate a slice of player counts
    ///
    /// An empty window yields {0.0, 0, 0} rather than an error.
    pub fn from_values(values: &[u32]) -> Self {
        if values.is_empty() {
            return Self {
                average: 0.0,
                max: 0,
                min: 0,
            };
        }

        let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
        // f64::round is half-away-from-zero, which is half-up for counts
        let average = (sum as f64 / values.len() as f64 * 10.0).round() / 10.0;

        Self {
            average,
            max: values.iter().copied().max().unwrap_or(0),
            min: values.iter().copied().min().unwrap_or(0),
        }
    }
}

/// Per-cycle summary over the three standard windows
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub day: WindowStats,
    pub week: WindowStats,
    pub month: WindowStats,
}

impl AggregateReport {
    /// Compute day/week/month stats from the store's current contents
    pub fn from_store(store: &StatsStore, now: i64) -> Self {
        let values = |hours: i64| -> Vec<u32> {
            store.window(now, hours).iter().map(|s| s.players).collect()
        };

        Self {
            day: WindowStats::from_values(&values(24)),
            week: WindowStats::from_values(&values(168)),
            month: WindowStats::from_values(&values(720)),
        }
    }
}
