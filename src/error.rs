//! Error taxonomy for the update cycle
//!
//! Each failure class gets its own type so the scheduler can treat them
//! differently: sampling failures degrade to a zero sample, publish and
//! persistence failures are logged and skipped, only startup errors are
//! allowed to terminate the process.

use thiserror::Error;

/// Acquiring or releasing the metric source session failed
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to build http session: {0}")]
    Session(#[source] reqwest::Error),
    #[error("session unavailable: {0}")]
    Unavailable(String),
}

/// A single sampling attempt failed
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("listing page returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("no session available")]
    NoSession,
}

/// Notification delivery failed
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Loading or saving the rolling history failed
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}
