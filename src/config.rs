use std::{env, path::PathBuf};

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub update_interval_secs: u64,
    pub webhook_url: String,
    pub server_id: String,
    pub stats_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// WEBHOOK_URL and SERVER_ID are required; UPDATE_INTERVAL_SECS defaults
    /// to 3600 and must be greater than zero; STATS_PATH defaults to
    /// stats_db.json in the working directory.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let webhook_url = env::var("WEBHOOK_URL").map_err(|_| "WEBHOOK_URL must be set")?;
        let server_id = env::var("SERVER_ID").map_err(|_| "SERVER_ID must be set")?;

        let update_interval_secs = env::var("UPDATE_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);
        if update_interval_secs == 0 {
            return Err("UPDATE_INTERVAL_SECS must be greater than zero".into());
        }

        let stats_path = env::var("STATS_PATH")
            .unwrap_or_else(|_| "stats_db.json".to_string())
            .into();

        Ok(Self {
            update_interval_secs,
            webhook_url,
            server_id,
            stats_path,
        })
    }
}
