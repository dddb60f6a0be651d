//! Notification publishing
//!
//! `Publisher` is the seam towards the notification channel; the concrete
//! implementation posts a Discord webhook embed with the current count and
//! the three window summaries.

use {
    crate::{
        error::PublishError,
        stats::{AggregateReport, WindowStats},
    },
    async_trait::async_trait,
    chrono::Utc,
    serde_json::json,
    std::time::Duration,
};

/// External capability delivering one rendered summary per cycle
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, current: u32, report: &AggregateReport) -> Result<(), PublishError>;
}

const EMBED_COLOR: u32 = 3_447_003; // discord blue

/// Posts the per-cycle summary embed to a Discord webhook
pub struct DiscordWebhook {
    webhook_url: String,
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            webhook_url: webhook_url.into(),
            client,
        })
    }
}

fn field_value(stats: &WindowStats) -> String {
    format!(
        "Durchschnitt: {}\nMaximum: {}\nMinimum: {}",
        stats.average, stats.max, stats.min
    )
}

#[async_trait]
impl Publisher for DiscordWebhook {
    async fn publish(&self, current: u32, report: &AggregateReport) -> Result<(), PublishError> {
        let embed = json!({
            "title": "Misty Mountain - Aktuelle Spielerzahl",
            "description": format!("**{}** Spieler online", current),
            "color": EMBED_COLOR,
            "timestamp": Utc::now().to_rfc3339(),
            "fields": [
                { "name": "24 Stunden", "value": field_value(&report.day), "inline": true },
                { "name": "7 Tage", "value": field_value(&report.week), "inline": true },
                { "name": "30 Tage", "value": field_value(&report.month), "inline": true },
            ],
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&json!({ "embeds": [embed] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PublishError::Status(response.status()));
        }
        Ok(())
    }
}
