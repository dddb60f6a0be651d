//! Metric source abstraction and the server-listing page adapter
//!
//! The scheduler talks to a `MetricSource` through a session handle so the
//! live HTTP client can be swapped for a test double. The concrete adapter
//! fetches the server detail page and pulls the player count out of the
//! connect-bar markup.

use {
    crate::error::{ResourceError, SampleError},
    async_trait::async_trait,
    std::time::Duration,
};

/// External capability producing one player count per invocation
#[async_trait]
pub trait MetricSource: Send + Sync {
    type Session: Send + 'static;

    /// Open the underlying session (http client, browser, ...)
    async fn acquire(&self) -> Result<Self::Session, ResourceError>;

    /// Fetch one sample using an open session
    async fn sample(&self, session: &mut Self::Session) -> Result<u32, SampleError>;

    /// Close the session; errors are logged by the caller and never fatal
    async fn release(&self, session: Self::Session) -> Result<(), ResourceError>;
}

const LISTING_BASE_URL: &str = "https://servers.redm.gg/servers/detail";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/90.0.4430.212 Safari/537.36";

/// Scrapes the player count from the public server listing page
pub struct ListingPageSource {
    server_id: String,
}

impl ListingPageSource {
    pub fn new(server_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
        }
    }

    fn detail_url(&self) -> String {
        format!("{}/{}", LISTING_BASE_URL, self.server_id)
    }
}

#[async_trait]
impl MetricSource for ListingPageSource {
    type Session = reqwest::Client;

    async fn acquire(&self) -> Result<reqwest::Client, ResourceError> {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(ResourceError::Session)
    }

    async fn sample(&self, session: &mut reqwest::Client) -> Result<u32, SampleError> {
        let response = session.get(self.detail_url()).send().await?;
        if !response.status().is_success() {
            return Err(SampleError::Status(response.status()));
        }

        let body = response.text().await?;
        // Missing markup counts as 0 players, not as an error
        Ok(extract_player_count(&body).unwrap_or(0))
    }

    async fn release(&self, _session: reqwest::Client) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// First integer inside the right half of the connect-bar markup
///
/// The count lives in `div.connect-bar div.right`, so the scan is scoped to
/// the `right` fragment to skip digits in earlier attributes.
pub fn extract_player_count(body: &str) -> Option<u32> {
    let bar = body.find("connect-bar")?;
    let right = bar + body[bar..].find("right")?;
    let digits: String = body[right..]
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
