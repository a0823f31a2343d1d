//! HTTP retrieval of source pages.
//!
//! Pages are fetched one at a time with a fixed pause before every request,
//! so a run never hits the site faster than the configured delay. Network
//! errors and 5xx responses are retried; 4xx responses are not.

use std::time::Duration;

use reefpoints_shared::{FetchConfig, ReefPointsError, Result};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Maximum response size we accept (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Polite, retrying page fetcher.
pub struct Fetcher {
    client: Client,
    delay: Duration,
    attempts: u32,
}

impl Fetcher {
    /// Create a fetcher from runtime fetch settings.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            delay: Duration::from_millis(config.delay_ms),
            attempts: config.max_retries.max(1),
        })
    }

    /// Fetch a page's HTML text.
    ///
    /// Sleeps for the configured delay before each attempt. Gives up after the
    /// configured number of attempts, or at once on a client error.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &Url) -> Result<String> {
        let mut attempt = 1;
        loop {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            info!(attempt, "fetching");
            match fetch_once(&self.client, url).await {
                Ok(body) => {
                    debug!(bytes = body.len(), "fetched");
                    return Ok(body);
                }
                Err(FetchFailure::Fatal(e)) => return Err(e),
                Err(FetchFailure::Retryable(e)) if attempt < self.attempts => {
                    warn!(attempt, error = %e, "fetch failed, retrying");
                    attempt += 1;
                }
                Err(FetchFailure::Retryable(e)) => return Err(e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Outcome of a failed single attempt.
enum FetchFailure {
    Retryable(ReefPointsError),
    Fatal(ReefPointsError),
}

/// Build a reqwest client with browser-like headers.
fn build_client(config: &FetchConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| ReefPointsError::Network(format!("failed to build HTTP client: {e}")))
}

/// One GET request, classified into retryable and fatal failures.
async fn fetch_once(client: &Client, url: &Url) -> std::result::Result<String, FetchFailure> {
    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| FetchFailure::Retryable(ReefPointsError::Network(format!("{url}: {e}"))))?;

    let status = response.status();
    if status.is_server_error() {
        return Err(FetchFailure::Retryable(ReefPointsError::Network(format!(
            "{url}: HTTP {status}"
        ))));
    }
    if !status.is_success() {
        return Err(FetchFailure::Fatal(ReefPointsError::Network(format!(
            "{url}: HTTP {status}"
        ))));
    }

    if let Some(len) = response.content_length() {
        if len > MAX_RESPONSE_SIZE {
            return Err(FetchFailure::Fatal(ReefPointsError::validation(format!(
                "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
            ))));
        }
    }

    response.text().await.map_err(|e| {
        FetchFailure::Retryable(ReefPointsError::Network(format!(
            "{url}: failed to read body: {e}"
        )))
    })
}
