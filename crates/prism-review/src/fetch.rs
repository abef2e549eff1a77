use std::time::Duration;

use async_trait::async_trait;
use prism_core::{ContentLocator, PrismError};

/// Marker appended to content cut at the character limit.
pub const TRUNCATION_MARKER: &str = "\n\n...truncated...";

/// Source of raw file content.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Return the full text behind `locator`.
    ///
    /// An `Ok` empty string means the file exists and is empty; a fetch
    /// failure is reported as an error.
    async fn fetch(&self, locator: &ContentLocator) -> Result<String, PrismError>;
}

/// Fetches raw content over HTTP without authentication, or from disk for
/// [`ContentLocator::Path`].
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`PrismError::Fetch`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, PrismError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("prism/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PrismError::Fetch(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, locator: &ContentLocator) -> Result<String, PrismError> {
        match locator {
            ContentLocator::Path(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                PrismError::Fetch(format!("failed to read {}: {e}", path.display()))
            }),
            ContentLocator::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| PrismError::Fetch(format!("request to {url} failed: {e}")))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(PrismError::Fetch(format!("{url} returned {status}")));
                }

                response
                    .text()
                    .await
                    .map_err(|e| PrismError::Fetch(format!("failed to read {url}: {e}")))
            }
        }
    }
}

/// Cut `content` to its first `max_chars` characters and append
/// [`TRUNCATION_MARKER`]. Content at or under the limit is returned as is.
///
/// Counts `char`s, so a multi-byte character is never split.
pub fn truncate_content(content: String, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut truncated = content;
            truncated.truncate(cut);
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => content,
    }
}
