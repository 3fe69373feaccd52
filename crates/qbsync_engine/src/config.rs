//! Configuration for the sync client.

use std::time::Duration;

const API_ROOT: &str = "api/v2/";

/// Configuration for talking to one qBittorrent WebUI.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebUI address, always ending in `/`.
    pub base_url: String,
    /// Per-request timeout handed to the [`crate::HttpClient`].
    pub timeout: Duration,
    /// Delay between polls in [`crate::SyncEngine::run`].
    pub poll_interval: Duration,
}

impl ClientConfig {
    /// Creates a configuration for the WebUI at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(1500),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the delay between polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Root of the Web API, e.g. `http://localhost:8080/api/v2/`.
    pub fn api_url(&self) -> String {
        format!("{}{}", self.base_url, API_ROOT)
    }

    /// Full URL of an API endpoint such as `sync/maindata`.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_url(), endpoint)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080/")
    }
}
