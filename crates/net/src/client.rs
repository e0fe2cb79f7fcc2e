//! HTTP client with connection pooling

use modelsync_config::NetworkConfig;
use modelsync_errors::{Error, NetworkError};
use reqwest::{Client, Response};
use std::time::Duration;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// Longest wait for the response headers; the body is bounded by
    /// `chunk_timeout` only, so large transfers are never cut off
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Longest silence tolerated between two body chunks
    pub chunk_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(30),
            chunk_timeout: Duration::from_secs(60),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: default_user_agent(),
        }
    }
}

impl From<&NetworkConfig> for NetConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            chunk_timeout: config.chunk_timeout(),
            user_agent: config
                .user_agent
                .clone()
                .unwrap_or_else(default_user_agent),
            ..Self::default()
        }
    }
}

fn default_user_agent() -> String {
    format!("modelsync/{}", env!("CARGO_PKG_VERSION"))
}

/// HTTP client wrapper
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Wrap a caller-provided reqwest client
    #[must_use]
    pub fn from_client(client: Client, config: NetConfig) -> Self {
        Self { client, config }
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// Execute a single GET request
    ///
    /// # Errors
    ///
    /// Returns an error when the headers do not arrive within the configured
    /// timeout, on connection failures, or on other transport errors.
    /// Non-success status codes are returned as responses.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        let request = self.client.get(url).send();
        match tokio::time::timeout(self.config.timeout, request).await {
            Ok(response) => response.map_err(|e| classify(&e).into()),
            Err(_) => Err(NetworkError::Timeout {
                url: url.to_string(),
            }
            .into()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Get the underlying reqwest client for advanced usage
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Map a reqwest failure onto the network error taxonomy
pub(crate) fn classify(error: &reqwest::Error) -> NetworkError {
    let url = error
        .url()
        .map(std::string::ToString::to_string)
        .unwrap_or_default();

    if error.is_timeout() {
        NetworkError::Timeout { url }
    } else if error.is_connect() {
        NetworkError::ConnectionRefused(error.to_string())
    } else if error.is_builder() {
        NetworkError::InvalidUrl(error.to_string())
    } else {
        NetworkError::DownloadFailed(error.to_string())
    }
}
