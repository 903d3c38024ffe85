//! HTTP client adapter for the remote catalog
//!
//! Thin wrapper around a configured `reqwest::Client`. Its whole contract
//! is per-request timeouts, typed JSON decoding, and mapping transport
//! failures onto the [`ApiError`] taxonomy; retry policy lives one layer up.

use anyhow::{Result, anyhow};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::infrastructure::api_error::{ApiError, ApiResult};

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Fallback timeout applied by the underlying client
    pub default_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            user_agent: "swapi-sync/0.2".to_string(),
        }
    }
}

/// HTTP client enforcing a per-request timeout on every call
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: &HttpClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.default_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client })
    }

    /// GET a URL and decode the JSON body into `T`.
    ///
    /// 404 maps to [`ApiError::NotFound`], other non-2xx to
    /// [`ApiError::Status`], transport and decode failures to
    /// [`ApiError::Network`] / [`ApiError::Malformed`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> ApiResult<T> {
        debug!("HTTP GET {url} (timeout {timeout:?})");
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| ApiError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.json::<T>().await.map_err(|source| {
            if source.is_decode() {
                ApiError::malformed(url, "body is not the expected JSON shape")
            } else {
                ApiError::Network {
                    url: url.to_string(),
                    source,
                }
            }
        })
    }

    /// GET a URL and report only whether the resource exists.
    ///
    /// Used by the discovery range probe; the body is discarded. A 404 is a
    /// definitive "no", any other non-2xx stays retryable.
    pub async fn exists(&self, url: &str, timeout: Duration) -> ApiResult<bool> {
        debug!("HTTP GET (probe) {url}");
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| ApiError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::with_config(&HttpClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_custom_config() {
        let config = HttpClientConfig {
            default_timeout: Duration::from_secs(5),
            user_agent: "Test Agent".to_string(),
        };
        let client = HttpClient::with_config(&config);
        assert!(client.is_ok());
    }
}
