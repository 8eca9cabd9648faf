//! Generic inference HTTP client with timeout, retry, and backoff.
//!
//! Shared infrastructure for all HTTP-based collaborators (embedding
//! models, region detector, OCR, generative extraction). Retries live
//! here, inside the collaborator client; the orchestration layer above
//! never retries.

use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{CertivaError, Result};

/// Configuration for an inference HTTP client.
#[derive(Debug, Clone)]
pub struct InferenceHttpConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors.
    pub max_retries: u32,
    /// Initial retry interval.
    pub initial_interval: Duration,
    /// Maximum retry interval.
    pub max_interval: Duration,
}

impl Default for InferenceHttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(2),
        }
    }
}

/// JSON-over-HTTP client shared by the remote collaborator implementations.
pub struct InferenceHttpClient {
    client: Client,
    config: InferenceHttpConfig,
}

impl InferenceHttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: InferenceHttpConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// POST a JSON body and parse the JSON response, retrying transient
    /// failures with exponential backoff.
    ///
    /// `mk_unavailable` converts a failure description into the caller's
    /// "collaborator unavailable" error variant, so each collaborator
    /// surfaces its own taxonomy entry.
    pub async fn post_json<B, R>(
        &self,
        url: &str,
        body: &B,
        service: &str,
        mk_unavailable: impl Fn(String) -> CertivaError + Send + Sync,
    ) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let backoff = ExponentialBackoff {
            initial_interval: self.config.initial_interval,
            max_interval: self.config.max_interval,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries.max(1)),
            ..Default::default()
        };

        let mk_unavailable = &mk_unavailable;
        retry_notify(
            backoff,
            || async move { self.post_once(url, body, service, mk_unavailable).await },
            |err: CertivaError, duration: Duration| {
                warn!(
                    service = service,
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    async fn post_once<B, R>(
        &self,
        url: &str,
        body: &B,
        service: &str,
        mk_unavailable: &(impl Fn(String) -> CertivaError + Send + Sync),
    ) -> std::result::Result<R, backoff::Error<CertivaError>>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let latency_ms = start.elapsed().as_millis() as u64;
                warn!(service = service, error = %e, latency_ms, "Request failed");
                if is_transient_error(&e) {
                    backoff::Error::transient(mk_unavailable(format!(
                        "transient error (will retry): {e}"
                    )))
                } else {
                    backoff::Error::permanent(mk_unavailable(format!("request failed: {e}")))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let err = mk_unavailable(format!("{service} returned status {status}"));
            return if is_transient_status(status) {
                Err(backoff::Error::transient(err))
            } else {
                Err(backoff::Error::permanent(err))
            };
        }

        let parsed: R = response.json().await.map_err(|e| {
            backoff::Error::permanent(mk_unavailable(format!("failed to parse response: {e}")))
        })?;

        debug!(
            service = service,
            latency_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );

        Ok(parsed)
    }
}

/// Whether a reqwest error is worth retrying.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Whether an HTTP status suggests a transient condition.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferenceHttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_transient_status_classification() {
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
    }
}
