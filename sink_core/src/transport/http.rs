/*!
 * HTTP transport layer for sending records to the ingestion service.
 *
 * Uses `reqwest` — an async HTTP client built on the same tokio runtime the
 * worker tasks already run on, so a slow send just yields instead of
 * blocking an OS thread.
 *
 * Design decisions:
 * - **Async I/O** — a worker awaits `send` inline between batches; nothing
 *   here spawns its own task.
 * - **Caller decides retries** — this transport reports what happened
 *   (success, an HTTP status, or a transport failure) and leaves the
 *   decision to retry entirely to `worker::flush`.
 * - **One client per worker** — `TransportFactory` is invoked once per
 *   worker at spawn time (spec §4.2); connection pooling and keep-alive are
 *   then scoped to that one client for the worker's lifetime.
 */
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{Transport, TransportError};

/// Per-pipeline HTTP configuration: where to send, and how to authenticate
/// the token on the wire.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub endpoint: String,
    pub user_agent: String,
    /// Header name the token is sent under, e.g. `"X-Sink-Token"`.
    pub token_header: String,
}

/**
 * Thin wrapper around `reqwest::Client` responsible for delivering
 * serialized records to the ingestion endpoint.
 *
 * One `HttpTransport` is built per worker by the pipeline's
 * `TransportFactory` and reused for every batch that worker flushes.
 */
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, config: HttpTransportConfig) -> Self {
        Self { client, config }
    }
}

/**
 * Builds a `reqwest::Client` with the reference sink's timeout budget:
 * 10 s connect, 30 s total per request. Connection pooling and keep-alive
 * are handled by the client internally.
 */
pub fn default_http_client(user_agent: &str) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .user_agent(user_agent.to_string())
        .build()
}

#[async_trait]
impl<R> Transport<R> for HttpTransport
where
    R: Serialize + Send + Sync,
{
    async fn send(&self, token: &str, records: &[R]) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(&self.config.token_header, token)
            .json(records)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 429 {
            return Err(TransportError::TooManyRequests(429));
        }
        Err(TransportError::Api(status.as_u16()))
    }
}

/// Convenience alias for the factory signature `Pipeline` expects, bound to
/// the default HTTP transport.
pub fn http_factory<R>(
    config: HttpTransportConfig,
) -> super::TransportFactory<R>
where
    R: Serialize + Send + Sync + 'static,
{
    Arc::new(move || {
        let client = default_http_client(&config.user_agent)
            .map_err(|err| crate::error::SinkError::InvalidConfig(err.to_string()))?;
        let transport: Arc<dyn Transport<R>> =
            Arc::new(HttpTransport::new(client, config.clone()));
        Ok(transport)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_builds() {
        assert!(default_http_client("sink-test/0.1").is_ok());
    }
}
