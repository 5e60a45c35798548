/**
 * The seam between a pipeline and the outside world (spec §4).
 *
 * The reference sink owns its HTTP client directly; here it is a trait so
 * the default `HttpTransport` can sit next to a test double without the
 * worker or pipeline caring which one it's holding.
 */
pub mod classify;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;

pub use classify::{classify, is_retryable, reason_phrase, TransportStatus};
pub use http::{default_http_client, HttpTransport, HttpTransportConfig};

/// What a `Transport::send` can fail with, distinct from the HTTP status
/// classification layered on top in `classify`.
#[derive(Debug, Clone)]
pub enum TransportError {
    /// The request never produced a response: connect/timeout/DNS/TLS.
    Request(String),
    /// The server responded with a non-2xx status.
    Api(u16),
    /// The server responded 429. Kept distinct from `Api` so callers that
    /// want to special-case rate limiting (outside the core's retry loop,
    /// which treats it as terminal) can match on it directly.
    TooManyRequests(u16),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Request(msg) => write!(f, "transport request failed: {msg}"),
            TransportError::Api(code) => write!(f, "server responded with status {code}"),
            TransportError::TooManyRequests(code) => {
                write!(f, "server responded with status {code} (rate limited)")
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Sends one token's batch of records to the ingestion service. A worker
/// constructs exactly one `Transport` per pipeline (spec §4.2,
/// `httpClientFactory` invoked once per worker) and reuses it across every
/// batch and retry attempt that worker handles.
#[async_trait]
pub trait Transport<R>: Send + Sync {
    async fn send(&self, token: &str, records: &[R]) -> Result<(), TransportError>;
}

/// Builds a fresh `Transport` for a worker. Invoked exactly once per
/// worker at spawn time, mirroring the reference sink's one-agent-per-
/// worker-thread shape.
pub type TransportFactory<R> =
    Arc<dyn Fn() -> Result<Arc<dyn Transport<R>>, crate::error::SinkError> + Send + Sync>;

/// Reported to a user-supplied `ErrorHandler` when a flush exhausts its
/// retries without success (spec §4.3, §7).
#[derive(Debug, Clone)]
pub struct FlushError {
    pub token: String,
    pub status: TransportStatus,
}

impl std::fmt::Display for FlushError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "flush failed for token {} with status {}",
            self.token, self.status
        )
    }
}

impl std::error::Error for FlushError {}

/// Called once per exhausted flush. Never invoked while holding a shard
/// lock or blocking a worker's receive loop — see `worker::flush`.
pub type ErrorHandler = Arc<dyn Fn(FlushError) + Send + Sync>;
