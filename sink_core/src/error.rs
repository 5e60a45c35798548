/**
 * The closed set of error kinds a sink can raise (spec §7).
 *
 * Submission errors are synchronous and returned to the caller. Flush
 * errors are a different, smaller type (`transport::FlushError`) that
 * never crosses this boundary — they only ever reach the user-supplied
 * error handler, because by the time a flush fails the original submission
 * has long since returned success.
 */
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    /// Context-form submission found no token under `TokenCtxKey`.
    #[error("no token present in submission context")]
    MissingToken,

    /// `num_channels` is zero.
    #[error("sink has zero shard channels configured")]
    NoWorkers,

    /// Router hashing state was not initialized (reserved for hashers that
    /// need setup beyond a pure function; the default FNV-1a hasher never
    /// raises this).
    #[error("router hasher is not initialized")]
    HasherUnavailable,

    /// The shutdown broadcast has already been observed.
    #[error("sink is shutting down")]
    Closed,

    /// The shard's input channel was at capacity; the caller should apply
    /// its own backpressure.
    #[error("shard input channel is at capacity")]
    QueueFull,

    /// Raised at construction time, not submission time — distinct from
    /// `NoWorkers`/`QueueFull` so construction failures and runtime
    /// backpressure never share a variant.
    #[error("invalid sink configuration: {0}")]
    InvalidConfig(String),

    /// At least one worker did not finish before `shutdown_timeout`, or
    /// records remained buffered when the timeout expired.
    #[error("shutdown did not complete before the timeout: {0}")]
    ShutdownIncomplete(ShutdownReport),
}

/// Payload for `SinkError::ShutdownIncomplete` — counts of what `Close()`
/// could not account for before giving up (spec §7).
#[derive(Debug, Clone, Default)]
pub struct ShutdownReport {
    pub workers_remaining: usize,
    pub datapoints_dropped: u64,
    pub events_dropped: u64,
    pub spans_dropped: u64,
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} workers still running, dropped datapoints={} events={} spans={}",
            self.workers_remaining, self.datapoints_dropped, self.events_dropped, self.spans_dropped
        )
    }
}
