/**
 * One telemetry kind's full router-to-workers-to-transport assembly
 * (spec §3, §4).
 *
 * A `Pipeline` owns the shard channels, the router in front of them, and
 * the worker tasks draining them. There is exactly one `Pipeline` per
 * kind inside a `Sink` — they never share channels or workers, which is
 * what rules out the cross-kind hash collision the reference sink's
 * single shared hasher would otherwise risk (see `DESIGN.md`).
 */
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::SinkParams;
use crate::error::SinkError;
use crate::metrics::SinkStats;
use crate::record::{Kind, Message, Record};
use crate::router::Router;
use crate::transport::{ErrorHandler, TransportFactory};
use crate::worker::Worker;

pub struct Pipeline {
    kind: Kind,
    router: Router<Record>,
    workers: JoinSet<()>,
    shutdown: CancellationToken,
    stats: Arc<SinkStats>,
}

impl Pipeline {
    /// Builds the shard channels, constructs a `Transport` per worker via
    /// `factory`, and spawns every worker task. `factory` is invoked once
    /// per worker, matching the reference sink's one-client-per-thread
    /// lifetime.
    pub fn start(
        kind: Kind,
        params: &SinkParams,
        factory: TransportFactory<Record>,
        error_handler: ErrorHandler,
        stats: Arc<SinkStats>,
    ) -> Result<Self, SinkError> {
        params.validate()?;

        let shutdown = CancellationToken::new();
        let mut senders = Vec::with_capacity(params.num_channels);
        let mut receivers = Vec::with_capacity(params.num_channels);
        for _ in 0..params.num_channels {
            let (tx, rx) = async_channel::bounded(params.buffer);
            senders.push(tx);
            receivers.push(rx);
        }

        let mut workers = JoinSet::new();
        let mut worker_id = 0;
        for receiver in receivers {
            for _ in 0..params.num_draining_threads {
                let transport = factory()?;
                let worker = Worker {
                    id: worker_id,
                    kind,
                    receiver: receiver.clone(),
                    transport,
                    batch_size: params.batch_size,
                    max_retry: params.max_retry,
                    error_handler: error_handler.clone(),
                    stats: stats.clone(),
                    shutdown: shutdown.clone(),
                };
                workers.spawn(worker.run());
                worker_id += 1;
            }
        }

        info!(kind = %kind, channels = params.num_channels, workers = worker_id, "pipeline started");

        Ok(Self {
            kind,
            router: Router::new(senders),
            workers,
            shutdown,
            stats,
        })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn num_channels(&self) -> usize {
        self.router.num_channels()
    }

    /// Routes `records` to the shard selected by `token`.
    pub fn submit(&self, token: &str, records: Vec<Record>) -> Result<(), SinkError> {
        if token.is_empty() {
            return Err(SinkError::MissingToken);
        }
        let len = records.len() as i64;
        self.router
            .route(token, Message::new(token.to_string(), records))?;
        // Worker flushes subtract this back off once the batch is sent.
        self.stats.record_buffered(self.kind, len);
        Ok(())
    }

    /// Signals every worker to stop accepting new batches and drain what
    /// remains. Does not wait; call `await_shutdown` afterwards. Split out
    /// so a caller coordinating several pipelines can cancel all of them
    /// before waiting on any one, keeping the total wait bounded by a single
    /// shared deadline rather than one `timeout` per pipeline.
    pub fn begin_shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Waits up to `timeout` for this pipeline's workers to finish draining.
    /// Returns the number of workers that had not finished when the timeout
    /// expired. Assumes `begin_shutdown` has already been called; if it
    /// hasn't, this call signals it first.
    pub async fn await_shutdown(&mut self, timeout: std::time::Duration) -> usize {
        self.shutdown.cancel();
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.workers.is_empty() {
                return 0;
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return self.workers.len();
            }
            match tokio::time::timeout(remaining, self.workers.join_next()).await {
                Ok(Some(_)) => continue,
                Ok(None) => return 0,
                Err(_) => return self.workers.len(),
            }
        }
    }

    /// Convenience for callers that only manage one pipeline: cancels and
    /// waits in one call.
    pub async fn shutdown(&mut self, timeout: std::time::Duration) -> usize {
        self.begin_shutdown();
        self.await_shutdown(timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Transport, TransportError};
    use async_trait::async_trait;
    use std::time::Duration;

    struct NoopTransport;

    #[async_trait]
    impl Transport<Record> for NoopTransport {
        async fn send(&self, _token: &str, _records: &[Record]) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn stats() -> Arc<SinkStats> {
        use crate::metrics::token_status;
        let (d, _, _) = token_status::spawn(Kind::Datapoints, 16);
        let (e, _, _) = token_status::spawn(Kind::Events, 16);
        let (s, _, _) = token_status::spawn(Kind::Spans, 16);
        Arc::new(SinkStats::new([d, e, s]))
    }

    fn factory() -> TransportFactory<Record> {
        Arc::new(|| Ok(Arc::new(NoopTransport) as Arc<dyn Transport<Record>>))
    }

    #[tokio::test]
    async fn submit_rejects_empty_token() {
        let params = SinkParams {
            num_channels: 1,
            num_draining_threads: 1,
            ..SinkParams::default()
        };
        let pipeline = Pipeline::start(Kind::Events, &params, factory(), Arc::new(|_| {}), stats()).unwrap();
        let err = pipeline.submit("", vec![Record::new(serde_json::json!({}))]).unwrap_err();
        assert!(matches!(err, SinkError::MissingToken));
    }

    #[tokio::test]
    async fn shutdown_completes_within_timeout() {
        let params = SinkParams {
            num_channels: 2,
            num_draining_threads: 1,
            ..SinkParams::default()
        };
        let mut pipeline =
            Pipeline::start(Kind::Datapoints, &params, factory(), Arc::new(|_| {}), stats()).unwrap();
        pipeline
            .submit("tenant-a", vec![Record::new(serde_json::json!({"n": 1}))])
            .unwrap();

        let remaining = pipeline.shutdown(Duration::from_secs(2)).await;
        assert_eq!(remaining, 0);
    }
}
