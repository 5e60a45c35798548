/**
 * Graceful shutdown across all three pipelines (spec §7).
 *
 * Each `Pipeline` knows how to drain and stop its own workers; this module
 * only aggregates that into the single `close()` outcome a `Sink` reports:
 * either everything drained in time, or a `ShutdownReport` naming what
 * didn't.
 */
use std::time::Duration;

use crate::error::{ShutdownReport, SinkError};
use crate::metrics::SinkStats;
use crate::pipeline::Pipeline;
use crate::record::Kind;

/// Cancels and drains all three pipelines, waiting up to `timeout` for
/// each. Returns `Ok(())` only if every worker finished and no records
/// were left buffered; otherwise returns a populated `ShutdownReport`.
pub async fn close_all(
    datapoints: &mut Pipeline,
    events: &mut Pipeline,
    spans: &mut Pipeline,
    timeout: Duration,
    stats: &SinkStats,
) -> Result<(), SinkError> {
    // Signal all three pipelines before waiting on any of them, so a stalled
    // transport in one pipeline doesn't push the others past their own share
    // of `timeout`. The three waits below share one deadline, not 3x it.
    datapoints.begin_shutdown();
    events.begin_shutdown();
    spans.begin_shutdown();

    let deadline = tokio::time::Instant::now() + timeout;
    let remaining_budget = || deadline.saturating_duration_since(tokio::time::Instant::now());

    let datapoints_remaining = datapoints.await_shutdown(remaining_budget()).await;
    let events_remaining = events.await_shutdown(remaining_budget()).await;
    let spans_remaining = spans.await_shutdown(remaining_budget()).await;

    let workers_remaining = datapoints_remaining + events_remaining + spans_remaining;
    let dropped = |kind: Kind| stats.buffered(kind).max(0) as u64;

    let report = ShutdownReport {
        workers_remaining,
        datapoints_dropped: dropped(Kind::Datapoints),
        events_dropped: dropped(Kind::Events),
        spans_dropped: dropped(Kind::Spans),
    };

    if workers_remaining == 0
        && report.datapoints_dropped == 0
        && report.events_dropped == 0
        && report.spans_dropped == 0
    {
        Ok(())
    } else {
        Err(SinkError::ShutdownIncomplete(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SinkParams;
    use crate::metrics::token_status;
    use crate::record::Record;
    use crate::transport::{Transport, TransportError, TransportFactory};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoopTransport;

    #[async_trait]
    impl Transport<Record> for NoopTransport {
        async fn send(&self, _token: &str, _records: &[Record]) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn factory() -> TransportFactory<Record> {
        Arc::new(|| Ok(Arc::new(NoopTransport) as Arc<dyn Transport<Record>>))
    }

    fn stats() -> Arc<SinkStats> {
        let (d, _, _) = token_status::spawn(Kind::Datapoints, 16);
        let (e, _, _) = token_status::spawn(Kind::Events, 16);
        let (s, _, _) = token_status::spawn(Kind::Spans, 16);
        Arc::new(SinkStats::new([d, e, s]))
    }

    #[tokio::test]
    async fn clean_shutdown_with_nothing_buffered() {
        let params = SinkParams {
            num_channels: 1,
            num_draining_threads: 1,
            ..SinkParams::default()
        };
        let stats = stats();
        let mut datapoints =
            Pipeline::start(Kind::Datapoints, &params, factory(), Arc::new(|_| {}), stats.clone()).unwrap();
        let mut events =
            Pipeline::start(Kind::Events, &params, factory(), Arc::new(|_| {}), stats.clone()).unwrap();
        let mut spans =
            Pipeline::start(Kind::Spans, &params, factory(), Arc::new(|_| {}), stats.clone()).unwrap();

        let result = close_all(
            &mut datapoints,
            &mut events,
            &mut spans,
            Duration::from_secs(2),
            &stats,
        )
        .await;

        assert!(result.is_ok());
    }
}
