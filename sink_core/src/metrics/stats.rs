/**
 * Aggregate self-observability surface (spec §5).
 *
 * `SinkStats` is the single object a `Sink` exposes for introspection: how
 * many records are currently buffered per kind, how many retry attempts
 * have been made in total, the shape of batch sizes actually flushed, and
 * a per-token-status breakdown pulled from each kind's serializer task.
 *
 * Gauges and the retry counter are plain atomics — cheap to update from
 * any worker without a round trip through a task. The per-token-status
 * breakdown is the one piece that needs a consistent multi-writer view,
 * so it stays behind `token_status::spawn`.
 */
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

use metrics::{counter, gauge, histogram};

use super::token_status::{StatusPoint, TokenStatusHandle};
use crate::record::Kind;

/// One row of the self-metrics surface, shaped for forwarding to whatever
/// metrics backend a caller has wired `metrics` up to.
#[derive(Debug, Clone)]
pub struct MetricPoint {
    pub name: &'static str,
    pub dims: Vec<(String, String)>,
    pub value: f64,
}

#[derive(Default)]
struct BatchSizeAccumulator {
    count: u64,
    sum: u64,
    min: u64,
    max: u64,
}

impl BatchSizeAccumulator {
    fn observe(&mut self, size: u64) {
        if self.count == 0 {
            self.min = size;
            self.max = size;
        } else {
            self.min = self.min.min(size);
            self.max = self.max.max(size);
        }
        self.count += 1;
        self.sum += size;
    }
}

pub struct SinkStats {
    buffered: [AtomicI64; 3],
    retries: AtomicU64,
    batch_sizes: [Mutex<BatchSizeAccumulator>; 3],
    token_status: [TokenStatusHandle; 3],
}

impl SinkStats {
    pub fn new(token_status: [TokenStatusHandle; 3]) -> Self {
        Self {
            buffered: Default::default(),
            retries: AtomicU64::new(0),
            batch_sizes: [Mutex::default(), Mutex::default(), Mutex::default()],
            token_status,
        }
    }

    /// Called when a router accepts `delta` records into a shard channel.
    pub fn record_buffered(&self, kind: Kind, delta: i64) {
        let idx = kind.index();
        self.buffered[idx].fetch_add(delta, Ordering::Relaxed);
        gauge!("sink_buffered_records", "kind" => kind.as_str().to_string())
            .set(self.buffered[idx].load(Ordering::Relaxed) as f64);
    }

    /// Called when a worker flushes a batch, successful or not.
    pub fn record_flushed(&self, kind: Kind, batch_len: usize) {
        self.record_buffered(kind, -(batch_len as i64));

        let mut acc = self.batch_sizes[kind.index()].lock().unwrap_or_else(|e| e.into_inner());
        acc.observe(batch_len as u64);
        histogram!("sink_batch_size", "kind" => kind.as_str().to_string())
            .record(batch_len as f64);
    }

    /// Called once per retry attempt beyond the first (spec §4.3 — the
    /// initial attempt never increments this).
    pub fn record_retry(&self, kind: Kind) {
        self.retries.fetch_add(1, Ordering::Relaxed);
        counter!("sink_retries_total", "kind" => kind.as_str().to_string()).increment(1);
    }

    /// Records the outcome of one flush attempt against the per-token
    /// status breakdown for `kind`.
    pub fn record_status(&self, kind: Kind, token: &str, status: crate::transport::TransportStatus) {
        self.token_status[kind.index()].record(token, status, 1);
    }

    /// Total retry attempts made across every kind since construction.
    pub fn retries_total(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Records currently buffered (accepted but not yet flushed) for `kind`.
    pub fn buffered(&self, kind: Kind) -> i64 {
        self.buffered[kind.index()].load(Ordering::Relaxed)
    }

    /// Assembles the full self-metrics surface as a flat list of points,
    /// merging gauges, the retry counter, batch-size summaries, and every
    /// kind's per-token-status breakdown.
    pub async fn snapshot(&self) -> Vec<MetricPoint> {
        let mut points = Vec::new();

        for kind in [Kind::Datapoints, Kind::Events, Kind::Spans] {
            let dims = vec![("kind".to_string(), kind.as_str().to_string())];
            points.push(MetricPoint {
                name: "sink_buffered_records",
                dims: dims.clone(),
                value: self.buffered(kind) as f64,
            });

            let acc = self.batch_sizes[kind.index()]
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if acc.count > 0 {
                points.push(MetricPoint {
                    name: "sink_batch_size_min",
                    dims: dims.clone(),
                    value: acc.min as f64,
                });
                points.push(MetricPoint {
                    name: "sink_batch_size_max",
                    dims: dims.clone(),
                    value: acc.max as f64,
                });
                points.push(MetricPoint {
                    name: "sink_batch_size_avg",
                    dims: dims.clone(),
                    value: acc.sum as f64 / acc.count as f64,
                });
            }
            drop(acc);

            for StatusPoint { token, status, count, .. } in
                self.token_status[kind.index()].snapshot().await
            {
                points.push(MetricPoint {
                    name: "sink_status_total",
                    dims: vec![
                        ("kind".to_string(), kind.as_str().to_string()),
                        ("token".to_string(), token),
                        ("status".to_string(), status.to_string()),
                    ],
                    value: count as f64,
                });
            }
        }

        points.push(MetricPoint {
            name: "sink_retries_total",
            dims: Vec::new(),
            value: self.retries_total() as f64,
        });

        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::token_status;

    fn handles() -> [TokenStatusHandle; 3] {
        let (d, _, _) = token_status::spawn(Kind::Datapoints, 16);
        let (e, _, _) = token_status::spawn(Kind::Events, 16);
        let (s, _, _) = token_status::spawn(Kind::Spans, 16);
        [d, e, s]
    }

    #[test]
    fn buffered_tracks_net_delta() {
        let stats = SinkStats::new(handles());
        stats.record_buffered(Kind::Events, 5);
        stats.record_buffered(Kind::Events, -2);
        assert_eq!(stats.buffered(Kind::Events), 3);
    }

    #[test]
    fn flushed_decrements_buffered() {
        let stats = SinkStats::new(handles());
        stats.record_buffered(Kind::Spans, 10);
        stats.record_flushed(Kind::Spans, 4);
        assert_eq!(stats.buffered(Kind::Spans), 6);
    }

    #[test]
    fn retries_accumulate_per_call() {
        let stats = SinkStats::new(handles());
        stats.record_retry(Kind::Datapoints);
        stats.record_retry(Kind::Datapoints);
        assert_eq!(stats.retries_total(), 2);
    }

    #[tokio::test]
    async fn snapshot_includes_status_points() {
        let stats = SinkStats::new(handles());
        stats.record_status(Kind::Events, "tenant-a", 200);
        stats.record_status(Kind::Events, "tenant-a", 500);

        let points = stats.snapshot().await;
        let status_points: Vec<_> = points.iter().filter(|p| p.name == "sink_status_total").collect();
        assert_eq!(status_points.len(), 2);
    }
}
