/**
 * Per-token status counters (spec §5, self-observability).
 *
 * Every flush outcome is keyed by `(token, status)` and counted. A single
 * task owns the counts — no `Mutex<HashMap<..>>` shared across workers —
 * and answers both increments and point-in-time snapshots over the same
 * channel so a snapshot always reflects every increment sent before it.
 */
use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::super::record::Kind;
use super::super::transport::TransportStatus;

/// One `(token, status)` count, as reported by a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPoint {
    pub kind: Kind,
    pub token: String,
    pub status: TransportStatus,
    pub count: u64,
}

enum Op {
    Increment { token: String, status: TransportStatus, delta: u64 },
    Snapshot(oneshot::Sender<Vec<StatusPoint>>),
}

/// Handle a worker or pipeline holds to record outcomes and a reporter
/// holds to read snapshots. Cloning is cheap — it's just two `mpsc`
/// senders.
#[derive(Clone)]
pub struct TokenStatusHandle {
    kind: Kind,
    tx: mpsc::Sender<Op>,
}

impl TokenStatusHandle {
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Records `delta` occurrences of `status` for `token`. Non-blocking:
    /// if the serializer's input queue is momentarily full, the increment
    /// is dropped rather than stalling the caller. Self-metrics are
    /// observability, not a ledger — losing a count under extreme load is
    /// preferable to a worker backing up behind its own status counter.
    pub fn record(&self, token: &str, status: TransportStatus, delta: u64) {
        let _ = self.tx.try_send(Op::Increment {
            token: token.to_string(),
            status,
            delta,
        });
    }

    /// Reads a consistent snapshot of every count recorded so far for this
    /// kind. Waits for the serializer to process every increment enqueued
    /// before this call.
    pub async fn snapshot(&self) -> Vec<StatusPoint> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(Op::Snapshot(reply_tx)).await.is_err() {
            return Vec::new();
        }
        reply_rx.await.unwrap_or_default()
    }
}

/// Spawns the serializer task for one kind's status counters. Returns a
/// handle for callers, the cancellation token that stops it, and the
/// task's `JoinHandle` so shutdown can wait for it to drain.
pub fn spawn(kind: Kind, input_capacity: usize) -> (TokenStatusHandle, CancellationToken, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Op>(input_capacity);
    let stop = CancellationToken::new();
    let stop_child = stop.clone();

    let join = tokio::spawn(async move {
        let mut counts: HashMap<(String, TransportStatus), u64> = HashMap::new();
        loop {
            tokio::select! {
                _ = stop_child.cancelled() => {
                    // Drain whatever increments are already queued before exiting,
                    // so a shutdown never silently loses counts that raced it.
                    while let Ok(op) = rx.try_recv() {
                        apply(kind, &mut counts, op);
                    }
                    break;
                }
                maybe_op = rx.recv() => {
                    match maybe_op {
                        Some(op) => apply(kind, &mut counts, op),
                        None => break,
                    }
                }
            }
        }
    });

    (TokenStatusHandle { kind, tx }, stop, join)
}

fn apply(kind: Kind, counts: &mut HashMap<(String, TransportStatus), u64>, op: Op) {
    match op {
        Op::Increment { token, status, delta } => {
            *counts.entry((token, status)).or_insert(0) += delta;
        }
        Op::Snapshot(reply) => {
            let points = counts
                .iter()
                .map(|((token, status), count)| StatusPoint {
                    kind,
                    token: token.clone(),
                    status: *status,
                    count: *count,
                })
                .collect();
            let _ = reply.send(points);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_reads_back() {
        let (handle, stop, join) = spawn(Kind::Events, 16);
        handle.record("tenant-a", 200, 3);
        handle.record("tenant-a", 500, 1);
        handle.record("tenant-b", 200, 1);

        let mut snapshot = handle.snapshot().await;
        snapshot.sort_by(|a, b| (a.token.clone(), a.status).cmp(&(b.token.clone(), b.status)));

        assert_eq!(snapshot.len(), 3);
        assert!(snapshot
            .iter()
            .any(|p| p.token == "tenant-a" && p.status == 200 && p.count == 3));
        assert!(snapshot
            .iter()
            .any(|p| p.token == "tenant-a" && p.status == 500 && p.count == 1));
        assert!(snapshot
            .iter()
            .any(|p| p.token == "tenant-b" && p.status == 200 && p.count == 1));

        stop.cancel();
        let _ = join.await;
    }

    #[tokio::test]
    async fn increments_accumulate() {
        let (handle, stop, join) = spawn(Kind::Datapoints, 16);
        handle.record("tenant-a", 200, 1);
        handle.record("tenant-a", 200, 1);
        handle.record("tenant-a", 200, 1);

        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].count, 3);

        stop.cancel();
        let _ = join.await;
    }
}
