/**
 * A single shard-draining worker (spec §4.2).
 *
 * Replaces the reference sink's one dedicated OS thread per client with a
 * tokio task; the receive loop, batching, and flush-then-report shape is
 * otherwise the same idea applied to a shard that several workers can pull
 * from concurrently.
 *
 * A shard channel can carry messages for more than one token (two tokens
 * can hash to the same shard), so a worker groups consecutive same-token
 * messages into one batch and flushes as soon as the token changes, the
 * batch hits `batch_size`, or the channel has nothing more queued right
 * now.
 */
use std::sync::Arc;

use async_channel::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use crate::metrics::SinkStats;
use crate::record::{Kind, Message, Record};
use crate::transport::classify::STATUS_OK;
use crate::transport::{classify, is_retryable, ErrorHandler, FlushError, Transport};

pub struct Worker {
    pub id: usize,
    pub kind: Kind,
    pub receiver: Receiver<Message<Record>>,
    pub transport: Arc<dyn Transport<Record>>,
    pub batch_size: usize,
    pub max_retry: u32,
    pub error_handler: ErrorHandler,
    pub stats: Arc<SinkStats>,
    pub shutdown: CancellationToken,
}

impl Worker {
    #[instrument(skip(self), fields(worker_id = self.id, kind = %self.kind))]
    pub async fn run(self) {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    self.drain_remaining().await;
                    break;
                }
                received = self.receiver.recv() => {
                    match received {
                        Ok(first) => self.drain_from(first).await,
                        Err(_) => break,
                    }
                }
            }
        }
    }

    /// Flushes every message still waiting in the shard channel without
    /// blocking on new arrivals. Called once shutdown has been signalled,
    /// so the worker owes its remaining buffered records one last attempt
    /// before it exits.
    async fn drain_remaining(&self) {
        while let Ok(message) = self.receiver.try_recv() {
            self.drain_from(message).await;
        }
    }

    /// Consumes `first` and everything immediately available behind it on
    /// the shard channel, flushing batches as token boundaries or
    /// `batch_size` demand.
    async fn drain_from(&self, first: Message<Record>) {
        let mut token = first.token;
        let mut batch = Vec::new();
        self.append(&token, &mut batch, first.records).await;

        loop {
            match self.receiver.try_recv() {
                Ok(next) if next.token == token => {
                    self.append(&token, &mut batch, next.records).await;
                }
                Ok(next) => {
                    if !batch.is_empty() {
                        self.flush(&token, std::mem::take(&mut batch)).await;
                    }
                    token = next.token;
                    self.append(&token, &mut batch, next.records).await;
                }
                Err(async_channel::TryRecvError::Empty) => break,
                Err(async_channel::TryRecvError::Closed) => break,
            }
        }

        if !batch.is_empty() {
            self.flush(&token, batch).await;
        }
    }

    /// Appends `records` onto `batch` one at a time, flushing under `token`
    /// every time the batch reaches `batch_size`. A single message larger
    /// than `batch_size` is thereby chunked into back-to-back batches
    /// (spec §4.2 steps 1 & 4) instead of being flushed as one oversized
    /// transport call.
    async fn append(&self, token: &str, batch: &mut Vec<Record>, records: Vec<Record>) {
        for record in records {
            batch.push(record);
            if batch.len() >= self.batch_size {
                self.flush(token, std::mem::take(batch)).await;
            }
        }
    }

    /// Sends one batch, retrying on a retryable status up to `max_retry`
    /// additional attempts. `records` is passed by reference across every
    /// attempt, so a retry resubmits the byte-identical batch (spec §4.3).
    #[instrument(skip(self, records), fields(token, len = records.len()))]
    async fn flush(&self, token: &str, records: Vec<Record>) {
        if records.is_empty() {
            return;
        }

        let mut attempt: u32 = 0;
        let status = loop {
            let result = self.transport.send(token, &records).await;
            let status = classify(&result);

            if status == STATUS_OK || !is_retryable(status) {
                break status;
            }
            if attempt >= self.max_retry {
                break status;
            }
            attempt += 1;
            self.stats.record_retry(self.kind);
        };

        self.stats.record_status(self.kind, token, status);
        self.stats.record_flushed(self.kind, records.len());

        if status != STATUS_OK {
            warn!(token, status, "flush did not succeed after retries");
            (self.error_handler)(FlushError {
                token: token.to_string(),
                status,
            });
        }
    }
}
