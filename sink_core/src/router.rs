/**
 * Token-to-shard routing (spec §4.1).
 *
 * A `Router` owns one `async_channel` sender per shard. Submitting a
 * message hashes the token, picks a shard, and performs a non-blocking
 * `try_send` — routing never blocks the caller; a full shard channel is
 * reported back as `SinkError::QueueFull` so backpressure is the caller's
 * decision, not the router's.
 */
use async_channel::{Sender, TrySendError};

use crate::error::SinkError;
use crate::hash::shard_for;
use crate::record::Message;

pub struct Router<R> {
    channels: Vec<Sender<Message<R>>>,
}

impl<R> Router<R> {
    pub fn new(channels: Vec<Sender<Message<R>>>) -> Self {
        assert!(!channels.is_empty(), "router built with zero channels");
        Self { channels }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Routes `message` to the shard selected by `token`, failing fast if
    /// that shard is at capacity or the sink has begun shutting down.
    pub fn route(&self, token: &str, message: Message<R>) -> Result<(), SinkError> {
        let shard = shard_for(token, self.channels.len());
        match self.channels[shard].try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SinkError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(SinkError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn message(token: &str) -> Message<Record> {
        Message::new(token.to_string(), vec![Record::new(serde_json::json!({"n": 1}))])
    }

    #[test]
    fn routes_same_token_to_same_shard() {
        let (tx_a, rx_a) = async_channel::bounded(8);
        let (tx_b, rx_b) = async_channel::bounded(8);
        let router = Router::new(vec![tx_a, tx_b]);

        router.route("tenant-a", message("tenant-a")).unwrap();
        router.route("tenant-a", message("tenant-a")).unwrap();

        let total_a = rx_a.len();
        let total_b = rx_b.len();
        assert_eq!(total_a + total_b, 2);
        assert!(total_a == 2 || total_b == 2);
    }

    #[test]
    fn full_shard_reports_queue_full() {
        let (tx, _rx) = async_channel::bounded(1);
        let router = Router::new(vec![tx]);
        router.route("tenant-a", message("tenant-a")).unwrap();
        let err = router.route("tenant-a", message("tenant-a")).unwrap_err();
        assert!(matches!(err, SinkError::QueueFull));
    }

    #[test]
    fn closed_shard_reports_closed() {
        let (tx, rx) = async_channel::bounded(1);
        drop(rx);
        let router = Router::new(vec![tx]);
        let err = router.route("tenant-a", message("tenant-a")).unwrap_err();
        assert!(matches!(err, SinkError::Closed));
    }
}
