/**
 * Tunables for a single pipeline (spec §6).
 *
 * Every field here maps directly to a spec knob; defaults match the
 * reference sink's defaults where one exists (`buffer` = the teacher's
 * `QUEUE_CAPACITY`), and are chosen conservatively elsewhere.
 */
use std::time::Duration;

use crate::error::SinkError;

#[derive(Debug, Clone)]
pub struct SinkParams {
    /// Number of shard channels (and thus the ceiling on useful parallel
    /// routing) for this pipeline.
    pub num_channels: usize,
    /// Number of worker tasks draining each shard channel.
    pub num_draining_threads: usize,
    /// Bounded capacity of each shard channel.
    pub buffer: usize,
    /// Records accumulated before a worker flushes a batch early.
    pub batch_size: usize,
    /// Maximum number of retry attempts after the first (spec §4.3).
    pub max_retry: u32,
    /// How long `close()` waits for workers to drain before giving up.
    pub shutdown_timeout: Duration,
}

impl Default for SinkParams {
    fn default() -> Self {
        Self {
            num_channels: 4,
            num_draining_threads: 2,
            buffer: 100,
            batch_size: 100,
            max_retry: 3,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl SinkParams {
    /// Rejects configurations that would leave a pipeline unable to make
    /// progress. Checked once at construction time, not on every submit.
    pub fn validate(&self) -> Result<(), SinkError> {
        if self.num_channels == 0 {
            return Err(SinkError::InvalidConfig("num_channels must be >= 1".into()));
        }
        if self.num_draining_threads == 0 {
            return Err(SinkError::InvalidConfig(
                "num_draining_threads must be >= 1".into(),
            ));
        }
        if self.buffer == 0 {
            return Err(SinkError::InvalidConfig("buffer must be >= 1".into()));
        }
        if self.batch_size == 0 {
            return Err(SinkError::InvalidConfig("batch_size must be >= 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(SinkParams::default().validate().is_ok());
    }

    #[test]
    fn zero_channels_rejected() {
        let params = SinkParams {
            num_channels: 0,
            ..SinkParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SinkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_buffer_rejected() {
        let params = SinkParams {
            buffer: 0,
            ..SinkParams::default()
        };
        assert!(params.validate().is_err());
    }
}
