/*!
 * Sink Core — the internal engine behind the multi-tenant telemetry sink.
 *
 * This crate provides the routing, batching, transport, and shutdown
 * machinery. End users should depend on the `sink` facade crate instead,
 * which wires up a builder and the three per-kind pipelines into one
 * `Sink` handle.
 *
 * # Module structure
 *
 * - `record` — what we send: the opaque payload, kinds, the shard envelope
 * - `hash` — stateless token-to-shard selection
 * - `router` — hands a message to the shard its token selects
 * - `worker` — drains a shard, batches, flushes, retries
 * - `transport/` — how we deliver: the `Transport` trait, HTTP client, status classification
 * - `pipeline` — one kind's router + shard channels + worker tasks
 * - `shutdown` — aggregated graceful shutdown across all three pipelines
 * - `metrics/` — self-observability: buffered gauges, retry counter, per-token status
 * - `context` — explicit, context-carrying submission
 * - `config` — pipeline tunables
 * - `error` — the closed set of error kinds a sink can raise
 */

pub mod config;
pub mod context;
pub mod error;
pub mod hash;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod router;
pub mod shutdown;
pub mod transport;
pub mod worker;

pub use config::SinkParams;
pub use context::Context;
pub use error::{ShutdownReport, SinkError};
pub use record::{Kind, Message, Record};
pub use transport::{ErrorHandler, FlushError, Transport, TransportError, TransportFactory};
