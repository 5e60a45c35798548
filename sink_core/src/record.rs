/**
 * What we send: the record kinds, the opaque payload, and the single-token
 * message envelope a router hands to a worker.
 *
 * Concrete record schemas are out of scope for the core (spec §1) — a
 * `Record` is an opaque, serializable value. What the core *does* own is
 * the envelope: which token authenticates a batch of records, and which of
 * the three kinds they belong to.
 */
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/**
 * One of the three record kinds a sink moves. Each `Pipeline` is built for
 * exactly one `Kind`; it picks the kind's own shard count, endpoint, and
 * self-metrics labels. There is no shared channel array between kinds — see
 * `DESIGN.md`'s note on the span/event hashing defect this rules out.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Datapoints,
    Events,
    Spans,
}

impl Kind {
    /// Stable index for per-kind arrays, e.g. in `SinkStats`.
    pub fn index(self) -> usize {
        match self {
            Kind::Datapoints => 0,
            Kind::Events => 1,
            Kind::Spans => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Datapoints => "datapoints",
            Kind::Events => "events",
            Kind::Spans => "spans",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record — the opaque payload
// ---------------------------------------------------------------------------

/**
 * An opaque telemetry record. The core never inspects its contents — it
 * only counts records, batches them, and hands them to a `Transport` for
 * serialization. Callers build these from whatever concrete datapoint,
 * event, or span type their application uses.
 */
#[derive(Debug, Clone, Serialize)]
pub struct Record(pub serde_json::Value);

impl Record {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self(value.into())
    }
}

impl From<serde_json::Value> for Record {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Message — the envelope carried on a shard channel
// ---------------------------------------------------------------------------

/**
 * A message handed from a router to a worker: an ordered sequence of
 * records, tagged with the token that authenticates them.
 *
 * Invariant (spec §3): a `Message` carries records of exactly one kind and
 * exactly one token. The kind is enforced by construction — one channel
 * array per `Pipeline<R>`, one `Pipeline` per kind; the token is never
 * split or merged across messages before a worker flushes a batch.
 */
#[derive(Debug)]
pub struct Message<R> {
    pub token: String,
    pub records: Vec<R>,
}

impl<R> Message<R> {
    pub fn new(token: String, records: Vec<R>) -> Self {
        Self { token, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
