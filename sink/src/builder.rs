/**
 * Builder for `Sink` (spec §6).
 *
 * Mirrors the queuing-sink builder shape common to Rust metrics clients:
 * a handful of `.with_*` setters culminating in one fallible `.build()`
 * that does the real work — spawning shard channels, constructing one
 * transport per worker, and starting the worker tasks.
 */
use std::sync::Arc;

use sink_core::context::TOKEN_CTX_KEY;
use sink_core::metrics::{token_status, SinkStats};
use sink_core::pipeline::Pipeline;
use sink_core::transport::http::{http_factory, HttpTransportConfig};
use sink_core::{ErrorHandler, FlushError, Kind, Record, SinkError, SinkParams, TransportFactory};
use tracing::warn;

use crate::Sink;

#[derive(Default)]
pub struct SinkBuilder {
    endpoint: Option<String>,
    user_agent: String,
    token_header: String,
    params: SinkParams,
    error_handler: Option<ErrorHandler>,
    datapoints_transport: Option<TransportFactory<Record>>,
    events_transport: Option<TransportFactory<Record>>,
    spans_transport: Option<TransportFactory<Record>>,
}

impl SinkBuilder {
    pub fn new() -> Self {
        Self {
            user_agent: "sink/0.1".to_string(),
            // Defaults to the same string as `Context::TOKEN_CTX_KEY` (spec
            // §6) so a context-carried token and an HTTP header name never
            // disagree unless a caller deliberately overrides one of them.
            token_header: TOKEN_CTX_KEY.to_string(),
            params: SinkParams::default(),
            ..Default::default()
        }
    }

    /// Base URL the default HTTP transport sends to. Each kind's pipeline
    /// posts to a distinct path under this base (`/v1/datapoints`,
    /// `/v1/events`, `/v1/spans`). Ignored for any kind given a custom
    /// transport via `.with_*_transport`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_token_header(mut self, header: impl Into<String>) -> Self {
        self.token_header = header.into();
        self
    }

    /// Shard counts, batch size, retry budget, and shutdown timeout,
    /// applied to every kind's pipeline.
    pub fn with_params(mut self, params: SinkParams) -> Self {
        self.params = params;
        self
    }

    /// Called once per exhausted flush. Defaults to logging via `tracing`
    /// and discarding — a sink must never let a stuck ingestion endpoint
    /// back up the caller.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(FlushError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_datapoints_transport(mut self, factory: TransportFactory<Record>) -> Self {
        self.datapoints_transport = Some(factory);
        self
    }

    pub fn with_events_transport(mut self, factory: TransportFactory<Record>) -> Self {
        self.events_transport = Some(factory);
        self
    }

    pub fn with_spans_transport(mut self, factory: TransportFactory<Record>) -> Self {
        self.spans_transport = Some(factory);
        self
    }

    /// Builds the sink: validates `params` and the transport configuration,
    /// spawns the self-metrics serializer tasks, then starts all three
    /// pipelines. Nothing with a runtime dependency (the serializer tasks,
    /// the pipelines' worker tasks) is spawned until every fallible step
    /// ahead of it has succeeded.
    pub fn build(self) -> Result<Sink, SinkError> {
        self.params.validate()?;

        let datapoints_transport = match self.datapoints_transport {
            Some(factory) => factory,
            None => http_factory(self.http_config("datapoints")?),
        };
        let events_transport = match self.events_transport {
            Some(factory) => factory,
            None => http_factory(self.http_config("events")?),
        };
        let spans_transport = match self.spans_transport {
            Some(factory) => factory,
            None => http_factory(self.http_config("spans")?),
        };

        let (datapoints_status, datapoints_stop, _) = token_status::spawn(Kind::Datapoints, 1024);
        let (events_status, events_stop, _) = token_status::spawn(Kind::Events, 1024);
        let (spans_status, spans_stop, _) = token_status::spawn(Kind::Spans, 1024);
        let stats = Arc::new(SinkStats::new([
            datapoints_status,
            events_status,
            spans_status,
        ]));

        let error_handler = self.error_handler.unwrap_or_else(|| {
            Arc::new(|err: FlushError| {
                warn!(token = %err.token, status = err.status, "telemetry flush failed permanently");
            })
        });

        let datapoints = Pipeline::start(
            Kind::Datapoints,
            &self.params,
            datapoints_transport,
            error_handler.clone(),
            stats.clone(),
        )?;
        let events = Pipeline::start(
            Kind::Events,
            &self.params,
            events_transport,
            error_handler.clone(),
            stats.clone(),
        )?;
        let spans = Pipeline::start(
            Kind::Spans,
            &self.params,
            spans_transport,
            error_handler,
            stats.clone(),
        )?;

        Ok(Sink {
            datapoints,
            events,
            spans,
            stats,
            shutdown_timeout: self.params.shutdown_timeout,
            metrics_stops: vec![datapoints_stop, events_stop, spans_stop],
        })
    }

    fn http_config(&self, path: &str) -> Result<HttpTransportConfig, SinkError> {
        let base = self
            .endpoint
            .as_ref()
            .ok_or_else(|| SinkError::InvalidConfig("endpoint is required".into()))?;
        Ok(HttpTransportConfig {
            endpoint: format!("{}/v1/{}", base.trim_end_matches('/'), path),
            user_agent: self.user_agent.clone(),
            token_header: self.token_header.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_endpoint_fails() {
        let err = SinkBuilder::new().build().unwrap_err();
        assert!(matches!(err, SinkError::InvalidConfig(_)));
    }

    #[test]
    fn http_config_joins_endpoint_and_path() {
        let builder = SinkBuilder::new().with_endpoint("https://ingest.example.com/");
        let config = builder.http_config("events").unwrap();
        assert_eq!(config.endpoint, "https://ingest.example.com/v1/events");
    }
}
