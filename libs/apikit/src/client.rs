//! Traced HTTP client for the remote-service adapters.
//!
//! Wraps `reqwest::Client` so every outgoing request runs inside an
//! `outgoing_http` span, carries a `traceparent` header, and records the
//! response status on the span.

use std::time::Duration;

use reqwest::{Method, Request, RequestBuilder, Response};
use tracing::{field, Instrument, Level};

use crate::trace;

#[derive(Clone, Debug)]
pub struct TracedClient {
    inner: reqwest::Client,
}

impl TracedClient {
    /// Create a new TracedClient wrapping the provided reqwest::Client
    pub fn new(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Client whose requests fail with a timeout error after `timeout`.
    /// `None` leaves requests unbounded.
    pub fn with_timeout(timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self::new(builder.build()?))
    }

    /// Execute a built request inside an `outgoing_http` span.
    pub async fn execute(&self, mut req: Request) -> reqwest::Result<Response> {
        trace::inject_trace_context(req.headers_mut());

        let span = tracing::span!(
            Level::INFO,
            "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
            http.status_code = field::Empty,
            trace_id = field::Empty,
            error = field::Empty,
            otel.kind = "client",
        );
        if let Some(trace_id) = req
            .headers()
            .get(trace::TRACEPARENT)
            .and_then(|v| v.to_str().ok())
            .and_then(trace::parse_trace_id)
        {
            span.record("trace_id", trace_id);
        }

        async {
            let result = self.inner.execute(req).await;
            let current = tracing::Span::current();
            match &result {
                Ok(resp) => {
                    let status = resp.status();
                    current.record("http.status_code", status.as_u16());
                    if status.is_client_error() || status.is_server_error() {
                        current.record("error", true);
                    }
                }
                Err(e) => {
                    current.record("error", true);
                    tracing::debug!(error = %e, timeout = e.is_timeout(), "request failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Build and execute a request prepared with [`TracedClient::request`].
    pub async fn send(&self, builder: RequestBuilder) -> reqwest::Result<Response> {
        self.execute(builder.build()?).await
    }

    /// Request builder, optionally signed with `Authorization: Bearer <token>`.
    pub fn request(&self, method: Method, url: &str, bearer: Option<&str>) -> RequestBuilder {
        let builder = self.inner.request(method, url);
        match bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

}
