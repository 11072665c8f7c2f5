//! The injected HTTP capability.
//!
//! # Design
//! The core never opens a socket itself. Every generated call hands one
//! [`HttpRequest`] to a [`Transport`] and gets one [`HttpResponse`] back.
//! Status codes are data, not errors: only a failure to produce a response
//! at all is reported as [`ApiError::Transport`].

use async_trait::async_trait;
use tracing::trace;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a single HTTP round-trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking `ureq` agent driven from the tokio blocking pool.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute(&agent, request))
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&str>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

fn execute(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    let url = request.url.as_str();
    let headers = &request.headers;
    let body = request.body.as_deref();

    let result = match request.method {
        HttpMethod::Get => with_headers(agent.get(url), headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(url), headers).call(),
        HttpMethod::Post => send_body(with_headers(agent.post(url), headers), body),
        HttpMethod::Put => send_body(with_headers(agent.put(url), headers), body),
        HttpMethod::Patch => send_body(with_headers(agent.patch(url), headers), body),
    };
    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    trace!(status, len = body.len(), "ureq response");

    Ok(HttpResponse { status, headers, body })
}
