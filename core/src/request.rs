//! Request construction and response parsing.
//!
//! # Design
//! Mirrors the build/parse split of a host-does-IO client: [`build_request`]
//! turns a verb, URL, payload and headers into an [`HttpRequest`], and
//! [`parse_response`] turns whatever the transport returned into JSON. The
//! status code is never inspected.
//!
//! GET payloads become a query string of raw `key=value` pairs in insertion
//! order. Keys and values are NOT percent-encoded, so a value containing
//! `&`, `=`, `#` or a space produces a malformed URL. Servers written against
//! this client rely on that exact format.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// Serialize a caller payload into a JSON value.
pub fn to_payload<T: Serialize + ?Sized>(data: &T) -> Result<Value, ApiError> {
    serde_json::to_value(data).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// The payload used when a call supplies none.
pub fn empty_payload() -> Value {
    Value::Object(Map::new())
}

/// Build the request for one generated call.
///
/// `headers` are merged over `Content-Type: application/json`; a caller
/// header with the same name (compared case-insensitively) replaces the
/// default. Only POST, PUT and PATCH carry a body.
pub fn build_request(
    method: HttpMethod,
    url: &str,
    data: &Value,
    headers: &[(String, String)],
) -> Result<HttpRequest, ApiError> {
    let url = if method == HttpMethod::Get {
        match query_string(data)? {
            Some(query) => format!("{url}?{query}"),
            None => url.to_string(),
        }
    } else {
        url.to_string()
    };

    let body = if method.has_body() {
        Some(serde_json::to_string(data).map_err(|e| ApiError::Serialization(e.to_string()))?)
    } else {
        None
    };

    Ok(HttpRequest {
        method,
        url,
        headers: merge_headers(headers),
        body,
    })
}

/// Parse a transport response as JSON, whatever its status.
pub fn parse_response(response: &HttpResponse) -> Result<Value, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Issues built requests through the injected transport.
///
/// Cheap to clone; every handle produced by the endpoint factory holds one.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    headers: Arc<[(String, String)]>,
}

impl Dispatcher {
    /// `headers` are sent with every call, after the `Content-Type` default.
    pub fn new(transport: Arc<dyn Transport>, headers: Vec<(String, String)>) -> Self {
        Self {
            transport,
            headers: headers.into(),
        }
    }

    /// One transport round-trip, then the body parsed as JSON.
    ///
    /// `headers` apply to this call only and win over the dispatcher's own.
    pub async fn json_call(
        &self,
        method: HttpMethod,
        url: &str,
        data: &Value,
        headers: &[(String, String)],
    ) -> Result<Value, ApiError> {
        let merged: Vec<(String, String)> = self.headers.iter().chain(headers).cloned().collect();
        let request = build_request(method, url, data, &merged)?;
        debug!(%method, url = %request.url, body = request.body.is_some(), "dispatching request");

        let response = self.transport.send(request).await?;
        trace!(status = response.status, len = response.body.len(), "response received");
        parse_response(&response)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

fn merge_headers(extra: &[(String, String)]) -> Vec<(String, String)> {
    let mut headers = vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())];
    for (name, value) in extra {
        match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(existing) => *existing = (name.clone(), value.clone()),
            None => headers.push((name.clone(), value.clone())),
        }
    }
    headers
}

/// `None` when there is nothing to append.
fn query_string(data: &Value) -> Result<Option<String>, ApiError> {
    let params = match data {
        Value::Null => return Ok(None),
        Value::Object(params) => params,
        other => return Err(ApiError::InvalidPayload(other.to_string())),
    };
    if params.is_empty() {
        return Ok(None);
    }
    let pairs: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{k}={}", query_value(v)))
        .collect();
    Ok(Some(pairs.join("&")))
}

/// Scalars are written as-is. Arrays join their items with `,`; objects are
/// written as compact JSON.
fn query_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(query_value).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
