//! Construction entry point and the generated API object.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::endpoint::{self, Endpoint};
use crate::error::{ApiError, SchemaError};
use crate::request::Dispatcher;
use crate::schema::Schema;
use crate::transport::Transport;

/// Options for [`create`].
///
/// Deserializes from `{"baseUrl": "...", "headers": {"X-Name": "value"}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    /// With or without a trailing slash.
    pub base_url: String,
    /// Sent on every call, merged over `Content-Type: application/json`.
    #[serde(default, deserialize_with = "header_map::deserialize")]
    pub headers: Vec<(String, String)>,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.base_url.trim().is_empty() {
            return Err(SchemaError::new("baseUrl", "base URL must not be empty"));
        }
        Ok(())
    }
}

/// Headers as a JSON object, kept in document order.
mod header_map {
    use serde::{Deserialize, Deserializer};
    use serde_json::{Map, Value};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<(String, String)>, D::Error> {
        let map = Map::<String, Value>::deserialize(d)?;
        map.into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k, s)),
                other => Err(serde::de::Error::custom(format!(
                    "header `{k}` must be a string, got {other}"
                ))),
            })
            .collect()
    }
}

/// The generated API: one [`Endpoint`] per declared entity.
#[derive(Debug, Clone)]
pub struct Api {
    endpoints: Vec<Endpoint>,
}

impl Api {
    pub fn entity(&self, name: &str) -> Result<&Endpoint, ApiError> {
        self.get(name).ok_or_else(|| ApiError::UnknownEntity(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name() == name)
    }

    /// Endpoints in schema declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Validate `options` and `schema`, then build the API over `transport`.
pub fn create(options: ClientOptions, schema: &Schema, transport: Arc<dyn Transport>) -> Result<Api, ApiError> {
    options.validate()?;
    let dispatcher = Dispatcher::new(transport, options.headers);
    let endpoints = endpoint::build(&options.base_url, schema, dispatcher)?;
    debug!(base_url = %options.base_url, entities = endpoints.len(), "built api");
    Ok(Api { endpoints })
}
