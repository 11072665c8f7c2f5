//! In-memory REST server speaking the trailing-slash URL layout.
//!
//! - `/{entity}/` and `/{entity}/{id}/{child}/` are collections.
//! - `/{entity}/{id}/` and deeper `/{...}/{child}/{cid}/` are members.
//! - A path without a trailing slash is a custom action: the last segment is
//!   the action name and the request is echoed back as JSON.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

#[derive(Debug, Default)]
pub struct Store {
    collections: HashMap<String, BTreeMap<u64, Value>>,
    next_id: u64,
}

pub type Db = Arc<RwLock<Store>>;

/// What a request path addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Collection(String),
    Member { collection: String, id: String },
    Action { scope: String, name: String },
}

/// Classify a request path. `None` for the root or an empty segment.
pub fn route(path: &str) -> Option<Target> {
    let path = path.strip_prefix('/')?;
    match path.strip_suffix('/') {
        Some(resource) => {
            let segments: Vec<&str> = resource.split('/').collect();
            if segments.iter().any(|s| s.is_empty()) {
                return None;
            }
            if segments.len() % 2 == 1 {
                Some(Target::Collection(resource.to_string()))
            } else {
                let (collection, id) = resource.rsplit_once('/')?;
                Some(Target::Member {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })
            }
        }
        None => {
            let (scope, name) = path.rsplit_once('/')?;
            if name.is_empty() {
                return None;
            }
            Some(Target::Action {
                scope: format!("{scope}/"),
                name: name.to_string(),
            })
        }
    }
}

pub fn app() -> Router {
    let db: Db = Arc::default();
    Router::new().fallback(handle).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn handle(State(db): State<Db>, method: Method, uri: Uri, body: Bytes) -> Response {
    debug!(%method, %uri, "request");
    let Some(target) = route(uri.path()) else {
        return error(StatusCode::NOT_FOUND, "not found");
    };

    let body: Option<Value> = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => Some(v),
            Err(_) => return error(StatusCode::BAD_REQUEST, "body is not JSON"),
        }
    };

    match target {
        Target::Collection(path) => match method {
            Method::GET => list(&db, &path, uri.query()).await,
            Method::POST => create(&db, &path, body).await,
            _ => error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"),
        },
        Target::Member { collection, id } => {
            let Ok(id) = id.parse::<u64>() else {
                return error(StatusCode::BAD_REQUEST, "id must be an integer");
            };
            match method {
                Method::GET => get(&db, &collection, id).await,
                Method::PATCH => update(&db, &collection, id, body, false).await,
                Method::PUT => update(&db, &collection, id, body, true).await,
                Method::DELETE => delete(&db, &collection, id).await,
                _ => error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"),
            }
        }
        Target::Action { scope, name } => Json(json!({
            "action": name,
            "method": method.as_str(),
            "scope": scope,
            "query": uri.query(),
            "body": body,
        }))
        .into_response(),
    }
}

/// `key=value` pairs split verbatim; nothing is percent-decoded.
fn filters(query: Option<&str>) -> Vec<(&str, &str)> {
    query
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect()
}

fn field_matches(record: &Value, key: &str, expected: &str) -> bool {
    match record.get(key) {
        Some(Value::String(s)) => s == expected,
        Some(other) => other.to_string() == expected,
        None => false,
    }
}

async fn list(db: &Db, path: &str, query: Option<&str>) -> Response {
    let filters = filters(query);
    let store = db.read().await;
    let records: Vec<Value> = store
        .collections
        .get(path)
        .map(|c| {
            c.values()
                .filter(|r| filters.iter().all(|(k, v)| field_matches(r, k, v)))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Json(records).into_response()
}

async fn create(db: &Db, path: &str, body: Option<Value>) -> Response {
    let Some(Value::Object(mut fields)) = body else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "body must be a JSON object");
    };
    let mut store = db.write().await;
    store.next_id += 1;
    let id = store.next_id;
    fields.insert("id".to_string(), json!(id));
    let record = Value::Object(fields);
    store
        .collections
        .entry(path.to_string())
        .or_default()
        .insert(id, record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn get(db: &Db, collection: &str, id: u64) -> Response {
    let store = db.read().await;
    match store.collections.get(collection).and_then(|c| c.get(&id)) {
        Some(record) => Json(record.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "not found"),
    }
}

async fn update(db: &Db, collection: &str, id: u64, body: Option<Value>, replace: bool) -> Response {
    let Some(Value::Object(fields)) = body else {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "body must be a JSON object");
    };
    let mut store = db.write().await;
    let Some(record) = store.collections.get_mut(collection).and_then(|c| c.get_mut(&id)) else {
        return error(StatusCode::NOT_FOUND, "not found");
    };
    let mut merged = if replace {
        Map::new()
    } else {
        record.as_object().cloned().unwrap_or_default()
    };
    merged.extend(fields);
    merged.insert("id".to_string(), json!(id));
    *record = Value::Object(merged);
    Json(record.clone()).into_response()
}

async fn delete(db: &Db, collection: &str, id: u64) -> Response {
    let mut store = db.write().await;
    match store.collections.get_mut(collection).and_then(|c| c.remove(&id)) {
        Some(_) => Json(json!({})).into_response(),
        None => error(StatusCode::NOT_FOUND, "not found"),
    }
}
