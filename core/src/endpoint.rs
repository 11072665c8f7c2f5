//! Endpoint factory: turns a validated [`Schema`] into callable accessors.
//!
//! # Design
//! Each entity becomes an [`Endpoint`] bound to a base URL. Asking it for the
//! collection yields a [`CollectionHandle`]; asking it for a member by key
//! yields a [`MemberHandle`]. Built-in verbs are typed methods, custom actions
//! are dispatched by name through `call`/`call_with`, so a custom action can
//! never shadow `fetch`, `create`, `update` or `del`.
//!
//! Declarations are frozen into an `Arc` tree at build time. Endpoints and
//! handles only clone `Arc`s and URL strings, and are `Send + Sync`.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, SchemaError};
use crate::http::HttpMethod;
use crate::request::{empty_payload, to_payload, Dispatcher};
use crate::schema::{Action, Actions, Declaration, Schema};
use crate::url::{action_url, collection_url, member_url, PrimaryKey};

/// Frozen declaration of one entity.
#[derive(Debug)]
struct EntityNode {
    name: String,
    on_member: Actions,
    on_collection: Actions,
    nested: Vec<Arc<EntityNode>>,
}

impl EntityNode {
    fn freeze(name: &str, declaration: &Declaration) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            on_member: declaration.on_member.clone(),
            on_collection: declaration.on_collection.clone(),
            nested: declaration
                .nested
                .iter()
                .map(|(n, d)| Self::freeze(n, d))
                .collect(),
        })
    }
}

/// Validate `schema` and produce one endpoint per entity, in declaration order.
pub fn build(base_url: &str, schema: &Schema, dispatcher: Dispatcher) -> Result<Vec<Endpoint>, SchemaError> {
    schema.validate()?;
    Ok(schema
        .iter()
        .map(|(name, declaration)| Endpoint {
            base_url: base_url.to_string(),
            node: EntityNode::freeze(name, declaration),
            dispatcher: dispatcher.clone(),
        })
        .collect())
}

/// Accessor for one entity under one base URL.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base_url: String,
    node: Arc<EntityNode>,
    dispatcher: Dispatcher,
}

impl Endpoint {
    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn collection_url(&self) -> String {
        collection_url(&self.base_url, &self.node.name)
    }

    pub fn member_url(&self, pk: &PrimaryKey) -> String {
        member_url(&self.base_url, &self.node.name, pk)
    }

    /// Handle on the collection (no key).
    pub fn collection(&self) -> CollectionHandle {
        CollectionHandle {
            url: self.collection_url(),
            node: Arc::clone(&self.node),
            dispatcher: self.dispatcher.clone(),
        }
    }

    /// Handle on one member. Any key, including `0`, selects the member.
    pub fn member(&self, pk: impl Into<PrimaryKey>) -> MemberHandle {
        let pk = pk.into();
        MemberHandle {
            url: self.member_url(&pk),
            pk,
            node: Arc::clone(&self.node),
            dispatcher: self.dispatcher.clone(),
        }
    }

    /// Accessor invocation with an optional key.
    pub fn handle(&self, pk: Option<PrimaryKey>) -> Handle {
        match pk {
            Some(pk) => Handle::Member(self.member(pk)),
            None => Handle::Collection(self.collection()),
        }
    }
}

/// Operations on an entity's collection URL.
#[derive(Debug, Clone)]
pub struct CollectionHandle {
    url: String,
    node: Arc<EntityNode>,
    dispatcher: Dispatcher,
}

impl CollectionHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the collection without a query string.
    pub async fn fetch(&self) -> Result<Value, ApiError> {
        self.send(HttpMethod::Get, &self.url, &empty_payload()).await
    }

    /// GET the collection with `params` as an unencoded query string.
    pub async fn fetch_with<P: Serialize + ?Sized>(&self, params: &P) -> Result<Value, ApiError> {
        let params = to_payload(params)?;
        self.send(HttpMethod::Get, &self.url, &params).await
    }

    /// POST `data` as JSON to the collection.
    pub async fn create<T: Serialize + ?Sized>(&self, data: &T) -> Result<Value, ApiError> {
        let data = to_payload(data)?;
        self.send(HttpMethod::Post, &self.url, &data).await
    }

    /// Names of the declared collection actions.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.node.on_collection.iter().map(|a| a.name.as_str())
    }

    pub async fn call(&self, name: &str) -> Result<Value, ApiError> {
        let action = find_action(&self.node.on_collection, name)?;
        self.send(action.method, &action_url(&self.url, &action.name), &empty_payload())
            .await
    }

    pub async fn call_with<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<Value, ApiError> {
        let action = find_action(&self.node.on_collection, name)?;
        let data = to_payload(data)?;
        self.send(action.method, &action_url(&self.url, &action.name), &data)
            .await
    }

    async fn send(&self, method: HttpMethod, url: &str, data: &Value) -> Result<Value, ApiError> {
        self.dispatcher.json_call(method, url, data, &[]).await
    }
}

/// Operations on one member URL, plus nested entities scoped beneath it.
#[derive(Debug, Clone)]
pub struct MemberHandle {
    url: String,
    pk: PrimaryKey,
    node: Arc<EntityNode>,
    dispatcher: Dispatcher,
}

impl MemberHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pk(&self) -> &PrimaryKey {
        &self.pk
    }

    pub async fn fetch(&self) -> Result<Value, ApiError> {
        self.send(HttpMethod::Get, &self.url, &empty_payload()).await
    }

    /// PATCH `data` as JSON to the member.
    pub async fn update<T: Serialize + ?Sized>(&self, data: &T) -> Result<Value, ApiError> {
        let data = to_payload(data)?;
        self.send(HttpMethod::Patch, &self.url, &data).await
    }

    /// DELETE the member. No body is sent.
    pub async fn del(&self) -> Result<Value, ApiError> {
        self.send(HttpMethod::Delete, &self.url, &empty_payload()).await
    }

    /// Names of the declared member actions.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.node.on_member.iter().map(|a| a.name.as_str())
    }

    pub async fn call(&self, name: &str) -> Result<Value, ApiError> {
        let action = find_action(&self.node.on_member, name)?;
        self.send(action.method, &action_url(&self.url, &action.name), &empty_payload())
            .await
    }

    pub async fn call_with<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<Value, ApiError> {
        let action = find_action(&self.node.on_member, name)?;
        let data = to_payload(data)?;
        self.send(action.method, &action_url(&self.url, &action.name), &data)
            .await
    }

    /// Endpoint for a nested entity, rooted at this member's URL.
    pub fn nested(&self, name: &str) -> Result<Endpoint, ApiError> {
        let node = self
            .node
            .nested
            .iter()
            .find(|n| n.name == name)
            .ok_or_else(|| ApiError::UnknownEntity(name.to_string()))?;
        Ok(Endpoint {
            base_url: self.url.clone(),
            node: Arc::clone(node),
            dispatcher: self.dispatcher.clone(),
        })
    }

    /// Names of the nested entities.
    pub fn nested_names(&self) -> impl Iterator<Item = &str> {
        self.node.nested.iter().map(|n| n.name.as_str())
    }

    async fn send(&self, method: HttpMethod, url: &str, data: &Value) -> Result<Value, ApiError> {
        self.dispatcher.json_call(method, url, data, &[]).await
    }
}

/// Result of invoking an accessor with or without a key.
#[derive(Debug, Clone)]
pub enum Handle {
    Collection(CollectionHandle),
    Member(MemberHandle),
}

impl Handle {
    pub fn url(&self) -> &str {
        match self {
            Handle::Collection(h) => h.url(),
            Handle::Member(h) => h.url(),
        }
    }

    pub async fn fetch(&self) -> Result<Value, ApiError> {
        match self {
            Handle::Collection(h) => h.fetch().await,
            Handle::Member(h) => h.fetch().await,
        }
    }

    /// Dispatch a custom action by name on whichever scope this is.
    pub async fn call(&self, name: &str) -> Result<Value, ApiError> {
        match self {
            Handle::Collection(h) => h.call(name).await,
            Handle::Member(h) => h.call(name).await,
        }
    }

    pub async fn call_with<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<Value, ApiError> {
        match self {
            Handle::Collection(h) => h.call_with(name, data).await,
            Handle::Member(h) => h.call_with(name, data).await,
        }
    }
}

fn find_action<'a>(actions: &'a Actions, name: &str) -> Result<&'a Action, ApiError> {
    actions
        .find(name)
        .ok_or_else(|| ApiError::UnknownAction(name.to_string()))
}
