//! Declarative REST client generator.
//!
//! # Overview
//! Given a base URL and a [`Schema`] of entities, [`create`] produces an
//! [`Api`] whose endpoints issue JSON requests through an injected
//! [`Transport`] and return the parsed response body.
//!
//! ```no_run
//! # async fn demo() -> Result<(), restgen_core::ApiError> {
//! use std::sync::Arc;
//! use restgen_core::{create, ClientOptions, Declaration, HttpMethod, Schema, UreqTransport};
//! use serde_json::json;
//!
//! let schema = Schema::new().entity(
//!     "users",
//!     Declaration::new()
//!         .on_member(HttpMethod::Get, "notes")
//!         .nested("books", Declaration::new().on_member(HttpMethod::Put, "mark_read")),
//! );
//! let api = create(ClientOptions::new("https://example.com/api"), &schema, Arc::new(UreqTransport::new()))?;
//!
//! let users = api.entity("users")?;
//! users.collection().fetch_with(&json!({"page": 1})).await?;   // GET  /api/users/?page=1
//! users.collection().create(&json!({"name": "John"})).await?;  // POST /api/users/
//! users.member(1).call("notes").await?;                        // GET  /api/users/1/notes
//! users.member(1).nested("books")?.member(2).call("mark_read").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - The schema is validated once at construction; the resulting `Api` is
//!   immutable, `Clone`, and shareable across tasks.
//! - Each call builds one `HttpRequest`, makes exactly one transport call,
//!   and parses the body as JSON without looking at the status code.
//! - No retries, caching, authentication or timeouts.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod request;
pub mod schema;
pub mod testing;
pub mod transport;
pub mod url;

pub use client::{create, Api, ClientOptions};
pub use endpoint::{CollectionHandle, Endpoint, Handle, MemberHandle};
pub use error::{ApiError, SchemaError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::{build_request, parse_response, Dispatcher};
pub use schema::{Action, Actions, Declaration, Schema};
pub use transport::{Transport, UreqTransport};
pub use url::{collection_url, member_url, PrimaryKey};
