//! Request shapes produced by generated calls, observed at the transport.

use std::sync::Arc;

use restgen_core::testing::{FailingTransport, RecordingTransport};
use restgen_core::{create, Api, ApiError, ClientOptions, Declaration, HttpMethod, HttpResponse, Schema};
use serde_json::{json, Value};

const BASE_URL: &str = "https://google.com/api";

fn schema() -> Schema {
    Schema::from_json(&json!({
        "users": {
            "onMember": { "GET": "notes" },
            "onCollection": { "POST": "check" },
            "nested": {
                "books": { "onMember": { "PUT": "mark_read" } }
            }
        }
    }))
    .unwrap()
}

fn api_with(transport: &RecordingTransport) -> Api {
    create(ClientOptions::new(BASE_URL), &schema(), Arc::new(transport.clone())).unwrap()
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_collection() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users").unwrap().collection().fetch().await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(requests[0].url, "https://google.com/api/users/");
    assert!(requests[0].body.is_none());
    assert_eq!(requests[0].header("Content-Type"), Some("application/json"));
}

#[tokio::test]
async fn fetch_collection_with_query_params() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users")
        .unwrap()
        .collection()
        .fetch_with(&json!({"page": 1, "limit": 10}))
        .await
        .unwrap();

    assert_eq!(transport.last().unwrap().url, "https://google.com/api/users/?page=1&limit=10");
}

#[tokio::test]
async fn fetch_collection_with_empty_params_has_no_query() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users").unwrap().collection().fetch_with(&json!({})).await.unwrap();

    assert_eq!(transport.last().unwrap().url, "https://google.com/api/users/");
}

#[tokio::test]
async fn create_posts_json_body() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users")
        .unwrap()
        .collection()
        .create(&json!({"name": "John"}))
        .await
        .unwrap();

    let req = transport.last().unwrap();
    assert_eq!(req.method, HttpMethod::Post);
    assert_eq!(req.url, "https://google.com/api/users/");
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(req.body.as_deref(), Some(r#"{"name":"John"}"#));
}

#[tokio::test]
async fn create_accepts_serializable_structs() {
    #[derive(serde::Serialize)]
    struct NewUser<'a> {
        name: &'a str,
        age: u8,
    }

    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users")
        .unwrap()
        .collection()
        .create(&NewUser { name: "John", age: 30 })
        .await
        .unwrap();

    assert_eq!(transport.last().unwrap().body.as_deref(), Some(r#"{"name":"John","age":30}"#));
}

#[tokio::test]
async fn collection_action_posts_to_suffixed_url() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users")
        .unwrap()
        .collection()
        .call_with("check", &json!({"email": "john@example.com"}))
        .await
        .unwrap();

    let req = transport.last().unwrap();
    assert_eq!(req.method, HttpMethod::Post);
    assert_eq!(req.url, "https://google.com/api/users/check");
    assert_eq!(req.body.as_deref(), Some(r#"{"email":"john@example.com"}"#));
}

#[tokio::test]
async fn collection_action_without_data_sends_empty_object() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users").unwrap().collection().call("check").await.unwrap();

    assert_eq!(transport.last().unwrap().body.as_deref(), Some("{}"));
}

// ---------------------------------------------------------------------------
// Member
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_member() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users").unwrap().member(1).fetch().await.unwrap();

    let req = transport.last().unwrap();
    assert_eq!(req.method, HttpMethod::Get);
    assert_eq!(req.url, "https://google.com/api/users/1/");
    assert!(req.body.is_none());
}

#[tokio::test]
async fn member_key_zero_is_a_member() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);
    let users = api.entity("users").unwrap();

    users.member(0).fetch().await.unwrap();
    users.member("0").fetch().await.unwrap();

    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, ["https://google.com/api/users/0/", "https://google.com/api/users/0/"]);
}

#[tokio::test]
async fn update_patches_json_body() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users")
        .unwrap()
        .member(1)
        .update(&json!({"name": "John"}))
        .await
        .unwrap();

    let req = transport.last().unwrap();
    assert_eq!(req.method, HttpMethod::Patch);
    assert_eq!(req.url, "https://google.com/api/users/1/");
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(req.body.as_deref(), Some(r#"{"name":"John"}"#));
}

#[tokio::test]
async fn del_sends_no_body() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users").unwrap().member(1).del().await.unwrap();

    let req = transport.last().unwrap();
    assert_eq!(req.method, HttpMethod::Delete);
    assert_eq!(req.url, "https://google.com/api/users/1/");
    assert!(req.body.is_none());
}

#[tokio::test]
async fn member_action_gets_suffixed_url() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users").unwrap().member(1).call("notes").await.unwrap();

    let req = transport.last().unwrap();
    assert_eq!(req.method, HttpMethod::Get);
    assert_eq!(req.url, "https://google.com/api/users/1/notes");
    assert!(req.body.is_none());
}

#[tokio::test]
async fn member_get_action_turns_data_into_query() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users")
        .unwrap()
        .member(1)
        .call_with("notes", &json!({"since": "2020"}))
        .await
        .unwrap();

    assert_eq!(transport.last().unwrap().url, "https://google.com/api/users/1/notes?since=2020");
}

#[tokio::test]
async fn nested_member_action() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    api.entity("users")
        .unwrap()
        .member(1)
        .nested("books")
        .unwrap()
        .member(2)
        .call("mark_read")
        .await
        .unwrap();

    let req = transport.last().unwrap();
    assert_eq!(req.method, HttpMethod::Put);
    assert_eq!(req.url, "https://google.com/api/users/1/books/2/mark_read");
    assert_eq!(req.body.as_deref(), Some("{}"));
}

#[tokio::test]
async fn handle_dispatches_by_key_presence() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);
    let users = api.entity("users").unwrap();

    users.handle(None).fetch().await.unwrap();
    users.handle(Some(5.into())).fetch().await.unwrap();
    users.handle(Some(5.into())).call("notes").await.unwrap();

    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        [
            "https://google.com/api/users/",
            "https://google.com/api/users/5/",
            "https://google.com/api/users/5/notes",
        ]
    );
}

#[tokio::test]
async fn actions_are_scoped() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);
    let users = api.entity("users").unwrap();

    let err = users.collection().call("notes").await.unwrap_err();
    assert!(matches!(err, ApiError::UnknownAction(_)));
    let err = users.member(1).call("check").await.unwrap_err();
    assert!(matches!(err, ApiError::UnknownAction(_)));
    assert!(transport.requests().is_empty());
}

// ---------------------------------------------------------------------------
// Responses and failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn returns_parsed_body_regardless_of_status() {
    let transport = RecordingTransport::replying(HttpResponse::new(404, r#"{"error":"not found"}"#));
    let api = api_with(&transport);

    let value = api.entity("users").unwrap().member(1).fetch().await.unwrap();

    assert_eq!(value, json!({"error": "not found"}));
}

#[tokio::test]
async fn non_json_body_fails_after_one_call() {
    let transport = RecordingTransport::replying(HttpResponse::new(500, "internal error"));
    let api = api_with(&transport);

    let err = api.entity("users").unwrap().collection().fetch().await.unwrap_err();

    assert!(matches!(err, ApiError::Deserialization(_)));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn transport_failure_propagates() {
    let api = create(ClientOptions::new(BASE_URL), &schema(), Arc::new(FailingTransport)).unwrap();

    let err = api.entity("users").unwrap().member(1).del().await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
}

#[test]
fn malformed_schema_fails_at_construction() {
    let err = Schema::from_json(&json!({"users": {"onMember": "notes"}})).unwrap_err();
    assert_eq!(err.path, "users.onMember");

    let bad = Schema::new().entity("users", Declaration::new().on_collection(HttpMethod::Post, "a/b"));
    let err = create(ClientOptions::new(BASE_URL), &bad, Arc::new(RecordingTransport::new())).unwrap_err();
    assert!(matches!(err, ApiError::Schema(_)));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_are_independent() {
    let transport = RecordingTransport::new();
    let api = api_with(&transport);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let users = api.entity("users").unwrap().clone();
            tokio::spawn(async move { users.member(i).update(&json!({"n": i})).await })
        })
        .collect();
    for task in tasks {
        let value: Value = task.await.unwrap().unwrap();
        assert_eq!(value, json!({}));
    }

    let mut requests = transport.requests();
    assert_eq!(requests.len(), 16);
    requests.sort_by(|a, b| a.url.cmp(&b.url));
    for req in &requests {
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        let n = body["n"].as_i64().unwrap();
        assert_eq!(req.url, format!("https://google.com/api/users/{n}/"));
    }
}
