#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use acoustica_api::auth::TokenService;
use acoustica_api::database::{
    Collection, Document, DocumentStore, InsertAck, MemoryStore, StoreError, UpdateAck,
};
use acoustica_api::middleware::cors_layer;
use acoustica_api::{router, AppState};

pub const SECRET: &str = "integration-test-secret";

/// Router over a fresh in-memory store, driven in-process with `oneshot`
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub tokens: TokenService,
    router: Router,
}

impl TestApp {
    pub fn new(enforce_auth: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(SECRET, 24 * 7).expect("token service");
        let state = AppState::new(store.clone(), tokens.clone(), enforce_auth);
        let router = router(state).layer(cors_layer(&[]));
        Self { store, tokens, router }
    }

    /// Auth enforced, as in a default deployment
    pub fn secured() -> Self {
        Self::new(true)
    }

    pub fn bearer_for(&self, email: &str) -> String {
        let token = self.tokens.issue(json!({ "email": email })).expect("issue token");
        format!("Bearer {}", token)
    }

    pub async fn seed(&self, collection: Collection, docs: Vec<Value>) -> Result<()> {
        let docs = docs.into_iter().map(into_document).collect();
        self.store.seed(collection, docs).await?;
        Ok(())
    }

    pub async fn raw(&self, request: Request<Body>) -> Result<Response> {
        Ok(self.router.clone().oneshot(request).await?)
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.raw(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok((status, body))
    }

    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.send(Request::get(uri).body(Body::empty())?).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(json_request("POST", uri, body, None)?).await
    }

    pub async fn patch(&self, uri: &str, auth: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::patch(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        self.send(builder.body(Body::empty())?).await
    }

    /// Insert a user straight into the store and return its id
    pub async fn insert_user(&self, user: Value) -> Result<String> {
        let (status, body) = self.post("/users", user).await?;
        anyhow::ensure!(status == StatusCode::OK, "user insert failed: {} {}", status, body);
        body["insertedId"]
            .as_str()
            .map(str::to_string)
            .context("insertedId missing")
    }
}

/// Router over a store whose every call fails with the error `fail` builds
pub fn failing_router(fail: fn() -> StoreError) -> Result<Router> {
    let tokens = TokenService::new(SECRET, 24 * 7)?;
    let state = AppState::new(Arc::new(FailingStore { fail }), tokens, false);
    Ok(router(state))
}

/// Store standing in for an unreachable or rejecting backend
struct FailingStore {
    fail: fn() -> StoreError,
}

#[async_trait::async_trait]
impl DocumentStore for FailingStore {
    async fn insert_one(&self, _: Collection, _: Document) -> Result<InsertAck, StoreError> {
        Err((self.fail)())
    }

    async fn find_all(&self, _: Collection) -> Result<Vec<Document>, StoreError> {
        Err((self.fail)())
    }

    async fn find_one_by(&self, _: Collection, _: &str, _: &Value) -> Result<Option<Document>, StoreError> {
        Err((self.fail)())
    }

    async fn set_field_by_id(
        &self,
        _: Collection,
        _: &str,
        _: &str,
        _: Value,
        _: bool,
    ) -> Result<UpdateAck, StoreError> {
        Err((self.fail)())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err((self.fail)())
    }
}

/// Run one request through a router and decode the JSON body
pub async fn send_to(router: Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = router.oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

pub fn json_request(method: &str, uri: &str, body: Value, auth: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    Ok(builder.body(Body::from(serde_json::to_vec(&body)?))?)
}

pub fn into_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected JSON object, got {}", other),
    }
}
