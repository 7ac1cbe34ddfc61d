#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{Map, Value};
use tower::ServiceExt;

use smartsaver_api::auth::{AuthPolicy, Claims, TokenVerifier, VerifyError};
use smartsaver_api::database::models::UserDocument;
use smartsaver_api::database::{MemoryStore, Sequence, StoreError, UserStore};
use smartsaver_api::{app, AppState};

/// Accepts `verified:<uid>` tokens as real identities with a non-placeholder email
pub struct StaticVerifier;

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        match token.strip_prefix("verified:") {
            Some(uid) if !uid.is_empty() => Ok(Claims {
                sub: uid.to_string(),
                email: Some(format!("{}@mail.test", uid)),
                name: Some(format!("Verified {}", uid)),
                ..Default::default()
            }),
            _ => Err(VerifyError::Invalid("unknown token".to_string())),
        }
    }
}

/// Store whose every call fails as if the database host refused connections
pub struct DownStore;

pub const DOWN_STORE_DETAIL: &str = "connection refused (db.internal:5432)";

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::Connection(DOWN_STORE_DETAIL.to_string()))
}

#[async_trait]
impl UserStore for DownStore {
    async fn find(&self, _subject_id: &str) -> Result<Option<UserDocument>, StoreError> {
        down()
    }

    async fn insert_if_absent(&self, _document: &UserDocument) -> Result<bool, StoreError> {
        down()
    }

    async fn set_fields(&self, _subject_id: &str, _fields: Map<String, Value>) -> Result<u64, StoreError> {
        down()
    }

    async fn push_entry(&self, _subject_id: &str, _sequence: Sequence, _entry: Value) -> Result<u64, StoreError> {
        down()
    }

    async fn update_entry(
        &self,
        _subject_id: &str,
        _sequence: Sequence,
        _entry_id: &str,
        _fields: Map<String, Value>,
    ) -> Result<u64, StoreError> {
        down()
    }

    async fn pull_entry(&self, _subject_id: &str, _sequence: Sequence, _entry_id: &str) -> Result<u64, StoreError> {
        down()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        down()
    }

    async fn close(&self) {}

    fn backend(&self) -> &'static str {
        "down"
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn UserStore>,
}

/// Development profile: dev tokens and the read bypass are on, no verifier
pub fn dev_app() -> TestApp {
    build(
        None,
        AuthPolicy {
            allow_dev_tokens: true,
            allow_any_token: true,
            dev_read_bypass: true,
        },
    )
}

/// Production-like profile: only the static verifier is honoured
pub fn verified_app() -> TestApp {
    build(Some(Arc::new(StaticVerifier)), AuthPolicy::strict())
}

pub fn build(verifier: Option<Arc<dyn TokenVerifier>>, policy: AuthPolicy) -> TestApp {
    build_with_store(Arc::new(MemoryStore::new()), verifier, policy)
}

pub fn build_with_store(
    store: Arc<dyn UserStore>,
    verifier: Option<Arc<dyn TokenVerifier>>,
    policy: AuthPolicy,
) -> TestApp {
    let state = AppState::new(store.clone(), verifier, policy);
    TestApp {
        router: app(state),
        store,
    }
}

pub fn dev_token(user_id: &str) -> String {
    format!("dev_{}", user_id)
}

impl TestApp {
    /// Send one request through the router and decode the JSON body (Null when empty)
    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::DELETE, uri, Some(token), None).await
    }
}
