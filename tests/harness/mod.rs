// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the Webmention receiver.
//!
//! Provides an in-process source site to verify against, a receiver wired to
//! an in-memory store, and request builders.

#![allow(dead_code)]

pub mod generators;
pub mod source;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;
use url::form_urlencoded;
use webmention_receiver::{
    config::Config,
    handlers::{router, AppState},
    store::{MemoryStore, MentionStore},
};

pub const TARGET: &str = "https://helvetica.moe/posts/1";

/// A receiver with direct access to its store.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(1000))
    }

    pub fn with_store(store: MemoryStore) -> Self {
        Self::with_config(Config::default(), store)
    }

    /// Receiver whose source fetches give up after `timeout_ms`.
    pub fn with_fetch_timeout(timeout_ms: u64) -> Self {
        let mut config = Config::default();
        config.fetch.timeout_ms = timeout_ms;
        Self::with_config(config, MemoryStore::new(1000))
    }

    pub fn with_config(config: Config, store: MemoryStore) -> Self {
        let store = Arc::new(store);
        let state = Arc::new(
            AppState::new(config, store.clone() as Arc<dyn MentionStore>)
                .expect("app state"),
        );
        Self {
            router: router(state.clone()),
            state,
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }
}

pub fn post_json(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/webmentions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_form(source: &str, target: &str) -> Request<Body> {
    let body = form_urlencoded::Serializer::new(String::new())
        .append_pair("source", source)
        .append_pair("target", target)
        .finish();
    Request::builder()
        .method("POST")
        .uri("/api/webmentions")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub fn mention(source: &str, target: &str) -> Request<Body> {
    post_json(serde_json::json!({ "source": source, "target": target }))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn list(target: &str) -> Request<Body> {
    let query: String = form_urlencoded::byte_serialize(target.as_bytes()).collect();
    get(&format!("/api/webmentions?target={query}"))
}
