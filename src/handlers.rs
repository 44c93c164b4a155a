// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the Webmention receiver.
//!
//! Submissions run `parse → validate → policy → fetch → detect → persist`;
//! the first failing stage becomes the response and nothing is stored.

use crate::config::Config;
use crate::detector;
use crate::error::{AppError, Result};
use crate::fetcher::SourceFetcher;
use crate::metrics::Metrics;
use crate::policy::TargetPolicy;
use crate::store::{self, MentionStore};
use crate::validator::{MentionClaim, Submission, ValidationError};
use crate::webfinger::{Webfinger, WebfingerDocument};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub policy: TargetPolicy,
    pub fetcher: SourceFetcher,
    pub store: Arc<dyn MentionStore>,
    pub webfinger: Webfinger,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn MentionStore>) -> anyhow::Result<Self> {
        Ok(Self {
            policy: TargetPolicy::new(&config.receiver),
            fetcher: SourceFetcher::new(&config.fetch)?,
            webfinger: Webfinger::new(&config.webfinger),
            metrics: Metrics::new()?,
            store,
            config,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Query string for mention listings.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub target: Option<String>,
}

/// Sources recorded for a target.
#[derive(Debug, Serialize, Deserialize)]
pub struct MentionListing {
    pub urls: Vec<String>,
    pub count: usize,
    pub truncated: bool,
}

/// Query string for WebFinger lookups.
#[derive(Debug, Deserialize)]
pub struct WebfingerQuery {
    #[serde(default)]
    pub resource: Option<String>,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route(
            "/api/webmentions",
            get(list_mentions).post(submit_mention),
        )
        .route(
            "/.well-known/webfinger",
            get(webfinger).fallback(webfinger_method_not_allowed),
        );

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "webmention-receiver",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Receive a Webmention.
///
/// Accepts a JSON object or form-encoded body carrying `source` and `target`,
/// and answers `202` with the request method once the mention is verified
/// and stored.
pub async fn submit_mention(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    match receive(&state, content_type, &body).await {
        Ok(claim) => {
            info!(
                source = %claim.source,
                target = %claim.target,
                "Webmention accepted"
            );
            state.metrics.record_submission("accepted");
            (StatusCode::ACCEPTED, method.to_string()).into_response()
        }
        Err(err) => {
            info!(code = err.code(), error = %err, "Webmention rejected");
            state.metrics.record_submission(err.code());
            err.into_response()
        }
    }
}

/// Verify a submission and persist it.
async fn receive(state: &AppState, content_type: Option<&str>, body: &[u8]) -> Result<MentionClaim> {
    let claim = Submission::parse(content_type, body)?.into_claim()?;

    if !state.policy.accepts(&claim.target) {
        return Err(AppError::PolicyRejected(state.policy.rejection_message()));
    }

    let document = state
        .fetcher
        .fetch(&claim.source)
        .await
        .map_err(|e| AppError::SourceUnreachable(e.to_string()))?;

    if !detector::detect(document, claim.target.as_str()).await? {
        return Err(AppError::NotMentioned);
    }

    let key = store::mention_key(&claim.target, &claim.source);
    state.store.put(&key, claim.payload.as_bytes()).await?;
    debug!(key = %key, "Mention persisted");

    Ok(claim)
}

/// List the sources that mention a target.
pub async fn list_mentions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<MentionListing>> {
    let target = query
        .target
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ValidationError::MissingParameter(vec!["target"]))?;

    let listing = state.store.list(&store::target_prefix(&target)).await?;
    let urls: Vec<String> = listing
        .keys
        .iter()
        .filter_map(|key| store::source_of(key))
        .map(str::to_string)
        .collect();

    debug!(
        prefix = %target,
        count = urls.len(),
        complete = listing.complete,
        "Listed mentions"
    );
    state.metrics.record_listing();

    Ok(Json(MentionListing {
        count: urls.len(),
        urls,
        truncated: !listing.complete,
    }))
}

/// WebFinger lookup against the static redirect table.
pub async fn webfinger(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebfingerQuery>,
) -> Result<Json<WebfingerDocument>> {
    let resource = query
        .resource
        .filter(|r| !r.is_empty())
        .ok_or(AppError::MissingQuery("resource"))?;

    match state.webfinger.lookup(&resource) {
        Some(doc) => Ok(Json(doc)),
        None => {
            debug!(resource = %resource, "Unknown WebFinger resource");
            Err(AppError::UnknownAccount)
        }
    }
}

pub async fn webfinger_method_not_allowed() -> AppError {
    AppError::MethodNotAllowed("This webfinger implementation only supports `GET` requests.")
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
