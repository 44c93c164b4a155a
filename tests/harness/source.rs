// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! In-process source site serving fixed documents on an ephemeral port.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// What the site answers for a path.
#[derive(Debug, Clone)]
pub enum Page {
    Document {
        content_type: &'static str,
        body: String,
    },
    Redirect(&'static str),
    Status(StatusCode),
    /// Serve the inner page after a delay.
    Slow(Duration, Box<Page>),
}

impl Page {
    pub fn html(body: impl Into<String>) -> Self {
        Page::Document {
            content_type: "text/html; charset=utf-8",
            body: body.into(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Page::Document {
            content_type: "text/plain",
            body: body.into(),
        }
    }

    pub fn json(body: serde_json::Value) -> Self {
        Page::Document {
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn slow(delay: Duration, page: Page) -> Self {
        Page::Slow(delay, Box::new(page))
    }
}

#[derive(Clone)]
struct SiteState {
    pages: Arc<HashMap<&'static str, Page>>,
    hits: Arc<AtomicUsize>,
    accepts: Arc<Mutex<Vec<String>>>,
}

pub struct SourceSite {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    accepts: Arc<Mutex<Vec<String>>>,
}

impl SourceSite {
    pub async fn start(pages: Vec<(&'static str, Page)>) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let accepts = Arc::new(Mutex::new(Vec::new()));
        let state = SiteState {
            pages: Arc::new(pages.into_iter().collect()),
            hits: hits.clone(),
            accepts: accepts.clone(),
        };
        let app = Router::new().fallback(serve_page).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits, accepts }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Requests served so far, any path.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `Accept` header of every request served, in arrival order.
    pub fn accept_headers(&self) -> Vec<String> {
        self.accepts.lock().unwrap().clone()
    }
}

async fn serve_page(State(site): State<SiteState>, uri: Uri, headers: HeaderMap) -> Response {
    site.hits.fetch_add(1, Ordering::SeqCst);
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    site.accepts.lock().unwrap().push(accept);

    match site.pages.get(uri.path()) {
        Some(page) => respond(page).await,
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn respond(mut page: &Page) -> Response {
    while let Page::Slow(delay, inner) = page {
        tokio::time::sleep(*delay).await;
        page = &**inner;
    }
    match page {
        Page::Document { content_type, body } => {
            ([(header::CONTENT_TYPE, *content_type)], body.clone()).into_response()
        }
        Page::Redirect(location) => Redirect::temporary(location).into_response(),
        Page::Status(code) => (*code).into_response(),
        Page::Slow(..) => unreachable!(),
    }
}
