// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mention detection.
//!
//! Decides whether a fetched source references the target URL, using
//! per-media-type rules:
//!
//! - `text/plain`: substring search over the decoded body
//! - `application/json`: exact match against any string leaf value
//! - `text/html`: exact `href` match on `a`, `img` or `video` elements
//!
//! Text and JSON bodies are read in full. HTML is scanned as it streams in,
//! on a blocking worker, so large pages are never buffered whole.

use crate::fetcher::FetchedDocument;
use bytes::Bytes;
use lol_html::{element, HtmlRewriter, Settings};
use reqwest::Response;
use serde_json::Value;
use std::cell::Cell;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, trace};

/// Elements whose `href` counts as a mention.
const LINKING_ELEMENTS: [&str; 3] = ["a", "img", "video"];

/// Chunks buffered between the body reader and the HTML scanner.
const HTML_CHUNK_BUFFER: usize = 16;

/// Supported source media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    PlainText,
    Json,
    Html,
}

impl MediaType {
    /// Accept header value, in preference order.
    pub const ACCEPT: &'static str = "text/plain, application/json, text/html";

    /// Resolve a Content-Type header, ignoring parameters such as charset.
    pub fn from_header(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or(value).trim();
        if essence.eq_ignore_ascii_case("text/plain") {
            Some(Self::PlainText)
        } else if essence.eq_ignore_ascii_case("application/json") {
            Some(Self::Json)
        } else if essence.eq_ignore_ascii_case("text/html") {
            Some(Self::Html)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::Json => "application/json",
            Self::Html => "text/html",
        }
    }
}

/// Detection error types.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Unknown Content-Type {0}")]
    UnsupportedContentType(String),

    #[error("Failed to read source body: {0}")]
    Body(#[from] reqwest::Error),

    #[error("Source is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTML scan failed: {0}")]
    Html(String),
}

/// Determine whether `doc` mentions `target`.
pub async fn detect(doc: FetchedDocument, target: &str) -> Result<bool, DetectError> {
    let raw = doc.content_type.unwrap_or_default();
    let media_type = MediaType::from_header(&raw)
        .ok_or_else(|| DetectError::UnsupportedContentType(raw.clone()))?;

    let found = match media_type {
        MediaType::PlainText => text_mentions(&doc.response.text().await?, target),
        MediaType::Json => {
            let value: Value = serde_json::from_slice(&doc.response.bytes().await?)?;
            json_mentions(&value, target)
        }
        MediaType::Html => html_mentions(doc.response, target).await?,
    };

    debug!(media_type = media_type.as_str(), target = %target, found, "Detection finished");
    Ok(found)
}

/// Plain text: the target appears anywhere in the body.
pub fn text_mentions(body: &str, target: &str) -> bool {
    body.contains(target)
}

/// JSON: some string leaf equals the target. Keys are not considered.
pub fn json_mentions(value: &Value, target: &str) -> bool {
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        match value {
            Value::String(s) if s == target => return true,
            Value::Array(items) => pending.extend(items),
            Value::Object(map) => pending.extend(map.values()),
            _ => {}
        }
    }
    false
}

/// Stream the response body into the HTML scanner.
///
/// The scanner stops as soon as it sees a match and hangs up its end of the
/// channel; the body is still read to the end here so the connection can be
/// reused or closed cleanly.
async fn html_mentions(mut response: Response, target: &str) -> Result<bool, DetectError> {
    let (tx, mut rx) = mpsc::channel::<Bytes>(HTML_CHUNK_BUFFER);
    let target = target.to_string();
    let scanner =
        task::spawn_blocking(move || scan_html(std::iter::from_fn(|| rx.blocking_recv()), &target));

    let mut forwarding = true;
    let mut discarded_bytes = 0usize;
    let read = loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if forwarding && tx.send(chunk.clone()).await.is_err() {
                    forwarding = false;
                }
                if !forwarding {
                    discarded_bytes += chunk.len();
                }
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    drop(tx);

    let found = scanner
        .await
        .map_err(|e| DetectError::Html(e.to_string()))??;
    trace!(discarded_bytes, "Discarded HTML read after scanner finished");

    match read {
        Err(e) if !found => Err(e.into()),
        _ => Ok(found),
    }
}

/// Scan HTML chunks for a linking element whose `href` equals `target`.
///
/// Returns at the first match without consuming the remaining chunks.
pub fn scan_html<I, B>(chunks: I, target: &str) -> Result<bool, DetectError>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let found = Cell::new(false);

    let mut element_content_handlers = Vec::with_capacity(LINKING_ELEMENTS.len());
    for tag in LINKING_ELEMENTS {
        element_content_handlers.push(element!(format!("{tag}[href]"), |el| {
            if el.get_attribute("href").as_deref() == Some(target) {
                found.set(true);
            }
            Ok(())
        }));
    }

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers,
            ..Settings::default()
        },
        |_: &[u8]| {},
    );

    for chunk in chunks {
        rewriter
            .write(chunk.as_ref())
            .map_err(|e| DetectError::Html(e.to_string()))?;
        if found.get() {
            return Ok(true);
        }
    }

    rewriter
        .end()
        .map_err(|e| DetectError::Html(e.to_string()))?;
    Ok(found.get())
}
