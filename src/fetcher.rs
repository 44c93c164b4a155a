// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Source document fetching.

use crate::config::FetchConfig;
use crate::detector::MediaType;
use reqwest::{header, Client, Response};
use tracing::debug;
use url::Url;

/// A fetched source whose body has not been read yet.
#[derive(Debug)]
pub struct FetchedDocument {
    /// Raw Content-Type header, parameters included
    pub content_type: Option<String>,
    pub response: Response,
}

/// HTTP client used to retrieve `source` documents.
///
/// Redirects are followed with reqwest's default policy and the whole fetch
/// (connect, redirects, body) is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    client: Client,
}

impl SourceFetcher {
    pub fn new(config: &FetchConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client })
    }

    /// GET `source`, failing on transport errors or a non-2xx final status.
    pub async fn fetch(&self, source: &Url) -> reqwest::Result<FetchedDocument> {
        let response = self
            .client
            .get(source.clone())
            .header(header::ACCEPT, MediaType::ACCEPT)
            .send()
            .await?
            .error_for_status()?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        debug!(
            source = %source,
            final_url = %response.url(),
            status = %response.status(),
            content_type = ?content_type,
            "Fetched source"
        );

        Ok(FetchedDocument {
            content_type,
            response,
        })
    }
}
