// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Webmention submission validator.
//!
//! Turns a raw request body into a [`MentionClaim`]:
//! - JSON object or form-encoded body
//! - `source`/`target` presence
//! - URL format validation
//! - Scheme restriction to http/https

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use url::{form_urlencoded, Url};

/// Fields every submission must carry, in reporting order.
pub const REQUIRED_FIELDS: [&str; 2] = ["target", "source"];

/// Stored in place of the payload for form-encoded submissions.
pub const FORM_MARKER: &[u8] = b"1";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request body must be a JSON object or form-encoded: {0}")]
    MalformedBody(String),

    #[error("Missing: {}.", quote_fields(.0))]
    MissingParameter(Vec<&'static str>),

    #[error("Not a valid URL: {}.", quote_fields(.0))]
    InvalidUrl(Vec<&'static str>),

    #[error("Incorrect URL scheme for: {}.", quote_fields(.0))]
    UnsupportedScheme(Vec<&'static str>),
}

/// Render field names as "`a`, `b`".
fn quote_fields(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| format!("`{f}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// What gets persisted alongside a verified mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Re-serialized JSON request body
    Json(Vec<u8>),
    /// Form submissions only record that the mention exists
    Form,
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Json(bytes) => bytes,
            Payload::Form => FORM_MARKER,
        }
    }
}

/// A validated "`source` links to `target`" claim.
#[derive(Debug, Clone)]
pub struct MentionClaim {
    pub source: Url,
    pub target: Url,
    pub payload: Payload,
}

/// A decoded but not yet validated submission body.
#[derive(Debug, Clone)]
pub struct Submission {
    fields: Map<String, Value>,
    form: bool,
}

impl Submission {
    /// Decode a request body according to its Content-Type.
    ///
    /// Form-encoded bodies are recognised by media type; anything else must be
    /// a JSON object.
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self, ValidationError> {
        let is_form = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
            .unwrap_or(false);

        if is_form {
            let mut fields = Map::new();
            for (name, value) in form_urlencoded::parse(body) {
                fields
                    .entry(name.into_owned())
                    .or_insert_with(|| Value::String(value.into_owned()));
            }
            debug!(fields = fields.len(), "Decoded form submission");
            return Ok(Self { fields, form: true });
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Ok(Self {
                fields,
                form: false,
            }),
            Ok(_) => Err(ValidationError::MalformedBody(
                "expected a JSON object".to_string(),
            )),
            Err(e) => Err(ValidationError::MalformedBody(e.to_string())),
        }
    }

    /// Required fields absent from the body, in [`REQUIRED_FIELDS`] order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|name| !self.fields.contains_key(*name))
            .collect()
    }

    /// Validate fields, URLs and schemes, producing a claim.
    pub fn into_claim(self) -> Result<MentionClaim, ValidationError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            debug!(?missing, "Missing required parameters");
            return Err(ValidationError::MissingParameter(missing));
        }

        let mut malformed = Vec::new();
        let mut parsed = Vec::with_capacity(REQUIRED_FIELDS.len());
        for name in REQUIRED_FIELDS {
            match self.fields.get(name).and_then(Value::as_str).map(Url::parse) {
                Some(Ok(url)) => parsed.push(url),
                _ => malformed.push(name),
            }
        }
        if !malformed.is_empty() {
            debug!(?malformed, "Invalid URL format");
            return Err(ValidationError::InvalidUrl(malformed));
        }

        let unsupported: Vec<&'static str> = REQUIRED_FIELDS
            .into_iter()
            .zip(&parsed)
            .filter(|(_, url)| !is_supported_scheme(url))
            .map(|(name, _)| name)
            .collect();
        if !unsupported.is_empty() {
            debug!(?unsupported, "Unsupported URL scheme");
            return Err(ValidationError::UnsupportedScheme(unsupported));
        }

        let payload = if self.form {
            Payload::Form
        } else {
            Payload::Json(
                serde_json::to_vec(&self.fields)
                    .map_err(|e| ValidationError::MalformedBody(e.to_string()))?,
            )
        };

        // REQUIRED_FIELDS is ordered target, source
        let mut urls = parsed.into_iter();
        let (Some(target), Some(source)) = (urls.next(), urls.next()) else {
            return Err(ValidationError::MissingParameter(REQUIRED_FIELDS.to_vec()));
        };

        debug!(source = %source, target = %target, "Submission valid");
        Ok(MentionClaim {
            source,
            target,
            payload,
        })
    }
}

/// Only http and https sources/targets are accepted.
pub fn is_supported_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
