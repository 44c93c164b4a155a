// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Webmention Receiver
//!
//! This crate implements the receiving side of the Webmention protocol for
//! indieweb2-bastion:
//!
//! - `source`/`target` validation (http/https only)
//! - Target ownership policy (own domain, content namespace)
//! - Source fetching with content negotiation
//! - Per-media-type mention detection (text, JSON, streaming HTML)
//! - Idempotent persistence keyed by `(target, source)` with prefix listing
//! - WebFinger identity redirects

pub mod config;
pub mod detector;
pub mod error;
pub mod fetcher;
pub mod handlers;
pub mod metrics;
pub mod policy;
pub mod store;
pub mod validator;
pub mod webfinger;

pub use config::Config;
pub use error::AppError;
pub use handlers::{router, AppState};
pub use store::{MemoryStore, MentionStore, SqliteStore};
pub use validator::{MentionClaim, Submission, ValidationError};
