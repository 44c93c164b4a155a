// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! WebFinger identity redirects.
//!
//! A fixed table of account aliases, loaded once from configuration. Lookups
//! are case-insensitive; Mastodon treats the returned `subject` as a redirect.

use crate::config::WebfingerConfig;
use serde::Serialize;
use std::collections::HashMap;

/// JSON document returned for a known resource.
#[derive(Debug, Serialize)]
pub struct WebfingerDocument {
    pub subject: String,
}

#[derive(Debug, Clone)]
pub struct Webfinger {
    redirects: HashMap<String, String>,
}

impl Webfinger {
    pub fn new(config: &WebfingerConfig) -> Self {
        let redirects = config
            .accounts
            .iter()
            .map(|(resource, subject)| (resource.to_lowercase(), subject.clone()))
            .collect();
        Self { redirects }
    }

    pub fn lookup(&self, resource: &str) -> Option<WebfingerDocument> {
        self.redirects
            .get(&resource.to_lowercase())
            .map(|subject| WebfingerDocument {
                subject: subject.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let webfinger = Webfinger::new(&WebfingerConfig::default());

        let doc = webfinger.lookup("acct:A5rocks@Helvetica.moe").unwrap();
        assert_eq!(doc.subject, "acct:A5rocks@uwu.social");
        assert!(webfinger.lookup("acct:someone@helvetica.moe").is_none());
    }
}
