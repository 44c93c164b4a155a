// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Target ownership policy.
//!
//! A receiver only records mentions of its own content: the target host must
//! be the configured domain and its path must sit under the content namespace.

use crate::config::ReceiverConfig;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone)]
pub struct TargetPolicy {
    domain: String,
    /// Leading slash, no trailing slash; empty means the whole site.
    namespace: String,
}

impl TargetPolicy {
    pub fn new(config: &ReceiverConfig) -> Self {
        let trimmed = config.namespace.trim().trim_matches('/');
        let namespace = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };

        Self {
            domain: config.domain.trim().to_lowercase(),
            namespace,
        }
    }

    /// Whether mentions of `target` are accepted here.
    pub fn accepts(&self, target: &Url) -> bool {
        let host_ok = target.host_str().is_some_and(|host| host == self.domain);
        let path = target.path();
        let path_ok = self.namespace.is_empty()
            || path == self.namespace
            || path
                .strip_prefix(self.namespace.as_str())
                .is_some_and(|rest| rest.starts_with('/'));

        debug!(host_ok, path_ok, target = %target, "Target policy evaluated");
        host_ok && path_ok
    }

    /// Human-readable explanation returned when a target is declined.
    pub fn rejection_message(&self) -> String {
        format!(
            "`target` should start with `https://{}{}/...`.",
            self.domain, self.namespace
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TargetPolicy {
        TargetPolicy::new(&ReceiverConfig::default())
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_accepts_posts_on_own_domain() {
        let policy = policy();
        assert!(policy.accepts(&url("https://helvetica.moe/posts/1")));
        assert!(policy.accepts(&url("http://helvetica.moe/posts/2024/hello?x=1#frag")));
        assert!(policy.accepts(&url("https://HELVETICA.moe/posts")));
    }

    #[test]
    fn test_rejects_foreign_domain() {
        let policy = policy();
        assert!(!policy.accepts(&url("https://evil.example/posts/1")));
        assert!(!policy.accepts(&url("https://www.helvetica.moe/posts/1")));
    }

    #[test]
    fn test_rejects_outside_namespace() {
        let policy = policy();
        assert!(!policy.accepts(&url("https://helvetica.moe/")));
        assert!(!policy.accepts(&url("https://helvetica.moe/about")));
        assert!(!policy.accepts(&url("https://helvetica.moe/postscript")));
    }

    #[test]
    fn test_namespace_normalisation() {
        let policy = TargetPolicy::new(&ReceiverConfig {
            domain: "Example.org".to_string(),
            namespace: "notes/".to_string(),
        });
        assert!(policy.accepts(&url("https://example.org/notes/1")));
        assert_eq!(
            policy.rejection_message(),
            "`target` should start with `https://example.org/notes/...`."
        );

        let whole_site = TargetPolicy::new(&ReceiverConfig {
            domain: "example.org".to_string(),
            namespace: "/".to_string(),
        });
        assert!(whole_site.accepts(&url("https://example.org/")));
    }
}
