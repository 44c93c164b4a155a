// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for hostile submissions.

/// URLs that parse but use schemes a receiver must refuse.
pub fn unsupported_scheme_urls() -> Vec<&'static str> {
    vec![
        "ftp://example.com/file",
        "file:///etc/passwd",
        "javascript:alert(1)",
        "data:text/html,<a href=\"https://helvetica.moe/posts/1\">x</a>",
        "gopher://example.com/1",
        "mailto:someone@helvetica.moe",
    ]
}

/// Well-formed http(s) targets that are not this receiver's content.
pub fn foreign_targets() -> Vec<&'static str> {
    vec![
        "https://evil.example/posts/1",
        "https://helvetica.moe@evil.example/posts/1",
        "https://helvetica.moe.evil.example/posts/1",
        "https://www.helvetica.moe/posts/1",
        "https://evil.example/posts/1?next=https://helvetica.moe/posts/1",
        "https://helvetica.moe/",
        "https://helvetica.moe/about",
        "https://helvetica.moe/postscript",
        "https://helvetica.moe/posts/../admin",
    ]
}

/// Strings that are not absolute URLs at all.
pub fn malformed_urls() -> Vec<&'static str> {
    vec!["", "not a url", "/posts/1", "https://", "http://[::1", "://helvetica.moe"]
}

/// A page that links the target early and then keeps going for a while.
pub fn long_html_with_early_link(target: &str, padding_paragraphs: usize) -> String {
    let mut html = format!(r#"<html><body><a href="{target}">reply</a>"#);
    for i in 0..padding_paragraphs {
        html.push_str(&format!("<p>paragraph {i} with some filler text</p>"));
    }
    html.push_str("</body></html>");
    html
}
