//! Page fingerprinting for the diffing channels: a digest over the extracted
//! title and cleaned body head, plus a best-effort "last updated" marker.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{clean_html, extract_tag, truncate_chars};
use crate::signature::sha256_hex;

/// Permissive match for an update marker near a date, in either the
/// `March 5, 2024` or `2024-03-05` shape.
static RE_UPDATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(last\s*updated|updated|published)\s*[:\-]?\s*([A-Za-z]{3,9}\s+\d{1,2},\s+\d{4}|\d{4}-\d{2}-\d{2})",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq)]
pub struct PageFingerprint {
    pub title: String,
    pub body: String,
    pub updated_at: Option<String>,
    pub digest: String,
}

/// Fingerprint a fetched page. Two fetches of byte-identical content yield an
/// identical digest; the body is bounded so giant pages hash cheaply.
pub fn page_fingerprint(html: &str) -> PageFingerprint {
    let title = extract_tag(html, "title");
    let body = truncate_chars(&clean_html(html), 9000);
    let updated_at = RE_UPDATED
        .captures(html)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string());
    let digest = sha256_hex(&format!("{title}|{body}"));
    PageFingerprint {
        title,
        body,
        updated_at,
        digest,
    }
}
