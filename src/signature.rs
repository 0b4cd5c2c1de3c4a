//! Stable content signatures: the single identity key used for dedup, for
//! analyst-note cache lookups, and for deriving persisted item ids.

use sha2::{Digest, Sha256};

use crate::model::Item;
use crate::normalize::normalize_url;

/// Hex-encoded SHA-256.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

/// Normalize free text into a comparison key: lowercase, punctuation mapped
/// to spaces, whitespace collapsed.
pub fn text_key(s: &str) -> String {
    let lowered = s.to_lowercase();
    let mapped: String = lowered
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn key_prefix(s: &str, max: usize) -> String {
    text_key(s).chars().take(max).collect()
}

/// Derive the stable signature of a candidate item. Two fetch results that
/// differ only in whitespace, casing, or URL tracking parameters collapse to
/// the same signature.
pub fn stable_signature(item: &Item) -> String {
    let fields = [
        item.schema_version.to_string(),
        item.channel.as_str().to_string(),
        item.entity_type.as_str().to_string(),
        item.entity.clone(),
        item.announcement_type.as_str().to_string(),
        key_prefix(&item.title, 140),
        key_prefix(&item.summary, 220),
        normalize_url(&item.url),
    ];
    sha256_hex(&fields.join("|"))
}

/// Persisted item id: hash of the signature plus the event timestamp.
pub fn item_id(signature: &str, event_at: &str) -> String {
    sha256_hex(&format!("{signature}|{event_at}"))
}
