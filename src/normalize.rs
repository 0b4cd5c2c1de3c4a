//! Normalization utilities shared by every collector: URL canonicalization,
//! HTML-to-text cleaning, tag/meta extraction, and permissive date coercion.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Query parameters stripped during URL canonicalization.
const TRACKING_PARAMS: [&str; 7] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
];

/// Canonicalize a URL: strip the fragment, tracking query parameters, and
/// trailing path slashes. Invalid URLs pass through trimmed (fragment still
/// removed). Idempotent: applying twice equals applying once.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_fragment = match trimmed.find('#') {
        Some(idx) => trimmed[..idx].trim_end(),
        None => trimmed,
    };
    if without_fragment.is_empty() {
        return String::new();
    }

    let mut parsed = match url::Url::parse(without_fragment) {
        Ok(parsed) => parsed,
        Err(_) => return without_fragment.to_string(),
    };

    if parsed.query().is_some() {
        let kept: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        if kept.is_empty() {
            parsed.set_query(None);
        } else {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in &kept {
                serializer.append_pair(key, value);
            }
            let query = serializer.finish();
            parsed.set_query(Some(&query));
        }
    }
    parsed.set_fragment(None);

    let path = parsed.path().trim_end_matches('/').to_string();
    if path.is_empty() {
        parsed.set_path("/");
    } else {
        parsed.set_path(&path);
    }

    parsed.to_string()
}

static RE_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script.*?</script>").unwrap());
static RE_STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style.*?</style>").unwrap());
static RE_NOSCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<noscript.*?</noscript>").unwrap());
static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip script/style/noscript blocks and remaining tags, decode HTML
/// entities, and collapse whitespace.
pub fn clean_html(html: &str) -> String {
    let out = RE_SCRIPT.replace_all(html, " ");
    let out = RE_STYLE.replace_all(&out, " ");
    let out = RE_NOSCRIPT.replace_all(&out, " ");
    let out = RE_TAGS.replace_all(&out, " ");
    let out = html_escape::decode_html_entities(out.as_ref()).into_owned();
    RE_WS.replace_all(&out, " ").trim().to_string()
}

/// Extract and clean the inner text of the first `<tag>…</tag>` occurrence.
pub fn extract_tag(html: &str, tag: &str) -> String {
    let pattern = format!(r"(?is)<{tag}[^>]*>(.*?)</{tag}>", tag = regex::escape(tag));
    match Regex::new(&pattern) {
        Ok(re) => re
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| clean_html(m.as_str()))
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

/// Extract the `content` of a `<meta attr="value" content="…">` tag,
/// accepting either attribute order.
pub fn extract_meta_tag(html: &str, attr: &str, value: &str) -> String {
    let attr = regex::escape(attr);
    let value = regex::escape(value);
    let patterns = [
        format!(r#"(?i)<meta[^>]*{attr}=["']{value}["'][^>]*content=["']([^"']+)["'][^>]*>"#),
        format!(r#"(?i)<meta[^>]*content=["']([^"']+)["'][^>]*{attr}=["']{value}["'][^>]*>"#),
    ];
    for pattern in patterns {
        if let Ok(re) = Regex::new(&pattern) {
            if let Some(m) = re.captures(html).and_then(|caps| caps.get(1)) {
                return clean_html(m.as_str());
            }
        }
    }
    String::new()
}

/// Pull a title + rich snippet out of a fetched article page: the social
/// preview description when present, otherwise the cleaned body head.
pub fn extract_article_snippet(html: &str) -> (String, String) {
    let og_desc = {
        let prop = extract_meta_tag(html, "property", "og:description");
        if prop.is_empty() {
            extract_meta_tag(html, "name", "description")
        } else {
            prop
        }
    };
    let title = extract_tag(html, "title");
    let summary = if og_desc.is_empty() {
        truncate_chars(&clean_html(html), 900)
    } else {
        og_desc
    };
    (title, summary)
}

/// Current time as an ISO-8601 UTC string with millisecond precision, the
/// timestamp format used throughout the persisted document.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Coerce a source-supplied date into ISO-8601, falling back when the value
/// is empty or unparseable. Accepts RFC 3339, RFC 2822 (feed `pubDate`),
/// `2024-03-05`, and `March 5, 2024` / `Mar 5, 2024` shapes.
pub fn coerce_iso_date(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return fallback.to_string();
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return to_iso(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return to_iso(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            let naive = date.and_time(NaiveTime::MIN);
            return to_iso(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    fallback.to_string()
}

/// Parse a stored or query-supplied timestamp. Used for feed filtering and
/// ordering; `None` means the value is unusable.
pub fn parse_iso_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc))
}

/// Character-bounded prefix (not byte-bounded; summaries may be non-ASCII).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Salvage a JSON object from a model reply that may wrap it in prose:
/// try the full text first, then the outermost `{…}` span.
pub fn extract_loose_json(text: &str) -> Option<serde_json::Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}
