//! LinkedIn collectors: search-proxied query syndication (entries must point
//! at a LinkedIn domain and resolve to a tracked entity) and company-page
//! diffing with social-preview metadata.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::collect::{build_item, push_fetch_error, ChannelBatch, CollectionEngine, ItemSpec};
use crate::fingerprint::page_fingerprint;
use crate::model::{Channel, Snapshot, SourceType, SourceVersion};
use crate::normalize::{
    coerce_iso_date, extract_meta_tag, normalize_url, now_iso, truncate_chars,
};
use crate::signature::sha256_hex;
use crate::store::Store;
use crate::syndication::parse_feed_entries;

/// Entries considered per query feed.
const MAX_ENTRIES_PER_QUERY: usize = 25;

static RE_LINKEDIN_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)linkedin\.com").unwrap());

/// Role-title keywords that mark an individual-employee signal rather than a
/// company-level one.
static RE_EMPLOYEE_SIGNAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)employee|vp|director|manager|head of|founder|cto|ceo|chief").unwrap()
});

/// Explicit update language on a company page; drives the confidence split.
static RE_UPDATE_LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)integration|partnership|launch|announc|release|new|hiring").unwrap());

fn is_linkedin_url(url: &str) -> bool {
    RE_LINKEDIN_URL.is_match(url)
}

pub(crate) async fn collect_search(engine: &CollectionEngine) -> ChannelBatch {
    let mut batch = ChannelBatch::default();

    for feed in &engine.roster.linkedin_search {
        let response = engine.fetcher.fetch(&feed.url).await;
        if !response.ok {
            push_fetch_error(&mut batch, "linkedin-rss", None, &feed.url, response.status);
            continue;
        }

        let expected = engine.roster.feed_owner(feed);
        let rows = parse_feed_entries(&response.text);

        for row in rows.into_iter().take(MAX_ENTRIES_PER_QUERY) {
            if row.link.is_empty() || row.title.is_empty() || !is_linkedin_url(&row.link) {
                continue;
            }

            let blob = format!("{} {}", row.title, row.summary).to_lowercase();
            let Some(entity) = expected.or_else(|| engine.roster.match_in_text(&blob)) else {
                continue;
            };

            let employee_signal = RE_EMPLOYEE_SIGNAL.is_match(&blob);
            let source_type = if employee_signal {
                SourceType::LinkedinEmployee
            } else {
                SourceType::LinkedinCompany
            };
            let confidence = if employee_signal { 0.84 } else { 0.9 };
            let confidence_reason = if employee_signal {
                "LinkedIn employee-related mention matched tracked entity"
            } else {
                "LinkedIn company-related mention matched tracked entity"
            };
            let summary = if row.summary.is_empty() {
                "LinkedIn update captured from monitored feed."
            } else {
                row.summary.as_str()
            };

            let now = now_iso();
            let published = row.published.as_deref().unwrap_or("");
            batch.candidates.push(build_item(ItemSpec {
                entity,
                channel: Channel::Linkedin,
                source_type,
                url: &row.link,
                title: &row.title,
                summary,
                event_at: published,
                confidence,
                confidence_reason,
            }));
            batch.versions.push((
                row.link.clone(),
                SourceVersion {
                    observed_at: now.clone(),
                    entity: entity.name.clone(),
                    entity_type: entity.entity_type,
                    channel: Channel::Linkedin,
                    source_type,
                    digest: sha256_hex(&format!("{}|{}", row.title, row.summary)),
                    title: row.title.clone(),
                    summary: truncate_chars(&row.summary, 900),
                    event_at: coerce_iso_date(published, &now),
                    confidence,
                },
            ));
        }
    }

    batch
}

pub(crate) async fn collect_pages(engine: &CollectionEngine, store: &Store) -> ChannelBatch {
    let mut batch = ChannelBatch::default();

    for entity in engine.roster.entities() {
        for page_url in &entity.linkedin_company_pages {
            let normalized = normalize_url(page_url);
            let response = engine.fetcher.fetch(&normalized).await;
            if !response.ok {
                push_fetch_error(
                    &mut batch,
                    "linkedin-page",
                    Some(&entity.name),
                    &normalized,
                    response.status,
                );
                continue;
            }

            let fp = page_fingerprint(&response.text);
            let og_title = extract_meta_tag(&response.text, "property", "og:title");
            let og_desc = {
                let prop = extract_meta_tag(&response.text, "property", "og:description");
                if prop.is_empty() {
                    extract_meta_tag(&response.text, "name", "description")
                } else {
                    prop
                }
            };
            let strong =
                RE_UPDATE_LANGUAGE.is_match(&format!("{og_title} {og_desc}").to_lowercase());
            let confidence = if strong { 0.9 } else { 0.82 };

            let prev = store.snapshots.get(&normalized);
            let now = now_iso();
            let display_title = if og_title.is_empty() {
                fp.title.clone()
            } else {
                og_title.clone()
            };

            batch.snapshots.push((
                normalized.clone(),
                Snapshot {
                    entity: entity.name.clone(),
                    entity_type: entity.entity_type,
                    digest: fp.digest.clone(),
                    title: display_title.clone(),
                    updated_at: fp.updated_at.clone(),
                    checked_at: now.clone(),
                },
            ));
            batch.versions.push((
                normalized.clone(),
                SourceVersion {
                    observed_at: now.clone(),
                    entity: entity.name.clone(),
                    entity_type: entity.entity_type,
                    channel: Channel::Linkedin,
                    source_type: SourceType::LinkedinCompanyPage,
                    digest: fp.digest.clone(),
                    title: display_title.clone(),
                    summary: truncate_chars(&og_desc, 900),
                    event_at: coerce_iso_date(fp.updated_at.as_deref().unwrap_or(""), &now),
                    confidence,
                },
            ));

            let Some(prev) = prev else {
                continue;
            };
            let marker_moved = fp.updated_at.is_some() && prev.updated_at != fp.updated_at;
            if prev.digest == fp.digest && !marker_moved {
                continue;
            }

            let title = if display_title.is_empty() {
                format!("{} LinkedIn page updated", entity.name)
            } else {
                display_title
            };
            let summary = if og_desc.is_empty() {
                "Verified LinkedIn company page change detected.".to_string()
            } else {
                og_desc.clone()
            };
            let event_at = fp.updated_at.clone().unwrap_or_default();
            batch.candidates.push(build_item(ItemSpec {
                entity,
                channel: Channel::Linkedin,
                source_type: SourceType::LinkedinCompanyPage,
                url: &normalized,
                title: &title,
                summary: &summary,
                event_at: &event_at,
                confidence,
                confidence_reason: if strong {
                    "LinkedIn company page changed with explicit update language"
                } else {
                    "LinkedIn company page fingerprint changed"
                },
            }));
        }
    }

    batch
}
