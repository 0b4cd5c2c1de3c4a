//! Press query-syndication collector. The one channel with a continuous
//! confidence score: each entry's linked article is fetched for a richer
//! snippet and scored on entity presence, press-signal language, wire-service
//! domains, and announcement phrasing in the title.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::collect::{build_item, push_fetch_error, ChannelBatch, CollectionEngine, ItemSpec};
use crate::model::{Channel, Entity, SourceType, SourceVersion};
use crate::normalize::{coerce_iso_date, extract_article_snippet, now_iso, truncate_chars};
use crate::signature::sha256_hex;
use crate::syndication::{parse_feed_entries, FeedEntry};

/// Entries considered per query feed.
const MAX_ENTRIES_PER_QUERY: usize = 20;

static RE_PRESS_SIGNAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)press release|announc|launch|partnership|agreement|acquisition|funding|new product|rollout|unveil",
    )
    .unwrap()
});
static RE_WIRE_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)prnewswire|businesswire|globenewswire|einnews|yahoo").unwrap());
static RE_ANNOUNCE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)partnership|integration|launch|announces|press release").unwrap()
});

/// Continuous confidence: base 0.5, boosted by entity presence, press-signal
/// keywords, wire-service domain, and announcement language; capped at 0.98.
fn press_confidence(entity: &Entity, row: &FeedEntry, article_summary: &str) -> f64 {
    let blob = format!("{} {} {}", row.title, row.summary, article_summary).to_lowercase();
    let mut score: f64 = 0.5;
    if blob.contains(&entity.name.to_lowercase()) {
        score += 0.22;
    }
    if RE_PRESS_SIGNAL.is_match(&blob) {
        score += 0.2;
    }
    if RE_WIRE_DOMAIN.is_match(&row.link) {
        score += 0.1;
    }
    if RE_ANNOUNCE_TITLE.is_match(&row.title) {
        score += 0.08;
    }
    score.min(0.98)
}

pub(crate) async fn collect_search(engine: &CollectionEngine) -> ChannelBatch {
    let mut batch = ChannelBatch::default();

    for feed in &engine.roster.press_search {
        let response = engine.fetcher.fetch(&feed.url).await;
        if !response.ok {
            push_fetch_error(&mut batch, "press-rss", None, &feed.url, response.status);
            continue;
        }

        let expected = engine.roster.feed_owner(feed);
        let rows = parse_feed_entries(&response.text);

        for row in rows.into_iter().take(MAX_ENTRIES_PER_QUERY) {
            if row.link.is_empty() || row.title.is_empty() {
                continue;
            }

            let blob = format!("{} {}", row.title, row.summary).to_lowercase();
            let Some(entity) = expected.or_else(|| engine.roster.match_in_text(&blob)) else {
                continue;
            };

            // Pull the linked article for a richer snippet than the feed
            // excerpt; fall back to the feed fields when unreachable.
            let page = engine.fetcher.fetch(&row.link).await;
            let (article_title, article_summary) = if page.ok {
                extract_article_snippet(&page.text)
            } else {
                (row.title.clone(), row.summary.clone())
            };
            let confidence = press_confidence(entity, &row, &article_summary);

            let title = if article_title.is_empty() {
                row.title.clone()
            } else {
                article_title
            };
            let summary = if !article_summary.is_empty() {
                article_summary
            } else if !row.summary.is_empty() {
                row.summary.clone()
            } else {
                "Press/publication update captured.".to_string()
            };

            let now = now_iso();
            let published = row.published.as_deref().unwrap_or("");
            batch.candidates.push(build_item(ItemSpec {
                entity,
                channel: Channel::Web,
                source_type: SourceType::PressPublication,
                url: &row.link,
                title: &title,
                summary: &summary,
                event_at: published,
                confidence,
                confidence_reason:
                    "Entity-matched press/publication signal from web-wide RSS monitoring",
            }));
            batch.versions.push((
                row.link.clone(),
                SourceVersion {
                    observed_at: now.clone(),
                    entity: entity.name.clone(),
                    entity_type: entity.entity_type,
                    channel: Channel::Web,
                    source_type: SourceType::PressPublication,
                    digest: sha256_hex(&format!("{title}|{summary}")),
                    title: title.clone(),
                    summary: truncate_chars(&summary, 900),
                    event_at: coerce_iso_date(published, &now),
                    confidence,
                },
            ));
        }
    }

    batch
}
