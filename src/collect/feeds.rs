//! Feed-syndication collector: official RSS/Atom feeds configured per
//! entity. Highest-trust channel; every parsed entry is a candidate.

use crate::collect::{build_item, push_fetch_error, ChannelBatch, CollectionEngine, ItemSpec};
use crate::model::{Channel, SourceType, SourceVersion};
use crate::normalize::{coerce_iso_date, now_iso, truncate_chars};
use crate::signature::sha256_hex;
use crate::syndication::parse_feed_entries;

/// Entries considered per feed document.
const MAX_ENTRIES_PER_FEED: usize = 30;

pub(crate) async fn collect(engine: &CollectionEngine) -> ChannelBatch {
    let mut batch = ChannelBatch::default();

    for entity in engine.roster.entities() {
        for feed_url in &entity.rss {
            let response = engine.fetcher.fetch(feed_url).await;
            if !response.ok {
                push_fetch_error(
                    &mut batch,
                    "rss",
                    Some(&entity.name),
                    feed_url,
                    response.status,
                );
                continue;
            }

            let entries = parse_feed_entries(&response.text);
            for entry in entries.into_iter().take(MAX_ENTRIES_PER_FEED) {
                if entry.link.is_empty() || entry.title.is_empty() {
                    continue;
                }

                let now = now_iso();
                let published = entry.published.as_deref().unwrap_or("");
                let item = build_item(ItemSpec {
                    entity,
                    channel: Channel::Rss,
                    source_type: SourceType::Rss,
                    url: &entry.link,
                    title: &entry.title,
                    summary: &entry.summary,
                    event_at: published,
                    confidence: 0.95,
                    confidence_reason: "Official RSS publication",
                });
                batch.versions.push((
                    entry.link.clone(),
                    SourceVersion {
                        observed_at: now.clone(),
                        entity: entity.name.clone(),
                        entity_type: entity.entity_type,
                        channel: Channel::Rss,
                        source_type: SourceType::Rss,
                        digest: sha256_hex(&format!("{}|{}", entry.title, entry.summary)),
                        title: entry.title.clone(),
                        summary: truncate_chars(&entry.summary, 900),
                        event_at: coerce_iso_date(published, &now),
                        confidence: 0.95,
                    },
                ));
                batch.candidates.push(item);
            }
        }
    }

    batch
}
