//! Web-page diffing collector: fingerprint every monitored page, refresh its
//! snapshot, and raise an item only when the fingerprint (or the page's own
//! "last updated" marker) moved since the previous run. A first sighting is
//! a baseline capture, never an item.

use crate::collect::{build_item, push_fetch_error, ChannelBatch, CollectionEngine, ItemSpec};
use crate::fingerprint::page_fingerprint;
use crate::model::{Channel, Snapshot, SourceType, SourceVersion};
use crate::normalize::{coerce_iso_date, normalize_url, now_iso, truncate_chars};
use crate::store::Store;

pub(crate) async fn collect(engine: &CollectionEngine, store: &Store) -> ChannelBatch {
    let mut batch = ChannelBatch::default();

    for entity in engine.roster.entities() {
        for page_url in &entity.web_pages {
            let normalized = normalize_url(page_url);
            let response = engine.fetcher.fetch(&normalized).await;
            if !response.ok {
                push_fetch_error(
                    &mut batch,
                    "web",
                    Some(&entity.name),
                    &normalized,
                    response.status,
                );
                continue;
            }

            let fp = page_fingerprint(&response.text);
            let prev = store.snapshots.get(&normalized);
            let now = now_iso();

            batch.snapshots.push((
                normalized.clone(),
                Snapshot {
                    entity: entity.name.clone(),
                    entity_type: entity.entity_type,
                    digest: fp.digest.clone(),
                    title: fp.title.clone(),
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
                    channel: Channel::Web,
                    source_type: SourceType::Web,
                    digest: fp.digest.clone(),
                    title: fp.title.clone(),
                    summary: truncate_chars(&fp.body, 900),
                    event_at: coerce_iso_date(fp.updated_at.as_deref().unwrap_or(""), &now),
                    confidence: 0.86,
                },
            ));

            let Some(prev) = prev else {
                // Baseline capture only.
                continue;
            };
            let marker_moved = fp.updated_at.is_some() && prev.updated_at != fp.updated_at;
            if prev.digest == fp.digest && !marker_moved {
                continue;
            }

            let title = if fp.title.is_empty() {
                format!("{} page updated", entity.name)
            } else {
                fp.title.clone()
            };
            let summary = match &fp.updated_at {
                Some(updated) => format!(
                    "Verified page change detected on monitored web source (updated {updated})."
                ),
                None => "Verified page change detected on monitored web source.".to_string(),
            };
            let event_at = fp.updated_at.clone().unwrap_or_default();
            batch.candidates.push(build_item(ItemSpec {
                entity,
                channel: Channel::Web,
                source_type: SourceType::Web,
                url: &normalized,
                title: &title,
                summary: &summary,
                event_at: &event_at,
                confidence: 0.86,
                confidence_reason: "Content fingerprint changed on monitored page",
            }));
        }
    }

    batch
}
