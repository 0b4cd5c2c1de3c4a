//! Read-side payload building for the dashboard API: item filtering,
//! view-level dedup, legacy-name canonicalization, and the feed/meta/history
//! payload shapes.

use serde::{Deserialize, Serialize};

use crate::classify::AnnouncementType;
use crate::config::Config;
use crate::model::{Item, SourceVersion, ITEM_SCHEMA_VERSION};
use crate::normalize::{now_iso, parse_iso_date};
use crate::store::{Store, StoreMeta};

/// Legacy entity-name aliases, consulted when expanding query filters and
/// when rendering output. Left side is the historical name still present in
/// older stored items.
pub const LEGACY_ENTITY_ALIASES: &[(&str, &str)] = &[("Popmen", "Popmenu")];

/// Canonical display name for an entity, resolving legacy aliases.
pub fn canonical_entity_name(name: &str) -> &str {
    for (legacy, canonical) in LEGACY_ENTITY_ALIASES {
        if name == *legacy {
            return canonical;
        }
    }
    name
}

/// All stored names a canonical entity may appear under (itself plus any
/// legacy aliases pointing at it).
pub fn legacy_entity_names(name: &str) -> Vec<&str> {
    let mut names = vec![name];
    for (legacy, canonical) in LEGACY_ENTITY_ALIASES {
        if name == *canonical {
            names.push(legacy);
        }
    }
    names
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedQuery {
    pub group: Option<String>,
    pub entity: Option<String>,
    pub channel: Option<String>,
    pub announcement: Option<String>,
    pub strategic_only: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

fn filter_is_set(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty() && *v != "all")
}

/// Apply the full filter chain to the stored items. Only schema-current,
/// confirmed items at or above the confidence floor are ever visible.
pub fn filter_items(store: &Store, query: &FeedQuery, min_confidence: f64) -> Vec<Item> {
    let start = query.start.as_deref().and_then(parse_iso_date);
    let end = query.end.as_deref().and_then(parse_iso_date).map(|end| {
        // End date is inclusive through end-of-day.
        end + chrono::Duration::milliseconds(24 * 60 * 60 * 1000 - 1)
    });

    store
        .items
        .iter()
        .filter(|item| {
            if item.schema_version != ITEM_SCHEMA_VERSION {
                return false;
            }
            if !item.is_confirmed {
                return false;
            }
            if item.confidence < min_confidence {
                return false;
            }

            let ts = parse_iso_date(&item.event_at).or_else(|| parse_iso_date(&item.collected_at));
            let Some(ts) = ts else {
                return false;
            };
            if let Some(start) = start {
                if ts < start {
                    return false;
                }
            }
            if let Some(end) = end {
                if ts > end {
                    return false;
                }
            }

            if let Some(group) = filter_is_set(&query.group) {
                if item.entity_type.as_str() != group {
                    return false;
                }
            }
            if let Some(entity) = filter_is_set(&query.entity) {
                if !legacy_entity_names(entity).contains(&item.entity.as_str()) {
                    return false;
                }
            }
            if let Some(channel) = filter_is_set(&query.channel) {
                if item.channel.as_str() != channel {
                    return false;
                }
            }
            if let Some(announcement) = filter_is_set(&query.announcement) {
                if item.announcement_type.as_str() != announcement {
                    return false;
                }
            }
            if query.strategic_only.as_deref() == Some("true")
                && !item.announcement_type.is_strategic()
            {
                return false;
            }

            if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
                let blob =
                    format!("{} {} {}", item.title, item.summary, item.entity).to_lowercase();
                if !blob.contains(&search.to_lowercase()) {
                    return false;
                }
            }

            true
        })
        .cloned()
        .collect()
}

/// Collapse the filtered view by signature so the same confirmed update is
/// never listed twice.
fn dedupe_view(items: Vec<Item>) -> Vec<Item> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let key = if item.signature.is_empty() {
                format!(
                    "{}|{}|{}|{}|{}",
                    item.entity,
                    item.channel.as_str(),
                    item.title,
                    item.url,
                    item.event_at
                )
            } else {
                item.signature.clone()
            };
            seen.insert(key)
        })
        .collect()
}

fn sort_newest_first(items: &mut [Item]) {
    items.sort_by_key(|item| {
        std::cmp::Reverse(
            parse_iso_date(&item.event_at)
                .map(|ts| ts.timestamp_millis())
                .unwrap_or(0),
        )
    });
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    pub group: String,
    pub entity: String,
    pub channel: String,
    pub announcement: String,
    pub strategic_only: String,
    pub start: String,
    pub end: String,
    pub search: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedCounts {
    pub filtered: usize,
    pub competitor: usize,
    pub partner: usize,
    pub rss: usize,
    pub web: usize,
    pub linkedin: usize,
    pub strategic: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPayload {
    pub ok: bool,
    pub generated_at: String,
    pub applied_filters: AppliedFilters,
    pub min_confidence: f64,
    pub meta: StoreMeta,
    pub groups: Vec<&'static str>,
    pub announcements: Vec<&'static str>,
    pub entities: Vec<String>,
    pub counts: FeedCounts,
    pub items: Vec<Item>,
}

const DEFAULT_FEED_LIMIT: usize = 500;

pub fn build_feed_payload(store: &Store, query: &FeedQuery, min_confidence: f64) -> FeedPayload {
    let mut filtered = filter_items(store, query, min_confidence);
    sort_newest_first(&mut filtered);
    let mut filtered = dedupe_view(filtered);
    for item in &mut filtered {
        item.entity = canonical_entity_name(&item.entity).to_string();
    }

    let entities: Vec<String> = {
        let mut names: Vec<String> = store
            .entities
            .iter()
            .filter(|entity| match filter_is_set(&query.group) {
                Some(group) => entity.entity_type.as_str() == group,
                None => true,
            })
            .map(|entity| canonical_entity_name(&entity.name).to_string())
            .collect();
        names.sort();
        names
    };

    let counts = FeedCounts {
        filtered: filtered.len(),
        competitor: filtered
            .iter()
            .filter(|i| i.entity_type.as_str() == "competitor")
            .count(),
        partner: filtered
            .iter()
            .filter(|i| i.entity_type.as_str() == "partner")
            .count(),
        rss: filtered.iter().filter(|i| i.channel.as_str() == "rss").count(),
        web: filtered.iter().filter(|i| i.channel.as_str() == "web").count(),
        linkedin: filtered
            .iter()
            .filter(|i| i.channel.as_str() == "linkedin")
            .count(),
        strategic: filtered
            .iter()
            .filter(|i| i.announcement_type.is_strategic())
            .count(),
    };

    let limit = query.limit.unwrap_or(DEFAULT_FEED_LIMIT);
    let items = filtered.into_iter().take(limit).collect();

    FeedPayload {
        ok: true,
        generated_at: now_iso(),
        applied_filters: AppliedFilters {
            group: query.group.clone().unwrap_or_else(|| "all".into()),
            entity: query.entity.clone().unwrap_or_else(|| "all".into()),
            channel: query.channel.clone().unwrap_or_else(|| "all".into()),
            announcement: query.announcement.clone().unwrap_or_else(|| "all".into()),
            strategic_only: query.strategic_only.clone().unwrap_or_else(|| "false".into()),
            start: query.start.clone().unwrap_or_default(),
            end: query.end.clone().unwrap_or_default(),
            search: query.search.clone().unwrap_or_default(),
        },
        min_confidence,
        meta: store.meta.clone(),
        groups: vec!["competitor", "partner"],
        announcements: AnnouncementType::ALL.iter().map(|a| a.as_str()).collect(),
        entities,
        counts,
        items,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityOptions {
    pub competitor: Vec<String>,
    pub partner: Vec<String>,
    pub all: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTotals {
    pub items: usize,
    pub competitors: usize,
    pub partners: usize,
    pub history_sources: usize,
    pub observations: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaPayload {
    pub ok: bool,
    pub data_file: String,
    pub refresh_hours: u64,
    pub min_confidence: f64,
    pub meta: StoreMeta,
    pub entity_options: EntityOptions,
    pub totals: MetaTotals,
}

pub fn build_meta_payload(store: &Store, config: &Config) -> MetaPayload {
    let names = |entities: &[crate::model::Entity]| -> Vec<String> {
        let mut out: Vec<String> = entities
            .iter()
            .map(|entity| canonical_entity_name(&entity.name).to_string())
            .collect();
        out.sort();
        out
    };

    MetaPayload {
        ok: true,
        data_file: config.data_file.display().to_string(),
        refresh_hours: config.refresh_hours,
        min_confidence: config.min_confidence,
        meta: store.meta.clone(),
        entity_options: EntityOptions {
            competitor: names(&store.competitors),
            partner: names(&store.partners),
            all: names(&store.entities),
        },
        totals: MetaTotals {
            items: store.items.len(),
            competitors: store.competitors.len(),
            partners: store.partners.len(),
            history_sources: store.snapshot_history.len(),
            observations: store.observations.len(),
        },
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryQuery {
    pub entity: Option<String>,
    pub channel: Option<String>,
    pub url: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryRow {
    pub url: String,
    #[serde(flatten)]
    pub version: SourceVersion,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPayload {
    pub ok: bool,
    pub total: usize,
    pub items: Vec<HistoryRow>,
}

const DEFAULT_HISTORY_LIMIT: usize = 300;

pub fn build_history_payload(store: &Store, query: &HistoryQuery) -> HistoryPayload {
    let mut rows: Vec<HistoryRow> = store
        .snapshot_history
        .iter()
        .flat_map(|(url, versions)| {
            versions.iter().map(move |version| HistoryRow {
                url: url.clone(),
                version: version.clone(),
            })
        })
        .filter(|row| {
            if let Some(entity) = filter_is_set(&query.entity) {
                if row.version.entity != entity {
                    return false;
                }
            }
            if let Some(channel) = filter_is_set(&query.channel) {
                if row.version.channel.as_str() != channel {
                    return false;
                }
            }
            if let Some(url) = query.url.as_deref().filter(|u| !u.is_empty()) {
                if row.url != url {
                    return false;
                }
            }
            true
        })
        .collect();

    rows.sort_by_key(|row| {
        std::cmp::Reverse(
            parse_iso_date(&row.version.observed_at)
                .map(|ts| ts.timestamp_millis())
                .unwrap_or(0),
        )
    });

    let total = rows.len();
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    HistoryPayload {
        ok: true,
        total,
        items: rows.into_iter().take(limit).collect(),
    }
}
