//! The flat persisted document: load/initialize/save plus the bounded
//! retention ledgers (items, per-source version history, observations).
//!
//! There is no database underneath. The whole document is rewritten once per
//! run; a corrupt document on disk is replaced with a fresh default, never
//! fatal. An unwritable store is fatal.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{
    AnalystNote, Entity, Item, Observation, RunSummary, Snapshot, SourceVersion,
};
use crate::normalize::now_iso;
use crate::roster::Roster;
use crate::signature::{item_id, stable_signature};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreMeta {
    pub created_at: String,
    pub run_count: u64,
    pub last_run_at: Option<String>,
    pub last_run_status: String,
    pub last_run_summary: Option<RunSummary>,
}

impl Default for StoreMeta {
    fn default() -> Self {
        Self {
            created_at: now_iso(),
            run_count: 0,
            last_run_at: None,
            last_run_status: "never".to_string(),
            last_run_summary: None,
        }
    }
}

/// The single persisted document. Field names match the original store.json
/// so existing documents load as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Store {
    pub meta: StoreMeta,
    pub competitors: Vec<Entity>,
    pub partners: Vec<Entity>,
    pub entities: Vec<Entity>,
    pub snapshots: BTreeMap<String, Snapshot>,
    pub snapshot_history: BTreeMap<String, Vec<SourceVersion>>,
    pub observations: Vec<Observation>,
    pub ai_notes_cache: BTreeMap<String, AnalystNote>,
    pub items: Vec<Item>,
}

impl Store {
    /// Overwrite the configuration arrays from the roster. Persisted copies
    /// are never trusted, so configuration changes take effect on next load.
    pub fn seed_roster(&mut self, roster: &Roster) {
        self.competitors = roster.competitors.clone();
        self.partners = roster.partners.clone();
        self.entities = roster.entities().cloned().collect();
    }

    /// Insert a confirmed item: rejected when under the confidence floor or
    /// when an existing item shares its signature. Successful insertion is
    /// newest-first, mirrors the item into the observation ledger, and
    /// enforces the items cap (oldest dropped).
    pub fn insert_item(
        &mut self,
        mut item: Item,
        min_confidence: f64,
        max_items: usize,
        max_observations: usize,
    ) -> bool {
        if item.confidence < min_confidence {
            return false;
        }

        let signature = stable_signature(&item);
        let exists = self.items.iter().any(|existing| {
            if existing.signature.is_empty() {
                stable_signature(existing) == signature
            } else {
                existing.signature == signature
            }
        });
        if exists {
            return false;
        }

        item.id = item_id(&signature, &item.event_at);
        item.signature = signature;
        self.record_observation(&item, max_observations);
        self.items.insert(0, item);
        if self.items.len() > max_items {
            self.items.truncate(max_items);
        }
        true
    }

    /// Append a source version to the per-URL history, gated on the digest
    /// differing from the most recent entry. Oldest entries are dropped past
    /// the cap.
    pub fn record_source_version(
        &mut self,
        source_url: &str,
        version: SourceVersion,
        max_history: usize,
    ) {
        let url = crate::normalize::normalize_url(source_url);
        if url.is_empty() {
            return;
        }
        let history = self.snapshot_history.entry(url).or_default();
        if let Some(last) = history.last() {
            if last.digest == version.digest {
                return;
            }
        }
        history.push(version);
        if history.len() > max_history {
            let excess = history.len() - max_history;
            history.drain(0..excess);
        }
    }

    fn record_observation(&mut self, item: &Item, max_observations: usize) {
        self.observations.insert(
            0,
            Observation {
                observed_at: now_iso(),
                entity: item.entity.clone(),
                entity_type: item.entity_type,
                channel: item.channel,
                source_type: item.source_type,
                announcement_type: item.announcement_type,
                confidence: item.confidence,
                event_at: item.event_at.clone(),
                url: item.url.clone(),
                title: item.title.clone(),
                signature: item.signature.clone(),
            },
        );
        if self.observations.len() > max_observations {
            self.observations.truncate(max_observations);
        }
    }
}

/// Load the persisted document, synthesizing (and writing back) a default
/// when absent. A present-but-unparseable document is replaced with a fresh
/// default. Configuration arrays are always re-seeded from the roster.
pub fn load_or_init(path: &Path, roster: &Roster) -> Result<Store> {
    if !path.exists() {
        let mut store = Store::default();
        store.seed_roster(roster);
        save(path, &store)?;
        return Ok(store);
    }

    let mut store = match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<Store>(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %path.display(),
                    "persisted store unparseable, replacing with a fresh document"
                );
                Store::default()
            }
        },
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "persisted store unreadable, replacing with a fresh document"
            );
            Store::default()
        }
    };
    store.seed_roster(roster);
    Ok(store)
}

/// Persist the whole document: parent directory created if absent, then one
/// atomic full rewrite via a temp file. Failure here is fatal to the run.
pub fn save(path: &Path, store: &Store) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating store directory {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(store).context("serializing store document")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("writing store temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("replacing store document {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::AnnouncementType;
    use crate::model::{Channel, EntityType, SourceType, ITEM_SCHEMA_VERSION};

    fn item(title: &str, confidence: f64) -> Item {
        Item {
            schema_version: ITEM_SCHEMA_VERSION,
            entity: "Toast".into(),
            entity_type: EntityType::Competitor,
            label: "POS".into(),
            channel: Channel::Rss,
            source_type: SourceType::Rss,
            url: format!("https://example.com/{}", title.replace(' ', "-")),
            title: title.into(),
            summary: String::new(),
            announcement_type: AnnouncementType::GeneralUpdate,
            announcement_classifier_confidence: 0.8,
            event_at: "2026-08-01T00:00:00.000Z".into(),
            confidence,
            confidence_reason: "test".into(),
            collected_at: "2026-08-01T00:00:00.000Z".into(),
            is_confirmed: true,
            signature: String::new(),
            id: String::new(),
            analyst_note: None,
        }
    }

    fn version(digest: &str) -> SourceVersion {
        SourceVersion {
            observed_at: now_iso(),
            entity: "Toast".into(),
            entity_type: EntityType::Competitor,
            channel: Channel::Web,
            source_type: SourceType::Web,
            digest: digest.into(),
            title: "t".into(),
            summary: "s".into(),
            event_at: "2026-08-01T00:00:00.000Z".into(),
            confidence: 0.86,
        }
    }

    #[test]
    fn insert_rejects_below_confidence_floor() {
        let mut store = Store::default();
        assert!(!store.insert_item(item("low", 0.5), 0.8, 100, 100));
        assert!(store.items.is_empty());
        assert!(store.observations.is_empty());
    }

    #[test]
    fn insert_rejects_duplicate_signature() {
        let mut store = Store::default();
        assert!(store.insert_item(item("dup", 0.9), 0.8, 100, 100));
        assert!(!store.insert_item(item("dup", 0.9), 0.8, 100, 100));
        assert_eq!(store.items.len(), 1);
        assert_eq!(store.observations.len(), 1);
    }

    #[test]
    fn insert_is_newest_first_and_capped() {
        let mut store = Store::default();
        for i in 0..5 {
            assert!(store.insert_item(item(&format!("item {i}"), 0.9), 0.8, 3, 100));
        }
        assert_eq!(store.items.len(), 3);
        assert_eq!(store.items[0].title, "item 4");
        // Observations keep their own cap independently.
        assert_eq!(store.observations.len(), 5);
    }

    #[test]
    fn inserted_items_carry_id_and_signature() {
        let mut store = Store::default();
        store.insert_item(item("ids", 0.9), 0.8, 100, 100);
        let stored = &store.items[0];
        assert!(!stored.signature.is_empty());
        assert_eq!(stored.id, item_id(&stored.signature, &stored.event_at));
    }

    #[test]
    fn history_appends_only_on_digest_change() {
        let mut store = Store::default();
        let url = "https://example.com/page";
        store.record_source_version(url, version("a"), 10);
        store.record_source_version(url, version("a"), 10);
        store.record_source_version(url, version("b"), 10);
        let history = &store.snapshot_history[&crate::normalize::normalize_url(url)];
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn history_drops_oldest_past_cap() {
        let mut store = Store::default();
        let url = "https://example.com/page";
        for i in 0..6 {
            store.record_source_version(url, version(&format!("d{i}")), 4);
        }
        let history = &store.snapshot_history[&crate::normalize::normalize_url(url)];
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].digest, "d2");
        assert_eq!(history[3].digest, "d5");
    }

    #[test]
    fn history_ignores_empty_urls() {
        let mut store = Store::default();
        store.record_source_version("", version("a"), 10);
        assert!(store.snapshot_history.is_empty());
    }
}
