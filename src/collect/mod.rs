//! The collection engine: five channel collectors fanned out concurrently,
//! their batches merged into the shared store by a single owning pass, one
//! persistence write per run.
//!
//! Collectors never mutate the store directly. Each one borrows the loaded
//! document read-only (the diffing channels need the previous snapshots) and
//! returns a [`ChannelBatch`]; the merge applies batches in a fixed order so
//! dedup and note-budget behavior is deterministic.

pub mod feeds;
pub mod linkedin;
pub mod press;
pub mod web;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::annotate::{
    attach_analyst_note, DisabledNotes, NoteBudget, NoteGenerator, OpenAiNotes,
};
use crate::classify::classify_announcement;
use crate::config::{AiNotesMode, Config};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::model::{
    AiNotesReport, Channel, ChannelReport, Entity, Item, RunSummary, Snapshot, SourceError,
    SourceType, SourceVersion, ITEM_SCHEMA_VERSION,
};
use crate::normalize::{coerce_iso_date, normalize_url, now_iso};
use crate::roster::Roster;
use crate::store::{self, Store};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("collect_runs_total", "Completed collection runs.");
        describe_counter!(
            "collect_fetch_errors_total",
            "Per-source fetch failures across all channels."
        );
        describe_counter!(
            "collect_items_inserted_total",
            "New confirmed items inserted into the store."
        );
        describe_gauge!(
            "collect_last_run_ts",
            "Unix ts when the last collection run finished."
        );
    });
}

/// Everything a channel collector produced, to be merged by the owning task.
#[derive(Debug, Default)]
pub struct ChannelBatch {
    /// Latest snapshot per URL; overwrites unconditionally.
    pub snapshots: Vec<(String, Snapshot)>,
    /// Version-history appends, digest-gated at merge time.
    pub versions: Vec<(String, SourceVersion)>,
    /// Candidate items in discovery order; annotated then gate-checked at
    /// merge time.
    pub candidates: Vec<Item>,
    pub errors: Vec<SourceError>,
}

/// Named parameters for building a candidate item.
pub(crate) struct ItemSpec<'a> {
    pub entity: &'a Entity,
    pub channel: Channel,
    pub source_type: SourceType,
    pub url: &'a str,
    pub title: &'a str,
    pub summary: &'a str,
    /// Raw source-supplied event date; coerced with "now" fallback.
    pub event_at: &'a str,
    pub confidence: f64,
    pub confidence_reason: &'a str,
}

pub(crate) fn build_item(spec: ItemSpec<'_>) -> Item {
    let normalized_url = normalize_url(spec.url);
    let collected_at = now_iso();
    let event_at = coerce_iso_date(spec.event_at, &collected_at);
    let classification = classify_announcement(
        spec.title,
        spec.summary,
        spec.source_type.as_str(),
        &normalized_url,
    );
    Item {
        schema_version: ITEM_SCHEMA_VERSION,
        entity: spec.entity.name.clone(),
        entity_type: spec.entity.entity_type,
        label: spec.entity.entity_type.label().to_string(),
        channel: spec.channel,
        source_type: spec.source_type,
        url: normalized_url,
        title: if spec.title.is_empty() {
            "Untitled".to_string()
        } else {
            spec.title.to_string()
        },
        summary: spec.summary.to_string(),
        announcement_type: classification.announcement_type,
        announcement_classifier_confidence: classification.confidence,
        event_at,
        confidence: spec.confidence,
        confidence_reason: spec.confidence_reason.to_string(),
        collected_at,
        is_confirmed: true,
        signature: String::new(),
        id: String::new(),
        analyst_note: None,
    }
}

pub struct CollectionEngine {
    pub(crate) config: Config,
    pub(crate) roster: Roster,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) notes: Arc<dyn NoteGenerator>,
}

impl CollectionEngine {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config.fetch_timeout)?);
        let notes: Arc<dyn NoteGenerator> =
            if config.ai_notes_mode == AiNotesMode::OpenAi && !config.openai_api_key.is_empty() {
                Arc::new(OpenAiNotes::new(
                    config.openai_api_key.clone(),
                    config.openai_model.clone(),
                )?)
            } else {
                Arc::new(DisabledNotes)
            };
        Ok(Self {
            config,
            roster: Roster::builtin(),
            fetcher,
            notes,
        })
    }

    /// Fully injected constructor for tests and alternative wiring.
    pub fn with_parts(
        config: Config,
        roster: Roster,
        fetcher: Arc<dyn Fetcher>,
        notes: Arc<dyn NoteGenerator>,
    ) -> Self {
        Self {
            config,
            roster,
            fetcher,
            notes,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read the current persisted document, synthesizing defaults when the
    /// backing file is missing or corrupt.
    pub fn load_store(&self) -> Result<Store> {
        store::load_or_init(&self.config.data_file, &self.roster)
    }

    /// One complete run: load, collect all five channels concurrently, merge
    /// in fixed order, stamp run metadata, persist once. Per-source failures
    /// are summary data; only an unwritable store is an error.
    pub async fn run_collection(&self) -> Result<RunSummary> {
        ensure_metrics_described();
        let started = Instant::now();

        let mut store = self.load_store()?;
        let mut budget = NoteBudget::new(self.config.max_ai_notes_per_run);

        let (rss_batch, web_batch, linkedin_rss_batch, linkedin_pages_batch, press_batch) = tokio::join!(
            feeds::collect(self),
            web::collect(self, &store),
            linkedin::collect_search(self),
            linkedin::collect_pages(self, &store),
            press::collect_search(self),
        );

        let rss = self.apply_batch(&mut store, rss_batch, &mut budget).await;
        let web = self.apply_batch(&mut store, web_batch, &mut budget).await;
        let linkedin_rss = self
            .apply_batch(&mut store, linkedin_rss_batch, &mut budget)
            .await;
        let linkedin_pages = self
            .apply_batch(&mut store, linkedin_pages_batch, &mut budget)
            .await;
        let press = self.apply_batch(&mut store, press_batch, &mut budget).await;

        let total_new_items = rss.new_items
            + web.new_items
            + linkedin_rss.new_items
            + linkedin_pages.new_items
            + press.new_items;
        let summary = RunSummary {
            duration_ms: started.elapsed().as_millis() as u64,
            total_new_items,
            rss,
            web,
            linkedin_rss,
            linkedin_pages,
            press,
            ai_notes: AiNotesReport {
                mode: self.config.ai_notes_mode.as_str().to_string(),
                used: budget.used,
                budget: budget.budget,
            },
        };

        store.meta.run_count += 1;
        store.meta.last_run_at = Some(now_iso());
        store.meta.last_run_status = "ok".to_string();
        store.meta.last_run_summary = Some(summary.clone());
        store::save(&self.config.data_file, &store)?;

        counter!("collect_runs_total").increment(1);
        gauge!("collect_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        tracing::info!(
            total_new_items,
            duration_ms = summary.duration_ms,
            ai_notes_used = summary.ai_notes.used,
            "collection run complete"
        );

        Ok(summary)
    }

    /// Merge one channel's batch: snapshots overwrite, versions append under
    /// the digest gate, candidates get annotated and then face the
    /// confidence/dedup gates.
    async fn apply_batch(
        &self,
        store: &mut Store,
        batch: ChannelBatch,
        budget: &mut NoteBudget,
    ) -> ChannelReport {
        for (url, snapshot) in batch.snapshots {
            store.snapshots.insert(url, snapshot);
        }
        for (url, version) in batch.versions {
            store.record_source_version(&url, version, self.config.max_history_per_source);
        }

        let mut new_items = 0;
        for mut item in batch.candidates {
            // Annotation runs before the confidence gate: a candidate can
            // spend budget and still be rejected below.
            attach_analyst_note(
                store,
                &mut item,
                self.notes.as_ref(),
                self.config.ai_notes_mode,
                budget,
            )
            .await;
            if store.insert_item(
                item,
                self.config.min_confidence,
                self.config.max_items,
                self.config.max_observations,
            ) {
                new_items += 1;
                counter!("collect_items_inserted_total").increment(1);
            }
        }

        ChannelReport {
            new_items,
            errors: batch.errors,
        }
    }
}

pub(crate) fn push_fetch_error(
    batch: &mut ChannelBatch,
    kind: &str,
    entity: Option<&str>,
    url: &str,
    status: u16,
) {
    tracing::warn!(kind, entity = entity.unwrap_or("-"), url, status, "source fetch failed");
    counter!("collect_fetch_errors_total").increment(1);
    batch.errors.push(SourceError {
        kind: kind.to_string(),
        entity: entity.map(str::to_string),
        url: url.to_string(),
        status,
    });
}
