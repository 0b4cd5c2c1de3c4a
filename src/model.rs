//! Core data model for the collection engine and the persisted document.
//!
//! Every persisted structure serializes with the original camelCase field
//! names so an existing `store.json` (and the dashboard reading it) keeps
//! working unchanged.

use serde::{Deserialize, Serialize};

use crate::classify::AnnouncementType;

/// Schema version stamped on every persisted item. The query layer treats
/// items carrying any other version as invisible.
pub const ITEM_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Competitor,
    Partner,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Competitor => "competitor",
            EntityType::Partner => "partner",
        }
    }

    /// Display label used on the dashboard feed.
    pub fn label(self) -> &'static str {
        match self {
            EntityType::Competitor => "POS",
            EntityType::Partner => "Partner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Rss,
    Web,
    Linkedin,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Rss => "rss",
            Channel::Web => "web",
            Channel::Linkedin => "linkedin",
        }
    }
}

/// Finer-grained origin tag than [`Channel`]; press items flow through the
/// `web` channel but keep their own source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    Rss,
    Web,
    LinkedinEmployee,
    LinkedinCompany,
    LinkedinCompanyPage,
    PressPublication,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Rss => "rss",
            SourceType::Web => "web",
            SourceType::LinkedinEmployee => "linkedin-employee",
            SourceType::LinkedinCompany => "linkedin-company",
            SourceType::LinkedinCompanyPage => "linkedin-company-page",
            SourceType::PressPublication => "press-publication",
        }
    }
}

/// One monitored organization. Immutable configuration; identity is `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    pub domain: String,
    pub entity_type: EntityType,
    #[serde(default)]
    pub rss: Vec<String>,
    #[serde(default)]
    pub web_pages: Vec<String>,
    #[serde(default)]
    pub linkedin_company_pages: Vec<String>,
}

/// Analyst annotation attached to a persisted item. Cached by signature;
/// cache entries are permanent once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalystNote {
    pub what_happened: String,
    pub why_it_matters: String,
    pub what_to_watch: String,
    /// `"rules"` or the external provider name.
    pub source: String,
    pub generated_at: String,
}

/// A confirmed update event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub schema_version: u32,
    pub entity: String,
    pub entity_type: EntityType,
    pub label: String,
    pub channel: Channel,
    pub source_type: SourceType,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub announcement_type: AnnouncementType,
    pub announcement_classifier_confidence: f64,
    pub event_at: String,
    /// Source-trust score; gates persistence. Distinct axis from the
    /// classifier confidence above.
    pub confidence: f64,
    pub confidence_reason: String,
    pub collected_at: String,
    pub is_confirmed: bool,
    /// Stable content hash, the dedup key. Filled at insertion time.
    #[serde(default)]
    pub signature: String,
    /// Hash of signature + event timestamp. Filled at insertion time.
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyst_note: Option<AnalystNote>,
}

/// One observed revision of a monitored source, appended to the per-URL
/// version history when its digest differs from the previous entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceVersion {
    pub observed_at: String,
    pub entity: String,
    pub entity_type: EntityType,
    pub channel: Channel,
    pub source_type: SourceType,
    pub digest: String,
    pub title: String,
    pub summary: String,
    pub event_at: String,
    pub confidence: f64,
}

/// Latest fingerprint per monitored URL; overwritten every run whether or
/// not an item was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub entity: String,
    pub entity_type: EntityType,
    pub digest: String,
    pub title: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub checked_at: String,
}

/// Lightweight audit record mirroring an inserted item, kept newest-first in
/// a capped ledger independent of the bounded items list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub observed_at: String,
    pub entity: String,
    pub entity_type: EntityType,
    pub channel: Channel,
    pub source_type: SourceType,
    pub announcement_type: AnnouncementType,
    pub confidence: f64,
    pub event_at: String,
    pub url: String,
    pub title: String,
    pub signature: String,
}

/// Per-channel outcome of a collection run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelReport {
    pub new_items: usize,
    pub errors: Vec<SourceError>,
}

/// A non-fatal per-source failure; the source is skipped, the channel
/// continues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceError {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    pub url: String,
    pub status: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiNotesReport {
    pub mode: String,
    pub used: u32,
    pub budget: u32,
}

/// Aggregate summary of one complete collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub duration_ms: u64,
    pub total_new_items: usize,
    pub rss: ChannelReport,
    pub web: ChannelReport,
    pub linkedin_rss: ChannelReport,
    pub linkedin_pages: ChannelReport,
    pub press: ChannelReport,
    pub ai_notes: AiNotesReport,
}
