//! Analyst-note attachment: budgeted, cached generation of a three-field
//! note per item, with a deterministic rules-based fallback.
//!
//! Notes are cached by item signature and never regenerated; the signature
//! already encodes the title/summary, so a changed item is a new cache key.

use async_trait::async_trait;

use crate::classify::AnnouncementType;
use crate::config::AiNotesMode;
use crate::model::{AnalystNote, EntityType, Item};
use crate::normalize::{extract_loose_json, now_iso};
use crate::signature::stable_signature;
use crate::store::Store;

/// The three required fields of a generated note, before sourcing metadata
/// is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub what_happened: String,
    pub why_it_matters: String,
    pub what_to_watch: String,
}

impl NoteDraft {
    fn into_note(self, source: &str) -> AnalystNote {
        AnalystNote {
            what_happened: self.what_happened,
            why_it_matters: self.why_it_matters,
            what_to_watch: self.what_to_watch,
            source: source.to_string(),
            generated_at: now_iso(),
        }
    }
}

/// External annotation capability. `generate` returns `None` on any failure
/// (transport, HTTP, malformed reply, missing field); the caller falls back
/// to the rules note.
#[async_trait]
pub trait NoteGenerator: Send + Sync {
    async fn generate(&self, item: &Item) -> Option<NoteDraft>;
    /// Provider name recorded as the note source.
    fn name(&self) -> &'static str;
    /// Whether the capability is usable at all; an unavailable generator is
    /// never called and never charged against the budget.
    fn available(&self) -> bool {
        true
    }
}

/// Used when no credential is configured.
pub struct DisabledNotes;

#[async_trait]
impl NoteGenerator for DisabledNotes {
    async fn generate(&self, _item: &Item) -> Option<NoteDraft> {
        None
    }

    fn name(&self) -> &'static str {
        "disabled"
    }

    fn available(&self) -> bool {
        false
    }
}

/// Deterministic generator for tests: replies with a fixed draft, or `None`
/// to exercise the failure path.
pub struct StubNotes {
    pub reply: Option<NoteDraft>,
}

#[async_trait]
impl NoteGenerator for StubNotes {
    async fn generate(&self, _item: &Item) -> Option<NoteDraft> {
        self.reply.clone()
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Per-run annotation budget. One unit is consumed per attempted external
/// call, success or not.
#[derive(Debug, Clone, Copy)]
pub struct NoteBudget {
    pub budget: u32,
    pub used: u32,
}

impl NoteBudget {
    pub fn new(budget: u32) -> Self {
        Self { budget, used: 0 }
    }

    pub fn has_remaining(&self) -> bool {
        self.used < self.budget
    }

    pub fn spend(&mut self) {
        self.used += 1;
    }
}

/// Deterministic fallback note built from fixed per-category templates.
pub fn rules_note(item: &Item) -> AnalystNote {
    let entity = &item.entity;
    let what_happened = match item.announcement_type {
        AnnouncementType::PartnershipAgreement => {
            format!("{entity} appears to have a partnership/integration development.")
        }
        AnnouncementType::ProductAnnouncement => {
            format!("{entity} appears to have a product or feature announcement.")
        }
        AnnouncementType::BusinessAnnouncement => {
            format!("{entity} appears to have a business/corporate announcement.")
        }
        AnnouncementType::PricingUpdate => {
            format!("{entity} appears to have a pricing or packaging update.")
        }
        AnnouncementType::LeadershipHiring => {
            format!("{entity} appears to have a leadership or hiring update.")
        }
        AnnouncementType::PressCoverage => {
            format!("{entity} received press/publication coverage for a notable update.")
        }
        AnnouncementType::GeneralUpdate => {
            format!("{entity} has a confirmed update from a monitored source.")
        }
    };

    let why_it_matters = match item.entity_type {
        EntityType::Competitor => {
            "This may affect competitive positioning, product parity, or go-to-market pressure."
        }
        EntityType::Partner => {
            "This may affect ecosystem leverage, integration value, or partner-driven distribution."
        }
    };

    AnalystNote {
        what_happened,
        why_it_matters: why_it_matters.to_string(),
        what_to_watch:
            "Watch for follow-on announcements, customer references, pricing movement, and integration depth."
                .to_string(),
        source: "rules".to_string(),
        generated_at: now_iso(),
    }
}

/// Attach a note to a candidate item: cache hit first, then (mode and budget
/// permitting) the external generator, else the rules fallback. The result
/// is cached permanently under the item signature.
pub async fn attach_analyst_note(
    store: &mut Store,
    item: &mut Item,
    generator: &dyn NoteGenerator,
    mode: AiNotesMode,
    budget: &mut NoteBudget,
) {
    let key = stable_signature(item);
    if let Some(cached) = store.ai_notes_cache.get(&key) {
        item.analyst_note = Some(cached.clone());
        return;
    }

    let mut note = rules_note(item);
    if mode == AiNotesMode::OpenAi && generator.available() && budget.has_remaining() {
        let generated = generator.generate(item).await;
        budget.spend();
        if let Some(draft) = generated {
            note = draft.into_note(generator.name());
        }
    }

    item.analyst_note = Some(note.clone());
    store.ai_notes_cache.insert(key, note);
}

/// OpenAI-backed note generator speaking the responses API with a strict
/// three-key JSON reply contract.
pub struct OpenAiNotes {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiNotes {
    pub fn new(api_key: String, model: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("pos-intel-monitor/{}", env!("CARGO_PKG_VERSION")))
            .connect_timeout(std::time::Duration::from_secs(4))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    fn prompt(item: &Item) -> String {
        [
            "You are an executive market analyst.".to_string(),
            "Return strict JSON with keys: whatHappened, whyItMatters, whatToWatch.".to_string(),
            "Each value must be one concise sentence (max 24 words).".to_string(),
            "Do not use markdown.".to_string(),
            format!("Entity: {}", item.entity),
            format!("EntityType: {}", item.entity_type.as_str()),
            format!("Channel: {}", item.channel.as_str()),
            format!("SourceType: {}", item.source_type.as_str()),
            format!("AnnouncementType: {}", item.announcement_type.as_str()),
            format!("Title: {}", item.title),
            format!("Summary: {}", item.summary),
            format!("URL: {}", item.url),
            format!("Confidence: {}%", (item.confidence * 100.0).round() as i64),
        ]
        .join("\n")
    }
}

#[derive(serde::Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    reasoning: ResponsesReasoning<'a>,
    input: &'a str,
}

#[derive(serde::Serialize)]
struct ResponsesReasoning<'a> {
    effort: &'a str,
}

#[derive(serde::Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<ResponsesOutput>,
}

#[derive(serde::Deserialize)]
struct ResponsesOutput {
    #[serde(default)]
    content: Vec<ResponsesContent>,
}

#[derive(serde::Deserialize)]
struct ResponsesContent {
    #[serde(default)]
    text: Option<String>,
}

fn extract_reply_text(reply: &ResponsesReply) -> String {
    if let Some(text) = reply
        .output_text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        return text.to_string();
    }
    let parts: Vec<&str> = reply
        .output
        .iter()
        .flat_map(|output| output.content.iter())
        .filter_map(|content| content.text.as_deref())
        .collect();
    parts.join("\n").trim().to_string()
}

fn draft_from_reply(raw: &str) -> Option<NoteDraft> {
    let value = extract_loose_json(raw)?;
    let field = |key: &str| -> Option<String> {
        let text = value.get(key)?.as_str()?.trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    };
    Some(NoteDraft {
        what_happened: field("whatHappened")?,
        why_it_matters: field("whyItMatters")?,
        what_to_watch: field("whatToWatch")?,
    })
}

#[async_trait]
impl NoteGenerator for OpenAiNotes {
    async fn generate(&self, item: &Item) -> Option<NoteDraft> {
        let prompt = Self::prompt(item);
        let request = ResponsesRequest {
            model: &self.model,
            reasoning: ResponsesReasoning { effort: "medium" },
            input: &prompt,
        };

        let response = self
            .http
            .post("https://api.openai.com/v1/responses")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "annotation call rejected");
            return None;
        }

        let reply: ResponsesReply = response.json().await.ok()?;
        draft_from_reply(&extract_reply_text(&reply))
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn available(&self) -> bool {
        !self.api_key.is_empty()
    }
}
