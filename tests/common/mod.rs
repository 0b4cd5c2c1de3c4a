//! Shared test harness: an in-memory stub fetcher and engine builders
//! backed by a temp-dir store.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use pos_intel_monitor::annotate::{DisabledNotes, NoteGenerator};
use pos_intel_monitor::collect::CollectionEngine;
use pos_intel_monitor::config::Config;
use pos_intel_monitor::fetch::{FetchResponse, Fetcher};
use pos_intel_monitor::model::{Entity, EntityType};
use pos_intel_monitor::roster::Roster;

/// Serves canned bodies by exact URL; everything else is a 404.
#[derive(Default)]
pub struct StubFetcher {
    pages: Mutex<HashMap<String, String>>,
}

impl StubFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, url: &str, body: &str) {
        self.pages
            .lock()
            .expect("stub fetcher lock")
            .insert(url.to_string(), body.to_string());
    }

    pub fn clear(&self, url: &str) {
        self.pages.lock().expect("stub fetcher lock").remove(url);
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> FetchResponse {
        match self.pages.lock().expect("stub fetcher lock").get(url) {
            Some(body) => FetchResponse::success(body.clone()),
            None => FetchResponse::failure(404),
        }
    }
}

pub fn entity(
    name: &str,
    entity_type: EntityType,
    rss: &[&str],
    web_pages: &[&str],
    linkedin_company_pages: &[&str],
) -> Entity {
    Entity {
        name: name.to_string(),
        domain: format!("{}.example.com", name.to_lowercase().replace(' ', "-")),
        entity_type,
        rss: rss.iter().map(|s| s.to_string()).collect(),
        web_pages: web_pages.iter().map(|s| s.to_string()).collect(),
        linkedin_company_pages: linkedin_company_pages
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

/// Engine over a temp store with rules-mode annotation. Keep the TempDir
/// alive for the duration of the test.
pub fn engine_with(roster: Roster, fetcher: Arc<StubFetcher>) -> (TempDir, CollectionEngine) {
    engine_with_notes(roster, fetcher, Config::default(), Arc::new(DisabledNotes))
}

pub fn engine_with_notes(
    roster: Roster,
    fetcher: Arc<StubFetcher>,
    mut config: Config,
    notes: Arc<dyn NoteGenerator>,
) -> (TempDir, CollectionEngine) {
    let dir = tempfile::tempdir().expect("temp store dir");
    config.data_file = dir.path().join("store.json");
    let engine = CollectionEngine::with_parts(config, roster, fetcher, notes);
    (dir, engine)
}
