//! Feed-syndication channel: item construction, idempotent re-runs, and
//! per-source error containment.

mod common;

use common::{engine_with, entity, StubFetcher};
use pos_intel_monitor::model::{Channel, EntityType, SourceType};
use pos_intel_monitor::roster::Roster;

const FEED_URL: &str = "https://toast.example.com/blog/rss.xml";

const FEED_XML: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Toast Blog</title>
  <item>
    <title>Toast launches new kitchen display system</title>
    <link>https://toast.example.com/blog/kds?utm_source=rss</link>
    <description>Faster ticket times for busy kitchens.</description>
    <pubDate>Mon, 03 Aug 2026 09:00:00 GMT</pubDate>
  </item>
  <item>
    <title>No link here</title>
    <description>Skipped because it has no link.</description>
  </item>
</channel></rss>"#;

fn toast_roster() -> Roster {
    Roster::with_entities(
        vec![entity("Toast", EntityType::Competitor, &[FEED_URL], &[], &[])],
        vec![],
    )
}

#[tokio::test]
async fn feed_entry_becomes_a_confirmed_item() {
    let fetcher = StubFetcher::new();
    fetcher.set(FEED_URL, FEED_XML);
    let (_dir, engine) = engine_with(toast_roster(), fetcher);

    let summary = engine.run_collection().await.expect("run");
    assert_eq!(summary.rss.new_items, 1);
    assert_eq!(summary.total_new_items, 1);
    assert!(summary.rss.errors.is_empty());

    let store = engine.load_store().expect("store");
    assert_eq!(store.items.len(), 1);
    let item = &store.items[0];
    assert_eq!(item.channel, Channel::Rss);
    assert_eq!(item.source_type, SourceType::Rss);
    assert_eq!(item.announcement_type.as_str(), "product_announcement");
    assert_eq!(item.confidence, 0.95);
    assert_eq!(item.url, "https://toast.example.com/blog/kds");
    assert_eq!(item.event_at, "2026-08-03T09:00:00.000Z");
    assert!(item.is_confirmed);
    assert!(!item.signature.is_empty());
    assert!(!item.id.is_empty());

    // Every item also receives a note, rules-sourced by default.
    let note = item.analyst_note.as_ref().expect("note attached");
    assert_eq!(note.source, "rules");

    // The entry was recorded in the version history and the audit ledger.
    assert!(store
        .snapshot_history
        .contains_key("https://toast.example.com/blog/kds"));
    assert_eq!(store.observations.len(), 1);
    assert_eq!(store.observations[0].signature, item.signature);
}

#[tokio::test]
async fn rerunning_an_identical_feed_inserts_nothing() {
    let fetcher = StubFetcher::new();
    fetcher.set(FEED_URL, FEED_XML);
    let (_dir, engine) = engine_with(toast_roster(), fetcher);

    let first = engine.run_collection().await.expect("first run");
    assert_eq!(first.rss.new_items, 1);

    let second = engine.run_collection().await.expect("second run");
    assert_eq!(second.rss.new_items, 0);
    assert_eq!(second.total_new_items, 0);

    let store = engine.load_store().expect("store");
    assert_eq!(store.items.len(), 1);
    assert_eq!(store.meta.run_count, 2);
    assert_eq!(store.meta.last_run_status, "ok");
}

#[tokio::test]
async fn whitespace_and_tracking_variants_dedupe_to_one_item() {
    let fetcher = StubFetcher::new();
    fetcher.set(FEED_URL, FEED_XML);
    let (_dir, engine) = engine_with(toast_roster(), fetcher.clone());
    engine.run_collection().await.expect("first run");

    // Same entry, different casing/whitespace/tracking noise.
    let variant = FEED_XML
        .replace(
            "Toast launches new kitchen display system",
            "  TOAST launches   new kitchen display system! ",
        )
        .replace("utm_source=rss", "utm_source=newsletter&utm_medium=email");
    fetcher.set(FEED_URL, &variant);

    let second = engine.run_collection().await.expect("second run");
    assert_eq!(second.rss.new_items, 0);
}

#[tokio::test]
async fn unreachable_feed_is_an_error_entry_not_a_failure() {
    let fetcher = StubFetcher::new();
    let (_dir, engine) = engine_with(toast_roster(), fetcher);

    let summary = engine.run_collection().await.expect("run still completes");
    assert_eq!(summary.rss.new_items, 0);
    assert_eq!(summary.rss.errors.len(), 1);
    let err = &summary.rss.errors[0];
    assert_eq!(err.kind, "rss");
    assert_eq!(err.entity.as_deref(), Some("Toast"));
    assert_eq!(err.status, 404);

    // The run itself still reports ok.
    let store = engine.load_store().expect("store");
    assert_eq!(store.meta.last_run_status, "ok");
}
