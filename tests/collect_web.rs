//! Web-page diffing channel: baseline capture, unchanged skips, change
//! detection, and the "last updated" marker override.

mod common;

use common::{engine_with, entity, StubFetcher};
use pos_intel_monitor::model::{Channel, EntityType};
use pos_intel_monitor::roster::Roster;

const PAGE_URL: &str = "https://toast.example.com/pricing";

fn page(body: &str) -> String {
    format!("<html><head><title>Toast Pricing</title></head><body>{body}</body></html>")
}

fn toast_roster() -> Roster {
    Roster::with_entities(
        vec![entity(
            "Toast",
            EntityType::Competitor,
            &[],
            &[PAGE_URL],
            &[],
        )],
        vec![],
    )
}

#[tokio::test]
async fn first_sighting_is_a_baseline_capture() {
    let fetcher = StubFetcher::new();
    fetcher.set(PAGE_URL, &page("Plans start at $69."));
    let (_dir, engine) = engine_with(toast_roster(), fetcher);

    let summary = engine.run_collection().await.expect("run");
    assert_eq!(summary.web.new_items, 0);

    let store = engine.load_store().expect("store");
    assert!(store.items.is_empty());
    // Snapshot and one history version exist after the baseline.
    assert!(store.snapshots.contains_key(PAGE_URL));
    assert_eq!(store.snapshot_history[PAGE_URL].len(), 1);
}

#[tokio::test]
async fn unchanged_page_refreshes_snapshot_without_item_or_history() {
    let fetcher = StubFetcher::new();
    fetcher.set(PAGE_URL, &page("Plans start at $69."));
    let (_dir, engine) = engine_with(toast_roster(), fetcher);

    engine.run_collection().await.expect("baseline run");
    let before = engine.load_store().expect("store");
    let checked_before = before.snapshots[PAGE_URL].checked_at.clone();

    let summary = engine.run_collection().await.expect("second run");
    assert_eq!(summary.web.new_items, 0);

    let after = engine.load_store().expect("store");
    assert!(after.items.is_empty());
    // Snapshot is overwritten every run; history gains nothing.
    assert!(after.snapshots[PAGE_URL].checked_at >= checked_before);
    assert_eq!(after.snapshot_history[PAGE_URL].len(), 1);
}

#[tokio::test]
async fn content_change_produces_exactly_one_item() {
    let fetcher = StubFetcher::new();
    fetcher.set(PAGE_URL, &page("Plans start at $69."));
    let (_dir, engine) = engine_with(toast_roster(), fetcher.clone());

    engine.run_collection().await.expect("baseline run");
    fetcher.set(PAGE_URL, &page("Plans start at $79."));

    let summary = engine.run_collection().await.expect("diff run");
    assert_eq!(summary.web.new_items, 1);

    let store = engine.load_store().expect("store");
    assert_eq!(store.items.len(), 1);
    let item = &store.items[0];
    assert_eq!(item.channel, Channel::Web);
    assert_eq!(item.confidence, 0.86);
    assert_eq!(item.title, "Toast Pricing");
    assert!(item
        .summary
        .starts_with("Verified page change detected on monitored web source"));
    assert_eq!(store.snapshot_history[PAGE_URL].len(), 2);

    // Re-running with the same changed content inserts nothing further.
    let third = engine.run_collection().await.expect("third run");
    assert_eq!(third.web.new_items, 0);
}

#[tokio::test]
async fn moved_update_marker_triggers_even_when_digest_is_stable() {
    // Place the marker beyond the fingerprint's bounded body so the digest
    // cannot see it move.
    let filler = "lorem ".repeat(2000);
    let fetcher = StubFetcher::new();
    fetcher.set(
        PAGE_URL,
        &page(&format!("{filler} Last updated: March 5, 2024")),
    );
    let (_dir, engine) = engine_with(toast_roster(), fetcher.clone());

    engine.run_collection().await.expect("baseline run");
    fetcher.set(
        PAGE_URL,
        &page(&format!("{filler} Last updated: March 9, 2024")),
    );

    let summary = engine.run_collection().await.expect("marker run");
    assert_eq!(summary.web.new_items, 1);

    let store = engine.load_store().expect("store");
    assert_eq!(store.items[0].event_at, "2024-03-09T00:00:00.000Z");
    assert!(store.items[0].summary.contains("updated March 9, 2024"));
}

#[tokio::test]
async fn unreachable_page_is_skipped_with_an_error_entry() {
    let fetcher = StubFetcher::new();
    fetcher.set(PAGE_URL, &page("ok"));
    let (_dir, engine) = engine_with(toast_roster(), fetcher.clone());
    engine.run_collection().await.expect("baseline run");

    fetcher.clear(PAGE_URL);
    let summary = engine.run_collection().await.expect("run");
    assert_eq!(summary.web.errors.len(), 1);
    assert_eq!(summary.web.errors[0].kind, "web");
    assert_eq!(summary.web.new_items, 0);
}
