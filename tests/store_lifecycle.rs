//! Store lifecycle: corrupt-document recovery, persistence across engine
//! instances, roster re-seeding, and retention bounds across runs.

mod common;

use common::{engine_with, entity, StubFetcher};
use pos_intel_monitor::config::Config;
use pos_intel_monitor::model::EntityType;
use pos_intel_monitor::roster::Roster;
use pos_intel_monitor::store;

const FEED_URL: &str = "https://toast.example.com/blog/rss.xml";

fn feed_xml(count: usize) -> String {
    let mut items = String::new();
    for i in 0..count {
        items.push_str(&format!(
            "<item><title>Toast update number {i}</title>\
             <link>https://toast.example.com/blog/post-{i}</link>\
             <description>Body {i}</description></item>"
        ));
    }
    format!(r#"<?xml version="1.0"?><rss version="2.0"><channel>{items}</channel></rss>"#)
}

fn toast_roster() -> Roster {
    Roster::with_entities(
        vec![entity("Toast", EntityType::Competitor, &[FEED_URL], &[], &[])],
        vec![],
    )
}

#[tokio::test]
async fn corrupt_store_is_replaced_not_fatal() {
    let fetcher = StubFetcher::new();
    fetcher.set(FEED_URL, &feed_xml(2));
    let (_dir, engine) = engine_with(toast_roster(), fetcher);

    std::fs::create_dir_all(engine.config().data_file.parent().unwrap()).unwrap();
    std::fs::write(&engine.config().data_file, "{ not json at all").unwrap();

    let summary = engine.run_collection().await.expect("run succeeds");
    assert_eq!(summary.rss.new_items, 2);

    let store = engine.load_store().expect("store");
    assert_eq!(store.meta.run_count, 1);
    assert_eq!(store.meta.last_run_status, "ok");
}

#[tokio::test]
async fn store_round_trips_across_engine_instances() {
    let fetcher = StubFetcher::new();
    fetcher.set(FEED_URL, &feed_xml(3));
    let (dir, engine) = engine_with(toast_roster(), fetcher.clone());
    engine.run_collection().await.expect("first engine run");
    drop(engine);

    let mut config = Config::default();
    config.data_file = dir.path().join("store.json");
    let engine = pos_intel_monitor::CollectionEngine::with_parts(
        config,
        toast_roster(),
        fetcher,
        std::sync::Arc::new(pos_intel_monitor::annotate::DisabledNotes),
    );
    let store = engine.load_store().expect("reload");
    assert_eq!(store.items.len(), 3);
    assert_eq!(store.meta.run_count, 1);

    // A rerun over the reloaded document dedupes everything.
    let summary = engine.run_collection().await.expect("second engine run");
    assert_eq!(summary.total_new_items, 0);
}

#[test]
fn persisted_entity_arrays_are_never_trusted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let stale = Roster::with_entities(
        vec![entity("Ghost Vendor", EntityType::Competitor, &[], &[], &[])],
        vec![],
    );
    let mut doc = store::Store::default();
    doc.seed_roster(&stale);
    store::save(&path, &doc).expect("seed write");

    let current = toast_roster();
    let loaded = store::load_or_init(&path, &current).expect("load");
    let names: Vec<&str> = loaded.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Toast"]);
    assert!(loaded.competitors.iter().all(|e| e.name != "Ghost Vendor"));
}

#[tokio::test]
async fn retention_caps_hold_across_runs() {
    let fetcher = StubFetcher::new();
    let (_dir, engine) = {
        let config = Config {
            max_items: 5,
            max_observations: 7,
            max_history_per_source: 2,
            ..Config::default()
        };
        common::engine_with_notes(
            toast_roster(),
            fetcher.clone(),
            config,
            std::sync::Arc::new(pos_intel_monitor::annotate::DisabledNotes),
        )
    };

    // Three runs over rotating feed content overflow every ledger.
    for round in 0..3 {
        let mut items = String::new();
        for i in 0..4 {
            let n = round * 4 + i;
            items.push_str(&format!(
                "<item><title>Toast rotating update {n}</title>\
                 <link>https://toast.example.com/blog/rotate-{n}</link>\
                 <description>Body {n}</description></item>"
            ));
        }
        fetcher.set(
            FEED_URL,
            &format!(r#"<rss version="2.0"><channel>{items}</channel></rss>"#),
        );
        engine.run_collection().await.expect("run");
    }

    let store = engine.load_store().expect("store");
    assert!(store.items.len() <= 5);
    assert!(store.observations.len() <= 7);
    for versions in store.snapshot_history.values() {
        assert!(versions.len() <= 2);
    }
    // Newest-first: the last round's items lead the list.
    assert!(store.items[0].title.contains("update 11") || store.items[0].title.contains("update 8"));
}
