//! LinkedIn channels: query-syndication filtering and the company-page
//! diffing confidence split.

mod common;

use common::{engine_with, entity, StubFetcher};
use pos_intel_monitor::model::{Channel, EntityType, SourceType};
use pos_intel_monitor::roster::{Roster, SearchFeed};

const QUERY_FEED_URL: &str = "https://news.example.com/rss/search?q=toast";
const COMPANY_PAGE_URL: &str = "https://www.linkedin.com/company/toast-inc";

fn query_feed_xml() -> String {
    r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item>
    <title>Toast VP of Engineering shares a milestone</title>
    <link>https://www.linkedin.com/posts/toast-vp-milestone</link>
    <description>Our VP celebrates the rollout.</description>
    <pubDate>Sun, 02 Aug 2026 08:00:00 GMT</pubDate>
  </item>
  <item>
    <title>Toast team update</title>
    <link>https://www.linkedin.com/posts/toast-team-update</link>
    <description>Company news from the Toast page.</description>
  </item>
  <item>
    <title>Toast mentioned on a blog</title>
    <link>https://blog.example.com/toast-mention</link>
    <description>Not a LinkedIn link, discarded.</description>
  </item>
  <item>
    <title>Unrelated company post</title>
    <link>https://www.linkedin.com/posts/unrelated</link>
    <description>No tracked entity appears here.</description>
  </item>
</channel></rss>"#
        .to_string()
}

fn roster_with_query_feed(bound: Option<&str>) -> Roster {
    let mut roster = Roster::with_entities(
        vec![entity("Toast", EntityType::Competitor, &[], &[], &[])],
        vec![],
    );
    roster.linkedin_search = vec![SearchFeed {
        name: "Google LinkedIn - Toast - site:linkedin.com \"Toast\"".to_string(),
        url: QUERY_FEED_URL.to_string(),
        entity: bound.map(str::to_string),
    }];
    roster
}

#[tokio::test]
async fn query_entries_split_employee_and_company_confidence() {
    let fetcher = StubFetcher::new();
    fetcher.set(QUERY_FEED_URL, &query_feed_xml());
    let (_dir, engine) = engine_with(roster_with_query_feed(Some("Toast")), fetcher);

    let summary = engine.run_collection().await.expect("run");
    // Employee post, company post, and (entity-bound) the unrelated post
    // also resolves to Toast through the feed binding.
    assert_eq!(summary.linkedin_rss.new_items, 3);

    let store = engine.load_store().expect("store");
    let employee = store
        .items
        .iter()
        .find(|item| item.url.contains("toast-vp-milestone"))
        .expect("employee item");
    assert_eq!(employee.channel, Channel::Linkedin);
    assert_eq!(employee.source_type, SourceType::LinkedinEmployee);
    assert_eq!(employee.confidence, 0.84);

    let company = store
        .items
        .iter()
        .find(|item| item.url.contains("toast-team-update"))
        .expect("company item");
    assert_eq!(company.source_type, SourceType::LinkedinCompany);
    assert_eq!(company.confidence, 0.9);

    // The non-LinkedIn link never shows up.
    assert!(store
        .items
        .iter()
        .all(|item| !item.url.contains("blog.example.com")));
}

#[tokio::test]
async fn unbound_feed_falls_back_to_text_matching() {
    let fetcher = StubFetcher::new();
    fetcher.set(QUERY_FEED_URL, &query_feed_xml());
    let mut roster = roster_with_query_feed(None);
    // Feed name that matches no entity forces per-entry resolution.
    roster.linkedin_search[0].name = "Google LinkedIn - unfiled query".to_string();
    let (_dir, engine) = engine_with(roster, fetcher);

    let summary = engine.run_collection().await.expect("run");
    // Only entries whose text mentions Toast survive; the unrelated post is
    // discarded.
    assert_eq!(summary.linkedin_rss.new_items, 2);
}

#[tokio::test]
async fn company_page_diff_splits_on_update_language() {
    let quiet = r#"<html><head><title>Toast | LinkedIn</title>
<meta property="og:title" content="Toast, Inc.">
<meta property="og:description" content="Restaurant platform company profile.">
</head><body>About Toast v1</body></html>"#;
    let strong = r#"<html><head><title>Toast | LinkedIn</title>
<meta property="og:title" content="Toast, Inc.">
<meta property="og:description" content="Announcing a new integration launch for restaurants.">
</head><body>About Toast v2</body></html>"#;

    let fetcher = StubFetcher::new();
    fetcher.set(COMPANY_PAGE_URL, quiet);
    let roster = Roster::with_entities(
        vec![entity(
            "Toast",
            EntityType::Competitor,
            &[],
            &[],
            &[COMPANY_PAGE_URL],
        )],
        vec![],
    );
    let (_dir, engine) = engine_with(roster, fetcher.clone());

    let baseline = engine.run_collection().await.expect("baseline");
    assert_eq!(baseline.linkedin_pages.new_items, 0);

    fetcher.set(COMPANY_PAGE_URL, strong);
    let summary = engine.run_collection().await.expect("diff run");
    assert_eq!(summary.linkedin_pages.new_items, 1);

    let store = engine.load_store().expect("store");
    let item = &store.items[0];
    assert_eq!(item.channel, Channel::Linkedin);
    assert_eq!(item.source_type, SourceType::LinkedinCompanyPage);
    // Social-preview metadata drives the title/summary.
    assert_eq!(item.title, "Toast, Inc.");
    assert!(item.summary.contains("integration launch"));
    // Explicit update language escalates confidence.
    assert_eq!(item.confidence, 0.9);
    assert_eq!(
        item.confidence_reason,
        "LinkedIn company page changed with explicit update language"
    );
}

#[tokio::test]
async fn quiet_company_page_change_keeps_low_confidence() {
    let v1 = r#"<html><head><title>Shogo | LinkedIn</title>
<meta property="og:description" content="Accounting sync for restaurants.">
</head><body>profile v1</body></html>"#;
    let v2 = r#"<html><head><title>Shogo | LinkedIn</title>
<meta property="og:description" content="Accounting sync for cafes.">
</head><body>profile v2</body></html>"#;

    let page_url = "https://www.linkedin.com/company/shogo-technologies";
    let fetcher = StubFetcher::new();
    fetcher.set(page_url, v1);
    let roster = Roster::with_entities(
        vec![],
        vec![entity("Shogo", EntityType::Partner, &[], &[], &[page_url])],
    );
    let (_dir, engine) = engine_with(roster, fetcher.clone());

    engine.run_collection().await.expect("baseline");
    fetcher.set(page_url, v2);
    let summary = engine.run_collection().await.expect("diff run");
    assert_eq!(summary.linkedin_pages.new_items, 1);

    let store = engine.load_store().expect("store");
    let item = &store.items[0];
    assert_eq!(item.confidence, 0.82);
    assert_eq!(
        item.confidence_reason,
        "LinkedIn company page fingerprint changed"
    );
}
