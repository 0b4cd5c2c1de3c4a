//! Binary entrypoint: env loading, tracing, metrics, the background refresh
//! loop, and the Axum HTTP server. `--collect-once` runs a single collection
//! and exits, for cron-style deployments.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pos_intel_monitor::collect::CollectionEngine;
use pos_intel_monitor::config::Config;
use pos_intel_monitor::metrics::Metrics;
use pos_intel_monitor::{api, RunSummary};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pos_intel_monitor=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// Periodic collection behind the shared single-flight lock, so scheduled
/// and manual refreshes never overlap. The first tick fires immediately,
/// giving a startup collection.
fn spawn_refresh_loop(engine: Arc<CollectionEngine>, lock: Arc<Mutex<()>>) {
    tokio::spawn(async move {
        let cadence = Duration::from_secs(engine.config().refresh_hours.max(1) * 3600);
        let mut ticker = tokio::time::interval(cadence);
        loop {
            ticker.tick().await;
            let _guard = lock.lock().await;
            match engine.run_collection().await {
                Ok(summary) => log_summary("scheduled", &summary),
                Err(err) => tracing::error!(error = %err, "scheduled collection failed"),
            }
        }
    });
}

fn log_summary(trigger: &str, summary: &RunSummary) {
    tracing::info!(
        trigger,
        total_new_items = summary.total_new_items,
        duration_ms = summary.duration_ms,
        rss = summary.rss.new_items,
        web = summary.web.new_items,
        linkedin_rss = summary.linkedin_rss.new_items,
        linkedin_pages = summary.linkedin_pages.new_items,
        press = summary.press.new_items,
        "collection finished"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env();
    let engine = Arc::new(CollectionEngine::new(config)?);

    if std::env::args().any(|arg| arg == "--collect-once") {
        let summary = engine.run_collection().await?;
        log_summary("once", &summary);
        return Ok(());
    }

    let metrics = Metrics::init(engine.config().refresh_hours);
    let refresh_lock = Arc::new(Mutex::new(()));
    spawn_refresh_loop(engine.clone(), refresh_lock.clone());

    let router = api::create_router(engine.clone(), refresh_lock).merge(metrics.router());
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], engine.config().port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(
        %addr,
        refresh_hours = engine.config().refresh_hours,
        "pos-intel-monitor listening"
    );
    axum::serve(listener, router).await.context("http server")?;
    Ok(())
}
