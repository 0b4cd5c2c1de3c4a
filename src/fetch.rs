//! The consumed fetch capability. Collectors never see transport errors:
//! every failure shape collapses into `FetchResponse { ok: false, .. }` and
//! is recorded as a per-source error entry by the caller.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub ok: bool,
    pub status: u16,
    pub text: String,
}

impl FetchResponse {
    pub fn failure(status: u16) -> Self {
        Self {
            ok: false,
            status,
            text: String::new(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            status: 200,
            text: text.into(),
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResponse;
}

/// reqwest-backed fetcher with a bounded total timeout. One attempt per
/// source per run; no retries.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "pos-intel-monitor/{}",
                env!("CARGO_PKG_VERSION")
            ))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building fetch client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResponse {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(error = %err, url, "fetch transport error");
                return FetchResponse::failure(0);
            }
        };

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return FetchResponse::failure(status);
        }

        match response.text().await {
            Ok(text) => FetchResponse {
                ok: true,
                status,
                text,
            },
            Err(err) => {
                tracing::debug!(error = %err, url, "fetch body read error");
                FetchResponse::failure(0)
            }
        }
    }
}
