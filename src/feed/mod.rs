//! Dataset acquisition: two sequential fetches at startup, no retry.
//!
//! A failure at either stage aborts initialization; there is no partial
//! UI. Locators may be http(s) URLs or local file paths.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::logging::{log, obj, v_str, Domain, Level};
use crate::state::Config;

#[async_trait]
pub trait DatasetSource {
    async fn fetch(&self, locator: &str) -> Result<String>;
}

pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    async fn fetch(&self, locator: &str) -> Result<String> {
        let resp = self
            .client
            .get(locator)
            .send()
            .await
            .with_context(|| format!("fetch failed: {}", locator))?;
        if !resp.status().is_success() {
            return Err(anyhow!("fetch failed: {} ({})", locator, resp.status()));
        }
        resp.text()
            .await
            .with_context(|| format!("body read failed: {}", locator))
    }
}

pub struct FileSource;

#[async_trait]
impl DatasetSource for FileSource {
    async fn fetch(&self, locator: &str) -> Result<String> {
        std::fs::read_to_string(locator).with_context(|| format!("read failed: {}", locator))
    }
}

fn source_for(locator: &str) -> Box<dyn DatasetSource + Send + Sync> {
    if locator.starts_with("http://") || locator.starts_with("https://") {
        Box::new(HttpSource::new())
    } else {
        Box::new(FileSource)
    }
}

/// Raw dataset text, in fetch order: centroids first, then flows.
pub struct Datasets {
    pub centroids_csv: String,
    pub flows_csv: String,
}

pub async fn load_datasets(cfg: &Config) -> Result<Datasets> {
    log(
        Level::Info,
        Domain::Data,
        "fetch_start",
        obj(&[
            ("centroids", v_str(&cfg.centroids_source)),
            ("flows", v_str(&cfg.flows_source)),
        ]),
    );

    let centroids_csv = source_for(&cfg.centroids_source)
        .fetch(&cfg.centroids_source)
        .await?;
    let flows_csv = source_for(&cfg.flows_source)
        .fetch(&cfg.flows_source)
        .await?;

    Ok(Datasets {
        centroids_csv,
        flows_csv,
    })
}
