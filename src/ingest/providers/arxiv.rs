// src/ingest/providers/arxiv.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use reqwest::Client;
use serde::Deserialize;

use crate::config::ArxivSettings;
use crate::ingest::normalize_title;
use crate::ingest::providers::get_body;
use crate::ingest::types::{SourceAdapter, TrendItem};

const DEFAULT_ENDPOINT: &str = "http://export.arxiv.org/api/query";
const LABEL: &str = "arXiv";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
}

/// Parse an arXiv Atom feed. The entry `<id>` (abs url) is the identifier;
/// arXiv has no popularity signal, so every paper scores 0.
pub fn parse_atom(xml: &str) -> Result<Vec<TrendItem>> {
    let feed: Feed = from_str(xml).context("parsing arxiv atom xml")?;
    let items = feed
        .entries
        .into_iter()
        .filter_map(|e| {
            let title = normalize_title(e.title.as_deref()?);
            TrendItem::new(title, e.id?, 0, LABEL)
        })
        .collect();
    Ok(items)
}

pub struct ArxivProvider {
    client: Client,
    endpoint: String,
    settings: ArxivSettings,
}

impl ArxivProvider {
    pub fn new(client: Client, settings: ArxivSettings) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            settings,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn search_query(&self) -> String {
        self.settings
            .categories
            .iter()
            .map(|c| format!("cat:{c}"))
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

#[async_trait]
impl SourceAdapter for ArxivProvider {
    async fn fetch_latest(&self) -> Result<Vec<TrendItem>> {
        let max = self.settings.max_results.to_string();
        let query = self.search_query();
        let req = self.client.get(&self.endpoint).query(&[
            ("search_query", query.as_str()),
            ("start", "0"),
            ("max_results", max.as_str()),
            ("sortBy", "submittedDate"),
            ("sortOrder", "descending"),
        ]);
        let body = get_body(req, LABEL).await?;
        parse_atom(&body)
    }

    fn name(&self) -> &'static str {
        LABEL
    }
}
