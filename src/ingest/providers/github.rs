// src/ingest/providers/github.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::GithubSettings;
use crate::ingest::normalize_title;
use crate::ingest::providers::get_body;
use crate::ingest::types::{SourceAdapter, TrendItem};

const DEFAULT_ENDPOINT: &str = "https://api.github.com/search/repositories";
const LABEL: &str = "GitHub";
const DESCRIPTION_MAX_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    name: Option<String>,
    description: Option<String>,
    html_url: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
}

fn repo_title(name: &str, description: Option<&str>) -> String {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => {
            let short: String = d.chars().take(DESCRIPTION_MAX_CHARS).collect();
            format!("{name} - {short}...")
        }
        None => name.to_string(),
    }
}

/// Parse a repository search body; stars are the popularity signal.
pub fn parse_search(body: &str) -> Result<Vec<TrendItem>> {
    let resp: SearchResponse =
        serde_json::from_str(body).context("parsing github search json")?;
    let items = resp
        .items
        .into_iter()
        .filter_map(|r| {
            let title = normalize_title(&repo_title(r.name.as_deref()?, r.description.as_deref()));
            TrendItem::new(title, r.html_url?, r.stargazers_count, LABEL)
        })
        .collect();
    Ok(items)
}

pub struct GithubProvider {
    client: Client,
    endpoint: String,
    settings: GithubSettings,
}

impl GithubProvider {
    pub fn new(client: Client, settings: GithubSettings) -> Self {
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
}

#[async_trait]
impl SourceAdapter for GithubProvider {
    async fn fetch_latest(&self) -> Result<Vec<TrendItem>> {
        let per_page = self.settings.per_page.to_string();
        let req = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .query(&[
                ("q", self.settings.query.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ]);
        let body = get_body(req, LABEL).await?;
        parse_search(&body)
    }

    fn name(&self) -> &'static str {
        LABEL
    }
}
