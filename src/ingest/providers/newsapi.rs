// src/ingest/providers/newsapi.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::NewsApiSettings;
use crate::ingest::normalize_title;
use crate::ingest::types::{SourceAdapter, TrendItem};

const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2/everything";
/// NewsAPI keeps taken-down articles around with this placeholder title.
const REMOVED_MARKER: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    url: Option<String>,
    source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

/// Parse an `/v2/everything` body. A non-"ok" status is an error even though
/// NewsAPI reports it in the body; articles carry no popularity signal.
pub fn parse_everything(body: &str) -> Result<Vec<TrendItem>> {
    let resp: EverythingResponse =
        serde_json::from_str(body).context("parsing newsapi json")?;
    if resp.status != "ok" {
        bail!(
            "newsapi status {}: {}",
            resp.status,
            resp.message.as_deref().unwrap_or("Unknown error")
        );
    }

    let items = resp
        .articles
        .into_iter()
        .filter(|a| {
            a.title
                .as_deref()
                .is_some_and(|t| !t.contains(REMOVED_MARKER))
        })
        .filter_map(|a| {
            let outlet = a
                .source
                .and_then(|s| s.name)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string());
            let title = normalize_title(a.title.as_deref()?);
            TrendItem::new(title, a.url?, 0, format!("News: {outlet}"))
        })
        .collect();
    Ok(items)
}

pub struct NewsApiProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    settings: NewsApiSettings,
}

impl NewsApiProvider {
    pub fn new(client: Client, api_key: String, settings: NewsApiSettings) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            settings,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SourceAdapter for NewsApiProvider {
    async fn fetch_latest(&self) -> Result<Vec<TrendItem>> {
        let page_size = self.settings.page_size.to_string();
        let resp = self
            .client
            .get(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", self.settings.query.as_str()),
                ("sortBy", "popularity"),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("newsapi http get()")?;
        // Error statuses still carry a JSON body with a useful message.
        let body = resp.text().await.context("newsapi http .text()")?;
        parse_everything(&body)
    }

    fn name(&self) -> &'static str {
        "NewsAPI"
    }
}
