// src/ingest/providers/hacker_news.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::HackerNewsSettings;
use crate::ingest::normalize_title;
use crate::ingest::providers::get_body;
use crate::ingest::types::{SourceAdapter, TrendItem};

const DEFAULT_ENDPOINT: &str = "https://hn.algolia.com/api/v1/search";
const LABEL: &str = "Hacker News";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    title: Option<String>,
    url: Option<String>,
    points: Option<i64>,
}

/// Parse an Algolia search body. Stories without an external url
/// (Ask HN and friends) are dropped.
pub fn parse_search(body: &str) -> Result<Vec<TrendItem>> {
    let resp: SearchResponse = serde_json::from_str(body).context("parsing hn search json")?;
    let items = resp
        .hits
        .into_iter()
        .filter_map(|h| {
            let title = normalize_title(h.title.as_deref()?);
            let points = h.points.unwrap_or(0).max(0) as u64;
            TrendItem::new(title, h.url?, points, LABEL)
        })
        .collect();
    Ok(items)
}

pub struct HackerNewsProvider {
    client: Client,
    endpoint: String,
    settings: HackerNewsSettings,
}

impl HackerNewsProvider {
    pub fn new(client: Client, settings: HackerNewsSettings) -> Self {
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
impl SourceAdapter for HackerNewsProvider {
    async fn fetch_latest(&self) -> Result<Vec<TrendItem>> {
        let hits = self.settings.hits_per_page.to_string();
        let req = self.client.get(&self.endpoint).query(&[
            ("query", self.settings.query.as_str()),
            ("tags", "story"),
            ("hitsPerPage", hits.as_str()),
        ]);
        let body = get_body(req, LABEL).await?;
        parse_search(&body)
    }

    fn name(&self) -> &'static str {
        LABEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_points_become_zero_and_urlless_hits_drop() {
        let body = r#"{"hits":[
            {"title":"Show HN: tiny LLM","url":"https://x.test/llm","points":null},
            {"title":"Ask HN: what now?","url":null,"points":40},
            {"title":"Big model","url":"https://x.test/big","points":120}
        ]}"#;
        let items = parse_search(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].popularity(), 0);
        assert_eq!(items[1].popularity(), 120);
        assert!(items.iter().all(|i| i.source_label() == "Hacker News"));
    }

    #[test]
    fn garbage_body_is_an_error() {
        assert!(parse_search("<html>rate limited</html>").is_err());
    }
}
