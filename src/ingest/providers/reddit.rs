// src/ingest/providers/reddit.rs
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::RedditSettings;
use crate::ingest::normalize_title;
use crate::ingest::providers::get_body;
use crate::ingest::types::{SourceAdapter, TrendItem};

const DEFAULT_BASE: &str = "https://www.reddit.com";
const PERMALINK_BASE: &str = "https://reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: Option<String>,
    permalink: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    is_self: bool,
}

/// Parse one `/r/{sub}/hot.json` listing. Self posts are skipped; the
/// permalink (not the outbound link) is the stable identifier.
pub fn parse_listing(subreddit: &str, body: &str) -> Result<Vec<TrendItem>> {
    let listing: Listing = serde_json::from_str(body)
        .with_context(|| format!("parsing r/{subreddit} listing json"))?;
    let label = format!("r/{subreddit}");
    let items = listing
        .data
        .children
        .into_iter()
        .map(|c| c.data)
        .filter(|p| !p.is_self)
        .filter_map(|p| {
            let title = normalize_title(p.title.as_deref()?);
            let url = format!("{PERMALINK_BASE}{}", p.permalink?);
            TrendItem::new(title, url, p.score.max(0) as u64, label.clone())
        })
        .collect();
    Ok(items)
}

/// Hot posts from several subreddits, one request each, spaced out by
/// `delay_ms` so Reddit does not throttle us.
pub struct RedditProvider {
    client: Client,
    base: String,
    settings: RedditSettings,
}

impl RedditProvider {
    pub fn new(client: Client, settings: RedditSettings) -> Self {
        Self {
            client,
            base: DEFAULT_BASE.to_string(),
            settings,
        }
    }

    pub fn with_endpoint(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_subreddit(&self, subreddit: &str) -> Result<Vec<TrendItem>> {
        let url = format!("{}/r/{subreddit}/hot.json", self.base);
        let limit = self.settings.limit_per_subreddit.to_string();
        let req = self.client.get(url).query(&[("limit", limit.as_str())]);
        let body = get_body(req, "Reddit").await?;
        parse_listing(subreddit, &body)
    }
}

#[async_trait]
impl SourceAdapter for RedditProvider {
    async fn fetch_latest(&self) -> Result<Vec<TrendItem>> {
        let delay = Duration::from_millis(self.settings.delay_ms);
        let mut out = Vec::new();
        let mut failures = 0usize;

        for (i, sub) in self.settings.subreddits.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match self.fetch_subreddit(sub).await {
                Ok(mut items) => out.append(&mut items),
                Err(e) => {
                    failures += 1;
                    tracing::warn!(subreddit = %sub, error = ?e, "subreddit fetch failed, skipping");
                }
            }
        }

        if failures > 0 && failures == self.settings.subreddits.len() {
            return Err(anyhow!("all {failures} subreddit queries failed"));
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "Reddit"
    }
}
