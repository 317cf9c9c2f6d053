// src/ingest/providers/mod.rs
pub mod arxiv;
pub mod github;
pub mod hacker_news;
pub mod newsapi;
pub mod reddit;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};

use crate::config::SourceSettings;
use crate::ingest::types::SourceAdapter;

/// Reddit and GitHub reject requests without a browser-ish agent.
const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) tech-trends-digest/",
    env!("CARGO_PKG_VERSION")
);

/// Shared client for all providers; `timeout` bounds every single request.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("building provider http client")
}

/// Send `req`, require a 2xx status, return the body text.
pub(crate) async fn get_body(req: RequestBuilder, provider: &str) -> Result<String> {
    let resp = req
        .send()
        .await
        .with_context(|| format!("{provider} http get()"))?
        .error_for_status()
        .with_context(|| format!("{provider} non-2xx"))?;
    resp.text()
        .await
        .with_context(|| format!("{provider} http .text()"))
}

/// Build the enabled adapters in their fixed invocation order.
/// NewsAPI is only included when a key is configured.
pub fn default_adapters(
    sources: &SourceSettings,
    newsapi_key: Option<&str>,
    client: &Client,
) -> Vec<Arc<dyn SourceAdapter>> {
    let mut out: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    if sources.hacker_news.enabled {
        out.push(Arc::new(hacker_news::HackerNewsProvider::new(
            client.clone(),
            sources.hacker_news.clone(),
        )));
    }
    if sources.reddit.enabled {
        out.push(Arc::new(reddit::RedditProvider::new(
            client.clone(),
            sources.reddit.clone(),
        )));
    }
    if sources.arxiv.enabled {
        out.push(Arc::new(arxiv::ArxivProvider::new(
            client.clone(),
            sources.arxiv.clone(),
        )));
    }
    if sources.github.enabled {
        out.push(Arc::new(github::GithubProvider::new(
            client.clone(),
            sources.github.clone(),
        )));
    }
    match newsapi_key {
        Some(key) if sources.newsapi.enabled => {
            out.push(Arc::new(newsapi::NewsApiProvider::new(
                client.clone(),
                key.to_string(),
                sources.newsapi.clone(),
            )));
        }
        Some(_) => {}
        None => tracing::info!("NEWSAPI_KEY not set, skipping NewsAPI"),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newsapi_only_with_key() {
        let client = http_client(Duration::from_secs(1)).unwrap();
        let sources = SourceSettings::default();

        let without: Vec<_> = default_adapters(&sources, None, &client)
            .iter()
            .map(|a| a.name())
            .collect();
        assert_eq!(without, vec!["Hacker News", "Reddit", "arXiv", "GitHub"]);

        let with = default_adapters(&sources, Some("k"), &client);
        assert_eq!(with.last().map(|a| a.name()), Some("NewsAPI"));
    }

    #[test]
    fn disabled_sources_are_skipped() {
        let client = http_client(Duration::from_secs(1)).unwrap();
        let mut sources = SourceSettings::default();
        sources.reddit.enabled = false;
        sources.github.enabled = false;
        let names: Vec<_> = default_adapters(&sources, None, &client)
            .iter()
            .map(|a| a.name())
            .collect();
        assert_eq!(names, vec!["Hacker News", "arXiv"]);
    }
}
