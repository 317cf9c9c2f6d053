// src/ingest/types.rs
use anyhow::Result;
use serde::Serialize;

/// One normalized trend: what gets ranked, mailed and remembered.
///
/// `url` doubles as the dedup key, so providers must emit a url that stays
/// stable across runs for the same underlying content.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrendItem {
    title: String,
    url: String,
    popularity: u64,
    source_label: String,
}

impl TrendItem {
    /// Returns `None` when title or url is blank after trimming.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        popularity: u64,
        source_label: impl Into<String>,
    ) -> Option<Self> {
        let title = title.into().trim().to_string();
        let url = url.into().trim().to_string();
        if title.is_empty() || url.is_empty() {
            return None;
        }
        Some(Self {
            title,
            url,
            popularity,
            source_label: source_label.into(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn popularity(&self) -> u64 {
        self.popularity
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch and normalize the provider's current items.
    ///
    /// Multi-query providers return partial results when only some of their
    /// sub-queries fail; an `Err` means nothing usable came back.
    async fn fetch_latest(&self) -> Result<Vec<TrendItem>>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_title_or_url_is_rejected() {
        assert!(TrendItem::new("  ", "https://a.test", 1, "HN").is_none());
        assert!(TrendItem::new("Title", "", 1, "HN").is_none());
        assert!(TrendItem::new("Title", " \t", 1, "HN").is_none());
    }

    #[test]
    fn fields_are_trimmed() {
        let it = TrendItem::new(" Title ", " https://a.test ", 3, "arXiv").unwrap();
        assert_eq!(it.title(), "Title");
        assert_eq!(it.url(), "https://a.test");
        assert_eq!(it.popularity(), 3);
        assert_eq!(it.source_label(), "arXiv");
    }
}
