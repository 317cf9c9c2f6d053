// tests/common/mod.rs
// Shared stubs for the pipeline/aggregation tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tech_trends_digest::{Notifier, PipelineEvent, PipelineObserver, SourceAdapter, TrendItem};

pub fn item(url: &str, popularity: u64) -> TrendItem {
    TrendItem::new(format!("Title for {url}"), url, popularity, "test").unwrap()
}

/// Returns the same items on every call.
pub struct StaticAdapter {
    pub name: &'static str,
    pub items: Vec<TrendItem>,
}

impl StaticAdapter {
    pub fn arc(name: &'static str, items: Vec<TrendItem>) -> Arc<dyn SourceAdapter> {
        Arc::new(Self { name, items })
    }
}

#[async_trait]
impl SourceAdapter for StaticAdapter {
    async fn fetch_latest(&self) -> Result<Vec<TrendItem>> {
        Ok(self.items.clone())
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

pub struct FailingAdapter;

#[async_trait]
impl SourceAdapter for FailingAdapter {
    async fn fetch_latest(&self) -> Result<Vec<TrendItem>> {
        Err(anyhow!("connection refused"))
    }
    fn name(&self) -> &'static str {
        "Failing"
    }
}

pub struct PanickingAdapter;

#[async_trait]
impl SourceAdapter for PanickingAdapter {
    async fn fetch_latest(&self) -> Result<Vec<TrendItem>> {
        panic!("provider bug");
    }
    fn name(&self) -> &'static str {
        "Panicking"
    }
}

pub struct HangingAdapter;

#[async_trait]
impl SourceAdapter for HangingAdapter {
    async fn fetch_latest(&self) -> Result<Vec<TrendItem>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
    fn name(&self) -> &'static str {
        "Hanging"
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn failed_adapters(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::AdapterFailed { adapter, .. } => Some(adapter),
                _ => None,
            })
            .collect()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Records every batch it is asked to send and answers with `succeed`.
pub struct StubNotifier {
    pub succeed: bool,
    pub calls: AtomicUsize,
    pub sent: Mutex<Vec<Vec<TrendItem>>>,
}

impl StubNotifier {
    pub fn new(succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            succeed,
            calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for StubNotifier {
    async fn send(&self, items: &[TrendItem]) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(items.to_vec());
        self.succeed
    }
}
