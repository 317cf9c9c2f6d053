// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::error::Elapsed;

use crate::ingest::types::{SourceAdapter, TrendItem};
use crate::observer::{PipelineEvent, PipelineObserver};

/// Titles longer than this are cut (some feeds put whole abstracts there).
const TITLE_MAX_CHARS: usize = 300;

/// One-time metrics registration (so series show up in the textfile).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "digest_source_items_total",
            "Items returned per source adapter."
        );
        describe_counter!(
            "digest_adapter_errors_total",
            "Adapter fetch/parse failures, timeouts and panics."
        );
        describe_histogram!(
            "digest_fetch_ms",
            "Adapter fetch duration in milliseconds."
        );
    });
}

/// Normalize a display title: entities, tags, quotes, whitespace, length cap.
pub fn normalize_title(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (arXiv titles wrap across lines)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > TITLE_MAX_CHARS {
        out = out.chars().take(TITLE_MAX_CHARS).collect();
    }

    out
}

type FetchTask = JoinHandle<Result<anyhow::Result<Vec<TrendItem>>, Elapsed>>;

fn spawn_fetch(adapter: Arc<dyn SourceAdapter>, timeout: Duration) -> FetchTask {
    tokio::spawn(async move { tokio::time::timeout(timeout, adapter.fetch_latest()).await })
}

/// Turn a finished fetch task into items, reporting any failure to `observer`.
fn settle(
    name: &'static str,
    started: Instant,
    joined: Result<Result<anyhow::Result<Vec<TrendItem>>, Elapsed>, JoinError>,
    observer: &dyn PipelineObserver,
    timeout: Duration,
) -> Vec<TrendItem> {
    let reason = match joined {
        Ok(Ok(Ok(items))) => {
            histogram!("digest_fetch_ms", "adapter" => name)
                .record(started.elapsed().as_secs_f64() * 1_000.0);
            counter!("digest_source_items_total", "adapter" => name).increment(items.len() as u64);
            tracing::debug!(adapter = name, items = items.len(), "adapter fetched");
            return items;
        }
        Ok(Ok(Err(e))) => format!("{e:#}"),
        Ok(Err(_)) => format!("timed out after {}s", timeout.as_secs()),
        Err(e) if e.is_panic() => "adapter panicked".to_string(),
        Err(e) => format!("adapter task aborted: {e}"),
    };

    observer.on_event(&PipelineEvent::AdapterFailed {
        adapter: name.to_string(),
        reason,
    });
    Vec::new()
}

/// Run one adapter under a timeout. Never fails: errors, timeouts and panics
/// are reported to `observer` and yield an empty result.
pub async fn fetch_isolated(
    adapter: Arc<dyn SourceAdapter>,
    observer: &dyn PipelineObserver,
    timeout: Duration,
) -> Vec<TrendItem> {
    let name = adapter.name();
    let started = Instant::now();
    let joined = spawn_fetch(adapter, timeout).await;
    settle(name, started, joined, observer, timeout)
}

/// Collect the candidate set from all adapters.
///
/// Adapters run concurrently on their own tasks, but results are concatenated
/// in the order the adapters were given. No dedup or sorting happens here.
pub async fn aggregate(
    adapters: &[Arc<dyn SourceAdapter>],
    observer: &dyn PipelineObserver,
    adapter_timeout: Duration,
) -> Vec<TrendItem> {
    ensure_metrics_described();

    let started = Instant::now();
    let tasks: Vec<(&'static str, FetchTask)> = adapters
        .iter()
        .map(|a| (a.name(), spawn_fetch(Arc::clone(a), adapter_timeout)))
        .collect();

    let mut candidates = Vec::new();
    for (name, task) in tasks {
        let joined = task.await;
        candidates.extend(settle(name, started, joined, observer, adapter_timeout));
    }
    candidates
}
