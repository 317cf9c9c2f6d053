// src/ledger.rs
//! Delivery ledger: the urls that already went out in a digest.
//!
//! On disk it is a small JSON document
//! `{"delivered": {"<url>": "<first delivered, RFC 3339>"}}`; a bare JSON
//! array of urls is accepted too. A missing file is an empty ledger. Commits
//! re-read the file, merge, and replace it atomically via a temp file +
//! rename, so an interrupted commit leaves the previous ledger. A file that
//! exists but cannot be read is never overwritten.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryLedger {
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl DeliveryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Delivered urls in sorted order.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn delivered_at(&self, url: &str) -> Option<DateTime<Utc>> {
        self.entries.get(url).copied()
    }

    /// Add urls stamped `now`; urls already present keep their first stamp.
    /// Returns how many were new.
    pub fn merge<I, S>(&mut self, urls: I, now: DateTime<Utc>) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.entries.len();
        for url in urls {
            self.entries.entry(url.into()).or_insert(now);
        }
        self.entries.len() - before
    }

    /// Drop entries first delivered before `cutoff`. Returns how many went.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, ts| *ts >= cutoff);
        before - self.entries.len()
    }
}

impl<S: Into<String>> FromIterator<S> for DeliveryLedger {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut l = Self::new();
        l.merge(iter, Utc::now());
        l
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    delivered: BTreeMap<String, DateTime<Utc>>,
}

// --- tolerant on-disk variants ---

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LedgerAny {
    Stamped(LedgerFile),
    Plain(Vec<String>),
}

fn decode(raw: &[u8], now: DateTime<Utc>) -> Result<DeliveryLedger> {
    let any: LedgerAny = serde_json::from_slice(raw).context("ledger is not valid ledger json")?;
    let entries = match any {
        LedgerAny::Stamped(f) => f.delivered,
        LedgerAny::Plain(urls) => urls.into_iter().map(|u| (u, now)).collect(),
    };
    Ok(DeliveryLedger { entries })
}

/// What a read of the ledger file found. I/O failures other than a missing
/// file are not a `Stored` value: the caller gets them as `Err`.
#[derive(Debug)]
enum Stored {
    Missing,
    Corrupt(anyhow::Error),
    Found(DeliveryLedger),
}

fn classify(read: std::io::Result<Vec<u8>>, path: &Path, now: DateTime<Utc>) -> Result<Stored> {
    match read {
        Ok(raw) => Ok(match decode(&raw, now) {
            Ok(l) => Stored::Found(l),
            Err(e) => Stored::Corrupt(e.context(format!("decoding {}", path.display()))),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Stored::Missing),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

fn encode(ledger: &DeliveryLedger) -> Result<Vec<u8>> {
    let file = LedgerFile {
        delivered: ledger.entries.clone(),
    };
    serde_json::to_vec_pretty(&file).context("serializing ledger")
}

/// File-backed ledger location plus the (optional) retention policy.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    retention: Option<ChronoDuration>,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retention: None,
        }
    }

    /// Evict urls first delivered more than `days` ago, at commit time.
    pub fn with_retention_days(mut self, days: Option<u32>) -> Self {
        self.retention = days.map(|d| ChronoDuration::days(i64::from(d)));
        self
    }

    async fn read_stored(&self) -> Result<Stored> {
        classify(fs::read(&self.path).await, &self.path, Utc::now())
    }

    /// Missing file → empty ledger; unreadable or malformed → `Err`.
    pub async fn try_load(&self) -> Result<DeliveryLedger> {
        match self.read_stored().await? {
            Stored::Missing => Ok(DeliveryLedger::new()),
            Stored::Corrupt(e) => Err(e),
            Stored::Found(l) => Ok(l),
        }
    }

    /// Merge `urls` into the persisted ledger and write it back atomically.
    ///
    /// The current file is re-read first so entries committed since this run
    /// loaded are not lost. A missing or undecodable file is replaced; a file
    /// that cannot be read at all is left alone and the commit fails.
    /// Returns the ledger as written.
    pub async fn commit<I, S>(&self, urls: I, now: DateTime<Utc>) -> Result<DeliveryLedger>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ledger = match self.read_stored().await? {
            Stored::Found(l) => l,
            // already reported by whoever loaded it for filtering
            Stored::Missing | Stored::Corrupt(_) => DeliveryLedger::new(),
        };
        let added = ledger.merge(urls, now);
        let pruned = match self.retention {
            Some(keep) => ledger.prune_before(now - keep),
            None => 0,
        };

        self.write_atomic(&encode(&ledger)?).await?;
        tracing::debug!(
            path = %self.path.display(),
            added,
            pruned,
            total = ledger.len(),
            "ledger committed"
        );
        Ok(ledger)
    }

    async fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating ledger dir {}", dir.display()))?;
        }

        let tmp = tmp_path(&self.path);
        let mut f = fs::File::create(&tmp)
            .await
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(bytes)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        f.sync_all()
            .await
            .with_context(|| format!("syncing {}", tmp.display()))?;
        drop(f);

        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// Per-process temp name, so two writers never share a temp file.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger".into());
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}
