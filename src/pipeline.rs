// src/pipeline.rs
//! # Digest Pipeline
//! One run: fetch all sources → filter against the ledger and rank →
//! notify → commit the sent urls to the ledger.
//!
//! The ledger is only touched after the notifier confirms delivery, so a
//! failed send leaves every item eligible for the next run.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::ingest::aggregate;
use crate::ingest::types::{SourceAdapter, TrendItem};
use crate::ledger::LedgerStore;
use crate::notify::Notifier;
use crate::observer::{PipelineEvent, PipelineObserver, TracingObserver};
use crate::rank::{select, DEFAULT_LIMIT};

const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(60);

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// Digest sent and ledger committed.
    Delivered,
    /// Nothing new to send; no notification, ledger untouched.
    NothingNew,
    /// Notifier reported failure; ledger untouched.
    NotificationFailed,
    /// Digest sent but the ledger could not be persisted.
    CommitFailed,
}

impl RunOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, RunOutcome::Delivered | RunOutcome::NothingNew)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunOutcome::Delivered => "delivered",
            RunOutcome::NothingNew => "nothing_new",
            RunOutcome::NotificationFailed => "notification_failed",
            RunOutcome::CommitFailed => "commit_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Candidates collected from all sources.
    pub found: usize,
    /// Items that survived dedup + ranking.
    pub selected: usize,
    /// Items confirmed delivered.
    pub sent: usize,
}

pub struct DigestPipeline {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    ledger: LedgerStore,
    notifier: Arc<dyn Notifier>,
    observer: Arc<dyn PipelineObserver>,
    limit: usize,
    adapter_timeout: Duration,
}

impl DigestPipeline {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        ledger: LedgerStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            adapters,
            ledger,
            notifier,
            observer: Arc::new(TracingObserver),
            limit: DEFAULT_LIMIT,
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    /// FETCHING + FILTERING. Returns the candidate count and the ranked items.
    async fn collect(&self) -> (usize, Vec<TrendItem>) {
        let candidates = aggregate(&self.adapters, self.observer.as_ref(), self.adapter_timeout).await;
        let found = candidates.len();

        let ledger = match self.ledger.try_load().await {
            Ok(l) => l,
            Err(e) => {
                self.observer.on_event(&PipelineEvent::LedgerUnreadable {
                    reason: format!("{e:#}"),
                });
                Default::default()
            }
        };

        let ranked = select(candidates, &ledger, self.limit);
        tracing::debug!(
            found,
            selected = ranked.len(),
            ledger = ledger.len(),
            "candidates filtered"
        );
        (found, ranked)
    }

    /// Ranked items a run would send right now, without sending or committing.
    pub async fn preview(&self) -> Vec<TrendItem> {
        self.collect().await.1
    }

    pub async fn run(&self) -> RunReport {
        let report = self.run_inner().await;
        self.observer.on_event(&PipelineEvent::RunFinished {
            outcome: report.outcome,
            found: report.found,
            sent: report.sent,
        });
        report
    }

    async fn run_inner(&self) -> RunReport {
        let (found, ranked) = self.collect().await;
        let selected = ranked.len();
        let report = |outcome, sent| RunReport {
            outcome,
            found,
            selected,
            sent,
        };

        if ranked.is_empty() {
            return report(RunOutcome::NothingNew, 0);
        }

        if !self.notifier.send(&ranked).await {
            return report(RunOutcome::NotificationFailed, 0);
        }

        let sent_urls = ranked.iter().map(|it| it.url().to_string());
        match self.ledger.commit(sent_urls, Utc::now()).await {
            Ok(_) => report(RunOutcome::Delivered, selected),
            Err(e) => {
                self.observer.on_event(&PipelineEvent::CommitFailed {
                    reason: format!("{e:#}"),
                });
                report(RunOutcome::CommitFailed, selected)
            }
        }
    }
}
