// src/observer.rs
//! Structured run events.
//!
//! The pipeline never logs directly; it reports `PipelineEvent`s to an injected
//! `PipelineObserver`. `TracingObserver` is the production sink (tracing +
//! metrics counters); tests plug in a recorder.

use metrics::counter;

use crate::pipeline::RunOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    AdapterFailed { adapter: String, reason: String },
    LedgerUnreadable { reason: String },
    CommitFailed { reason: String },
    RunFinished {
        outcome: RunOutcome,
        found: usize,
        sent: usize,
    },
}

pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::AdapterFailed { adapter, reason } => {
                tracing::warn!(adapter = %adapter, error = %reason, "adapter failed, continuing without it");
                counter!("digest_adapter_errors_total", "adapter" => adapter.clone()).increment(1);
            }
            PipelineEvent::LedgerUnreadable { reason } => {
                tracing::warn!(error = %reason, "delivery ledger unreadable, starting from empty");
            }
            PipelineEvent::CommitFailed { reason } => {
                tracing::error!(error = %reason, "delivery ledger commit failed; sent items may be re-delivered");
                counter!("digest_commit_errors_total").increment(1);
            }
            PipelineEvent::RunFinished {
                outcome,
                found,
                sent,
            } => {
                if outcome.is_success() {
                    tracing::info!(outcome = outcome.as_str(), found, sent, "digest run finished");
                } else {
                    tracing::error!(outcome = outcome.as_str(), found, sent, "digest run failed");
                }
                counter!("digest_runs_total", "outcome" => outcome.as_str()).increment(1);
                counter!("digest_items_sent_total").increment(*sent as u64);
            }
        }
    }
}
