// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod ingest;
pub mod ledger;
pub mod metrics;
pub mod notify;
pub mod observer;
pub mod pipeline;
pub mod rank;

// ---- Re-exports for stable public API ----
pub use crate::ingest::types::{SourceAdapter, TrendItem};
pub use crate::ledger::{DeliveryLedger, LedgerStore};
pub use crate::notify::Notifier;
pub use crate::observer::{PipelineEvent, PipelineObserver, TracingObserver};
pub use crate::pipeline::{DigestPipeline, RunOutcome, RunReport};
pub use crate::rank::select;
