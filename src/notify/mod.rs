// src/notify/mod.rs
pub mod email;
pub mod render;

use crate::ingest::types::TrendItem;

pub use email::EmailNotifier;
pub use render::Digest;

/// Delivery channel for a ranked digest.
///
/// `send` returns `true` only when the digest was actually handed off; every
/// failure is logged inside the implementation and reported as `false`.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, items: &[TrendItem]) -> bool;
}
