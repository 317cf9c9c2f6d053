// src/rank.rs
//! Dedup + ranking: pure, no I/O.
//!
//! Policy for a url seen more than once in one run: last-seen-wins, and the
//! surviving copy keeps its own (last) position for tie ordering.

use std::collections::HashMap;

use crate::ingest::types::TrendItem;
use crate::ledger::DeliveryLedger;

pub const DEFAULT_LIMIT: usize = 20;

/// Filter `candidates` against `ledger`, collapse duplicate urls, sort by
/// popularity (descending, stable) and keep at most `limit`.
pub fn select(candidates: Vec<TrendItem>, ledger: &DeliveryLedger, limit: usize) -> Vec<TrendItem> {
    // 1) + 2) re-validate, drop already delivered
    let fresh: Vec<TrendItem> = candidates
        .into_iter()
        .filter(|it| !it.url().trim().is_empty() && !it.title().trim().is_empty())
        .filter(|it| !ledger.contains(it.url()))
        .collect();

    // 3) last occurrence of each url wins
    let mut last_idx: HashMap<&str, usize> = HashMap::with_capacity(fresh.len());
    for (i, it) in fresh.iter().enumerate() {
        last_idx.insert(it.url(), i);
    }
    let keep: Vec<bool> = fresh
        .iter()
        .enumerate()
        .map(|(i, it)| last_idx.get(it.url()) == Some(&i))
        .collect();
    let mut unique: Vec<TrendItem> = fresh
        .into_iter()
        .zip(keep)
        .filter_map(|(it, k)| k.then_some(it))
        .collect();

    // 4) `sort_by` is stable: equal popularity keeps candidate order
    unique.sort_by(|a, b| b.popularity().cmp(&a.popularity()));

    // 5)
    unique.truncate(limit);
    unique
}
