use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::memory::codec::format_date;
use crate::memory::types::{MemoryRecord, MAX_RATING, MIN_RATING};

/// Summary of a record set.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_memories: u64,
    pub synced_memories: u64,
    pub pending_memories: u64,
    /// Mean star rating, `0.0` for an empty set.
    pub average_rating: f64,
    /// Count per star value; every value from 1 to 5 is present.
    pub by_rating: BTreeMap<u8, u64>,
    /// Records added in the current calendar month (UTC).
    pub memories_this_month: u64,
    /// Name of the most recently added record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_recent_dish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_memory: Option<String>,
}

/// Compute statistics over the given records.
pub fn memory_stats(records: &[MemoryRecord]) -> StatsResponse {
    memory_stats_at(records, Utc::now())
}

/// Same as [`memory_stats`], with "this month" taken relative to `now`.
pub fn memory_stats_at(records: &[MemoryRecord], now: DateTime<Utc>) -> StatsResponse {
    let total = records.len() as u64;
    let pending = records.iter().filter(|r| r.is_pending()).count() as u64;

    let mut by_rating: BTreeMap<u8, u64> = (MIN_RATING..=MAX_RATING).map(|r| (r, 0)).collect();
    for record in records {
        *by_rating.entry(record.rating.get()).or_default() += 1;
    }

    let average_rating = if records.is_empty() {
        0.0
    } else {
        let sum: u64 = records.iter().map(|r| u64::from(r.rating.get())).sum();
        sum as f64 / total as f64
    };

    let oldest = records.iter().map(|r| r.date_added).min();
    let newest = records.iter().max_by_key(|r| r.date_added);
    let this_month = records
        .iter()
        .filter(|r| r.date_added.year() == now.year() && r.date_added.month() == now.month())
        .count() as u64;

    StatsResponse {
        total_memories: total,
        synced_memories: total - pending,
        pending_memories: pending,
        average_rating,
        by_rating,
        memories_this_month: this_month,
        most_recent_dish: newest.map(|r| r.name.clone()),
        oldest_memory: oldest.as_ref().map(format_date),
        newest_memory: newest.map(|r| format_date(&r.date_added)),
    }
}
