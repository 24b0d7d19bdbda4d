//! Derived, per-item metrics computed from an item and its usage logs.
//!
//! These values are never stored; they are recomputed from the current
//! usage-log state on every request so they cannot go stale. The reference
//! day is injected for reproducible results.

use time::Date;

use crate::{item::Item, usage_log::UsageLog};

/// The derived attributes of an item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemMetrics {
    /// How many usage logs the item has.
    pub usage_count: usize,
    /// The most recent day the item was used, if ever.
    pub last_used: Option<Date>,
    /// Whole days since the item was last used, or since purchase if never
    /// used. Never negative.
    pub idle_days: i64,
    /// The purchase price amortised over the number of uses. For an item that
    /// was never used this is the full purchase price.
    pub cost_per_use: f64,
}

/// Compute the derived metrics for `item` given all of its usage logs.
///
/// `last_used` picks the maximum log date; ties are broken by the highest log
/// ID so the result is deterministic regardless of input order. `idle_days`
/// truncates to whole days and is clamped at 0 in case the reference date
/// sits in the future (clock skew or bad input).
pub fn item_metrics(item: &Item, usage_logs: &[UsageLog], today: Date) -> ItemMetrics {
    let last_used = usage_logs
        .iter()
        .max_by_key(|log| (log.date, log.id))
        .map(|log| log.date);

    let reference_date = last_used.unwrap_or(item.purchase_date);
    let idle_days = (today - reference_date).whole_days().max(0);

    let usage_count = usage_logs.len();
    let cost_per_use = if usage_count > 0 {
        item.purchase_price / usage_count as f64
    } else {
        item.purchase_price
    };

    ItemMetrics {
        usage_count,
        last_used,
        idle_days,
        cost_per_use,
    }
}

/// The average satisfaction across the logs that carry a rating, or `None`
/// when no log was rated.
pub fn average_satisfaction(usage_logs: &[UsageLog]) -> Option<f64> {
    let rated: Vec<i64> = usage_logs
        .iter()
        .filter_map(|log| log.satisfaction)
        .collect();

    if rated.is_empty() {
        return None;
    }

    Some(rated.iter().sum::<i64>() as f64 / rated.len() as f64)
}
