//! Analyses the time-ordered price history of a watched product: latest
//! price movement, window statistics and target-price achievement.
//!
//! All functions are pure and sort the history themselves (most recent
//! first, ties broken by ID), so callers may pass records in any order.

use std::ops::RangeInclusive;

use time::{Date, OffsetDateTime};

use crate::price_history::PriceHistory;

/// The movement between the two most recent price observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceDelta {
    /// The most recent observed price.
    pub current: f64,
    /// The observation immediately before it.
    pub previous: f64,
    /// `(previous - current) / previous * 100`, unrounded. Positive values
    /// are drops; zero or negative values mean the price held or rose.
    pub drop_percent: f64,
}

/// Price statistics over a date window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceWindowStats {
    /// The lowest price observed in the window.
    pub min: f64,
    /// The highest price observed in the window.
    pub max: f64,
    /// The mean price over the window.
    pub avg: f64,
    /// How many observations fell inside the window.
    pub samples: usize,
}

/// A price drop relative to where the price sat at a cutoff datetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecentDrop {
    /// The price as of the cutoff.
    pub old_price: f64,
    /// The current price.
    pub current_price: f64,
    /// `old_price - current_price`, unrounded.
    pub drop_amount: f64,
    /// The drop as a percentage of `old_price`, unrounded.
    pub drop_percent: f64,
}

fn sorted_most_recent_first(history: &[PriceHistory]) -> Vec<&PriceHistory> {
    let mut sorted: Vec<&PriceHistory> = history.iter().collect();
    sorted.sort_by_key(|record| std::cmp::Reverse((record.datetime, record.id)));
    sorted
}

/// The movement between the two most recent observations, or `None` when
/// fewer than two exist.
///
/// A single data point gives nothing to compare against, so such histories
/// are excluded from drop rankings rather than compared against an arbitrary
/// value.
pub fn latest_delta(history: &[PriceHistory]) -> Option<PriceDelta> {
    let sorted = sorted_most_recent_first(history);

    match sorted.as_slice() {
        [current, previous, ..] => Some(PriceDelta {
            current: current.price,
            previous: previous.price,
            drop_percent: (previous.price - current.price) / previous.price * 100.0,
        }),
        _ => None,
    }
}

/// Min/max/mean over the observations whose datetime falls on a day inside
/// `window`, or `None` when the window holds no observations.
pub fn window_stats(
    history: &[PriceHistory],
    window: &RangeInclusive<Date>,
) -> Option<PriceWindowStats> {
    let prices: Vec<f64> = history
        .iter()
        .filter(|record| window.contains(&record.datetime.date()))
        .map(|record| record.price)
        .collect();

    if prices.is_empty() {
        return None;
    }

    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = prices.iter().sum::<f64>() / prices.len() as f64;

    Some(PriceWindowStats {
        min,
        max,
        avg,
        samples: prices.len(),
    })
}

/// The most recent observation at or before `cutoff`: the price the product
/// sat at when the lookback window opened.
pub fn baseline_at(history: &[PriceHistory], cutoff: OffsetDateTime) -> Option<&PriceHistory> {
    sorted_most_recent_first(history)
        .into_iter()
        .find(|record| record.datetime <= cutoff)
}

/// Compare `current_price` against the baseline price at `cutoff`.
///
/// Returns `None` when there is no observation at or before the cutoff
/// (nothing meaningful to compare against) or when the price has not
/// dropped.
pub fn recent_drop(
    history: &[PriceHistory],
    current_price: f64,
    cutoff: OffsetDateTime,
) -> Option<RecentDrop> {
    let baseline = baseline_at(history, cutoff)?;

    if current_price >= baseline.price {
        return None;
    }

    let drop_amount = baseline.price - current_price;

    Some(RecentDrop {
        old_price: baseline.price,
        current_price,
        drop_amount,
        drop_percent: drop_amount / baseline.price * 100.0,
    })
}

/// Whether the current price has reached the user's target: both prices are
/// known and `current <= target`.
pub fn target_achieved(current_price: Option<f64>, target_price: Option<f64>) -> bool {
    match (current_price, target_price) {
        (Some(current), Some(target)) => current <= target,
        _ => false,
    }
}
