//! Generic grouping, summing and ranking used by the dashboard views.
//!
//! Callers supply closures for the grouping key and the summed value, which
//! is also where missing keys get mapped to sentinel labels such as
//! "Uncategorized" so that no record is silently dropped.

use std::collections::HashMap;
use std::hash::Hash;

/// Per-group record count and value total.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupStats {
    /// How many records fell into the group.
    pub count: usize,
    /// The sum of the grouped value.
    pub total: f64,
}

/// Group `records` by `key_fn` and sum `value_fn` within each group.
pub fn group_and_sum<T, K, KF, VF>(records: &[T], key_fn: KF, value_fn: VF) -> HashMap<K, f64>
where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
    VF: Fn(&T) -> f64,
{
    let mut totals = HashMap::new();

    for record in records {
        *totals.entry(key_fn(record)).or_insert(0.0) += value_fn(record);
    }

    totals
}

/// Group `records` by `key_fn`, tracking both the count and the sum of
/// `value_fn` per group.
pub fn group_stats<T, K, KF, VF>(records: &[T], key_fn: KF, value_fn: VF) -> HashMap<K, GroupStats>
where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
    VF: Fn(&T) -> f64,
{
    let mut stats: HashMap<K, GroupStats> = HashMap::new();

    for record in records {
        let entry = stats.entry(key_fn(record)).or_default();
        entry.count += 1;
        entry.total += value_fn(record);
    }

    stats
}

/// Group `records` by `key_fn` like [group_stats], but keep the groups in
/// the order their key was first seen.
///
/// Use this when the groups feed a ranking: [top_n] breaks ties by input
/// order, so ranking a `HashMap`'s iteration order would make tied groups
/// come out differently from run to run.
pub fn group_stats_ordered<T, K, KF, VF>(
    records: &[T],
    key_fn: KF,
    value_fn: VF,
) -> Vec<(K, GroupStats)>
where
    K: Eq + Hash + Clone,
    KF: Fn(&T) -> K,
    VF: Fn(&T) -> f64,
{
    let mut groups: Vec<(K, GroupStats)> = Vec::new();
    let mut indices: HashMap<K, usize> = HashMap::new();

    for record in records {
        let key = key_fn(record);
        let index = match indices.get(&key) {
            Some(&index) => index,
            None => {
                groups.push((key.clone(), GroupStats::default()));
                indices.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };

        let (_, stats) = &mut groups[index];
        stats.count += 1;
        stats.total += value_fn(record);
    }

    groups
}

/// The top `n` records by `metric_fn`, descending.
///
/// The sort is stable, so records with equal metrics keep their input order
/// (first seen wins). Asking for more records than exist returns them all.
pub fn top_n<T, MF>(records: &[T], n: usize, metric_fn: MF) -> Vec<&T>
where
    MF: Fn(&T) -> f64,
{
    let mut ranked: Vec<&T> = records.iter().collect();
    ranked.sort_by(|a, b| metric_fn(b).total_cmp(&metric_fn(a)));
    ranked.truncate(n);
    ranked
}

/// Round a value to 2 decimal places for presentation.
///
/// Aggregation and ranking always work on unrounded values; only the response
/// structs round.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
