//! The spending view: totals, averages and breakdowns of the transactions in
//! one calendar month.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    aggregate::{group_and_sum, group_stats_ordered, round2, top_n},
    transaction::list_transactions,
    window::{days_in_window, month_window},
};

/// The label used for transactions without a category.
const UNCATEGORIZED: &str = "Uncategorized";
/// The label used for transactions without a merchant.
const UNKNOWN_MERCHANT: &str = "Unknown";

/// One merchant's share of the month, used in the top-merchants ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantSpend {
    /// The merchant's name, or "Unknown" for transactions without one.
    pub merchant: String,
    /// The sum the merchant was paid over the month.
    pub total: f64,
    /// How many transactions the merchant appears on.
    pub transaction_count: usize,
}

/// The spending breakdown for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingDashboard {
    /// Total spend over the month.
    pub total_amount: f64,
    /// How many transactions fell inside the month.
    pub transaction_count: usize,
    /// Mean spend per transaction. 0 with no transactions.
    pub avg_transaction: f64,
    /// Mean spend per calendar day of the month. 0 with no transactions.
    pub avg_daily: f64,
    /// Spend per category, transactions without one bucketed under
    /// "Uncategorized". Sorted by category name.
    pub by_category: BTreeMap<String, f64>,
    /// The top 10 merchants by total spend, biggest first.
    pub top_merchants: Vec<MerchantSpend>,
}

/// Build the spending view for the month given by `year`/`month`, defaulting
/// to the month containing `today`.
///
/// The resolved window is applied to the transaction query itself, so
/// transactions from adjacent months never contribute.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidMonth] if `month` is outside 1-12,
/// - or [Error::SqlError] if there is an unexpected SQL error.
pub fn spending_view(
    year: Option<i32>,
    month: Option<u8>,
    today: Date,
    connection: &Connection,
) -> Result<SpendingDashboard, Error> {
    let window = month_window(year, month, today)?;
    let days = days_in_window(&window);

    let transactions = list_transactions(Some(window), connection)?;

    let total_amount: f64 = transactions
        .iter()
        .map(|transaction| transaction.total_amount)
        .sum();
    let transaction_count = transactions.len();

    // Guard the averages so an empty month reports zeros, not NaN.
    let avg_transaction = if transaction_count > 0 {
        total_amount / transaction_count as f64
    } else {
        0.0
    };
    let avg_daily = if transaction_count > 0 {
        total_amount / days as f64
    } else {
        0.0
    };

    let by_category = group_and_sum(
        &transactions,
        |transaction| {
            transaction
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_owned())
        },
        |transaction| transaction.total_amount,
    )
    .into_iter()
    .map(|(category, total)| (category, round2(total)))
    .collect();

    // First-seen order, so merchants tied on total rank deterministically.
    let merchant_totals = group_stats_ordered(
        &transactions,
        |transaction| {
            transaction
                .merchant
                .clone()
                .unwrap_or_else(|| UNKNOWN_MERCHANT.to_owned())
        },
        |transaction| transaction.total_amount,
    );

    let top_merchants = top_n(&merchant_totals, 10, |(_, stats)| stats.total)
        .into_iter()
        .map(|(merchant, stats)| MerchantSpend {
            merchant: merchant.clone(),
            total: round2(stats.total),
            transaction_count: stats.count,
        })
        .collect();

    Ok(SpendingDashboard {
        total_amount: round2(total_amount),
        transaction_count,
        avg_transaction: round2(avg_transaction),
        avg_daily: round2(avg_daily),
        by_category,
        top_merchants,
    })
}
