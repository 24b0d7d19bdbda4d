//! The home cards: the three at-a-glance numbers shown on the landing page.

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    aggregate::round2,
    item::{ItemStatus, list_items_with_usage},
    metrics::item_metrics,
    transaction::list_transactions,
    trend::target_achieved,
    watchlist::{WatchlistStatus, list_watchlists},
    window::month_window,
};

/// An item is considered idle once it has gone unused this many whole days.
pub const IDLE_THRESHOLD_DAYS: i64 = 30;

/// The summary numbers for the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HomeCards {
    /// Total spend in the calendar month containing today.
    pub monthly_expense: f64,
    /// How many active items have gone unused for more than 30 days.
    pub idle_items_count: usize,
    /// How many watched products have reached their target price.
    pub price_drop_alerts: usize,
}

/// Build the home cards as of `today`.
///
/// The monthly expense is scoped to the calendar month containing `today` in
/// the query itself, so adjacent-month transactions never leak in.
pub fn home_cards(today: Date, connection: &Connection) -> Result<HomeCards, Error> {
    // The current month is always valid, so the window cannot fail here.
    let window = month_window(None, None, today)?;

    let monthly_expense = list_transactions(Some(window), connection)?
        .iter()
        .map(|transaction| transaction.total_amount)
        .sum();

    let idle_items_count = list_items_with_usage(Some(ItemStatus::Active), connection)?
        .iter()
        .filter(|entry| {
            item_metrics(&entry.item, &entry.usage_logs, today).idle_days > IDLE_THRESHOLD_DAYS
        })
        .count();

    let price_drop_alerts = list_watchlists(Some(WatchlistStatus::Watching), connection)?
        .iter()
        .filter(|watchlist| target_achieved(watchlist.current_price, watchlist.target_price))
        .count();

    Ok(HomeCards {
        monthly_expense: round2(monthly_expense),
        idle_items_count,
        price_drop_alerts,
    })
}

#[cfg(test)]
mod home_cards_tests {
    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        db::initialize,
        item::{ItemBuilder, create_item},
        transaction::{TransactionBuilder, create_transaction},
        usage_log::{UsageLogBuilder, create_usage_log},
        watchlist::{WatchlistBuilder, WatchlistStatus, create_watchlist},
    };

    use super::home_cards;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn empty_database_gives_all_zero_cards() {
        let conn = get_test_connection();

        let cards = home_cards(date!(2024 - 06 - 17), &conn).unwrap();

        assert_eq!(cards.monthly_expense, 0.0);
        assert_eq!(cards.idle_items_count, 0);
        assert_eq!(cards.price_drop_alerts, 0);
    }

    #[test]
    fn monthly_expense_only_counts_the_current_month() {
        let conn = get_test_connection();

        create_transaction(
            TransactionBuilder::new(40.0).datetime(datetime!(2024-06-05 12:00 UTC)),
            &conn,
        )
        .unwrap();
        create_transaction(
            TransactionBuilder::new(60.0).datetime(datetime!(2024-06-28 12:00 UTC)),
            &conn,
        )
        .unwrap();
        // Adjacent months must not leak in.
        create_transaction(
            TransactionBuilder::new(999.0).datetime(datetime!(2024-05-31 23:00 UTC)),
            &conn,
        )
        .unwrap();
        create_transaction(
            TransactionBuilder::new(999.0).datetime(datetime!(2024-07-01 01:00 UTC)),
            &conn,
        )
        .unwrap();

        let cards = home_cards(date!(2024 - 06 - 17), &conn).unwrap();

        assert_eq!(cards.monthly_expense, 100.0);
    }

    #[test]
    fn idle_count_includes_long_idle_items_but_not_recently_used_ones() {
        let conn = get_test_connection();
        let today = date!(2024 - 06 - 17);

        // Bought 40 days ago, never used: idle.
        create_item(
            ItemBuilder::new("Bread maker", date!(2024 - 05 - 08), 150.0),
            &conn,
        )
        .unwrap();
        // Bought long ago but used yesterday: not idle.
        let bike = create_item(
            ItemBuilder::new("Gravel bike", date!(2023 - 01 - 01), 1800.0),
            &conn,
        )
        .unwrap();
        create_usage_log(UsageLogBuilder::new(bike.id, date!(2024 - 06 - 16)), &conn).unwrap();

        let cards = home_cards(today, &conn).unwrap();

        assert_eq!(cards.idle_items_count, 1);
    }

    #[test]
    fn price_drop_alerts_counts_watching_entries_at_or_below_target() {
        let conn = get_test_connection();
        let now = datetime!(2024-06-01 00:00 UTC);

        create_watchlist(
            WatchlistBuilder::new("Headphones", "AudioMart")
                .current_price(90.0)
                .target_price(100.0),
            now,
            &conn,
        )
        .unwrap();
        create_watchlist(
            WatchlistBuilder::new("Monitor", "ScreenHub")
                .current_price(110.0)
                .target_price(100.0),
            now,
            &conn,
        )
        .unwrap();
        // Target achieved but already bought: not an alert.
        create_watchlist(
            WatchlistBuilder::new("Keyboard", "KeyCo")
                .current_price(50.0)
                .target_price(100.0)
                .status(WatchlistStatus::Purchased),
            now,
            &conn,
        )
        .unwrap();

        let cards = home_cards(date!(2024 - 06 - 17), &conn).unwrap();

        assert_eq!(cards.price_drop_alerts, 1);
    }
}
