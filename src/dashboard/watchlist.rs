//! The watchlist view: counts plus the price-drop and target-achieved
//! listings.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    DatabaseId, Error,
    aggregate::{round2, top_n},
    trend::{PriceDelta, latest_delta, target_achieved},
    watchlist::{WatchlistStatus, WatchlistWithHistory, list_watchlists_with_history},
};

/// How many price drops the listing carries at most.
const RANKING_SIZE: usize = 10;

/// A watched product whose latest observation is below the one before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceDropEntry {
    /// The ID of the watchlist entry.
    pub id: DatabaseId,
    /// The name of the product.
    pub name: String,
    /// The most recent observed price.
    pub current_price: f64,
    /// The observation immediately before it.
    pub previous_price: f64,
    /// The price at which the user wants to buy.
    pub target_price: Option<f64>,
    /// The drop as a percentage of the previous price, rounded to 2 decimal
    /// places.
    pub drop_percent: f64,
}

/// A watched product whose current price has reached the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetAchievedEntry {
    /// The ID of the watchlist entry.
    pub id: DatabaseId,
    /// The name of the product.
    pub name: String,
    /// The most recent observed price.
    pub current_price: f64,
    /// The price at which the user wants to buy.
    pub target_price: f64,
}

/// The watchlist summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistDashboard {
    /// How many entries exist across all lifecycle statuses.
    pub total_watched: usize,
    /// How many entries are still being watched.
    pub watching_count: usize,
    /// How many entries dropped between their last two observations.
    pub price_drops_count: usize,
    /// How many watched entries reached their target price.
    pub target_achieved_count: usize,
    /// The top 10 drops by percentage, biggest first. Entries with fewer
    /// than two observations never appear.
    pub price_drops: Vec<PriceDropEntry>,
    /// The watched entries that reached their target, most important first.
    pub target_achieved: Vec<TargetAchievedEntry>,
}

/// Build the watchlist view.
pub fn watchlist_view(connection: &Connection) -> Result<WatchlistDashboard, Error> {
    let watchlists = list_watchlists_with_history(connection)?;

    let total_watched = watchlists.len();
    let watching_count = watchlists
        .iter()
        .filter(|entry| entry.watchlist.status == WatchlistStatus::Watching)
        .count();

    // Keep the raw delta alongside the entry so ranking never compares
    // rounded values.
    let drops: Vec<(&WatchlistWithHistory, PriceDelta)> = watchlists
        .iter()
        .filter_map(|entry| {
            let delta = latest_delta(&entry.price_history)?;

            (delta.drop_percent > 0.0).then_some((entry, delta))
        })
        .collect();
    let price_drops_count = drops.len();

    let price_drops = top_n(&drops, RANKING_SIZE, |(_, delta)| delta.drop_percent)
        .into_iter()
        .map(|(entry, delta)| PriceDropEntry {
            id: entry.watchlist.id,
            name: entry.watchlist.name.clone(),
            current_price: delta.current,
            previous_price: delta.previous,
            target_price: entry.watchlist.target_price,
            drop_percent: round2(delta.drop_percent),
        })
        .collect();

    let target_achieved: Vec<TargetAchievedEntry> = watchlists
        .iter()
        .filter(|entry| {
            entry.watchlist.status == WatchlistStatus::Watching
                && target_achieved(
                    entry.watchlist.current_price,
                    entry.watchlist.target_price,
                )
        })
        .filter_map(|entry| {
            Some(TargetAchievedEntry {
                id: entry.watchlist.id,
                name: entry.watchlist.name.clone(),
                current_price: entry.watchlist.current_price?,
                target_price: entry.watchlist.target_price?,
            })
        })
        .collect();
    let target_achieved_count = target_achieved.len();

    Ok(WatchlistDashboard {
        total_watched,
        watching_count,
        price_drops_count,
        target_achieved_count,
        price_drops,
        target_achieved,
    })
}

#[cfg(test)]
mod watchlist_view_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        db::initialize,
        price_history::append_price_history,
        watchlist::{WatchlistBuilder, WatchlistStatus, create_watchlist},
    };

    use super::watchlist_view;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn empty_watchlist_gives_an_all_zero_view() {
        let conn = get_test_connection();

        let view = watchlist_view(&conn).unwrap();

        assert_eq!(view.total_watched, 0);
        assert_eq!(view.watching_count, 0);
        assert!(view.price_drops.is_empty());
        assert!(view.target_achieved.is_empty());
    }

    #[test]
    fn price_drops_need_two_observations_and_a_fall() {
        let conn = get_test_connection();

        // Two observations, price fell 20%.
        let dropped = create_watchlist(
            WatchlistBuilder::new("Headphones", "AudioMart")
                .current_price(100.0)
                .target_price(75.0),
            datetime!(2024-06-01 00:00 UTC),
            &conn,
        )
        .unwrap();
        append_price_history(
            dropped.id,
            80.0,
            None,
            None,
            datetime!(2024-06-10 00:00 UTC),
            &conn,
        )
        .unwrap();

        // Two observations, price rose.
        let rose = create_watchlist(
            WatchlistBuilder::new("Monitor", "ScreenHub").current_price(100.0),
            datetime!(2024-06-01 00:00 UTC),
            &conn,
        )
        .unwrap();
        append_price_history(
            rose.id,
            120.0,
            None,
            None,
            datetime!(2024-06-10 00:00 UTC),
            &conn,
        )
        .unwrap();

        // Single observation, nothing to compare.
        create_watchlist(
            WatchlistBuilder::new("Keyboard", "KeyCo").current_price(50.0),
            datetime!(2024-06-01 00:00 UTC),
            &conn,
        )
        .unwrap();

        let view = watchlist_view(&conn).unwrap();

        assert_eq!(view.total_watched, 3);
        assert_eq!(view.price_drops_count, 1);
        assert_eq!(view.price_drops[0].name, "Headphones");
        assert_eq!(view.price_drops[0].current_price, 80.0);
        assert_eq!(view.price_drops[0].previous_price, 100.0);
        assert_eq!(view.price_drops[0].target_price, Some(75.0));
        assert_eq!(view.price_drops[0].drop_percent, 20.0);
    }

    #[test]
    fn target_achieved_only_lists_watching_entries_at_or_below_target() {
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
        create_watchlist(
            WatchlistBuilder::new("Keyboard", "KeyCo")
                .current_price(50.0)
                .target_price(100.0)
                .status(WatchlistStatus::Purchased),
            now,
            &conn,
        )
        .unwrap();

        let view = watchlist_view(&conn).unwrap();

        assert_eq!(view.watching_count, 2);
        assert_eq!(view.target_achieved_count, 1);
        assert_eq!(view.target_achieved[0].name, "Headphones");
        assert_eq!(view.target_achieved[0].current_price, 90.0);
        assert_eq!(view.target_achieved[0].target_price, 100.0);
    }
}
