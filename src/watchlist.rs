//! This file defines the `Watchlist` type, its status, the store functions
//! for watched products, and the API routes for watchlist analytics (price
//! statistics, target-price alerts and recent drops).

use std::{fmt::Display, str::FromStr};

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, DatabaseId, Error,
    aggregate::round2,
    db::{CreateTable, MapRow},
    price_history::PriceHistory,
    trend,
    window::trailing_window,
};

/// Where a watched product is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchlistStatus {
    /// Still waiting for the right price.
    Watching,
    /// Bought, kept for reference.
    Purchased,
    /// No longer wanted.
    Cancelled,
    /// The vendor has no stock.
    OutOfStock,
}

impl WatchlistStatus {
    /// The status as the string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchlistStatus::Watching => "watching",
            WatchlistStatus::Purchased => "purchased",
            WatchlistStatus::Cancelled => "cancelled",
            WatchlistStatus::OutOfStock => "out_of_stock",
        }
    }
}

impl Display for WatchlistStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The error returned when a string does not name a valid [WatchlistStatus].
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("\"{0}\" is not a valid watchlist status")]
pub struct ParseWatchlistStatusError(String);

impl FromStr for WatchlistStatus {
    type Err = ParseWatchlistStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watching" => Ok(WatchlistStatus::Watching),
            "purchased" => Ok(WatchlistStatus::Purchased),
            "cancelled" => Ok(WatchlistStatus::Cancelled),
            "out_of_stock" => Ok(WatchlistStatus::OutOfStock),
            other => Err(ParseWatchlistStatusError(other.to_owned())),
        }
    }
}

impl ToSql for WatchlistStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for WatchlistStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A product the user is waiting to buy at the right price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    /// The ID of the watchlist entry.
    pub id: DatabaseId,
    /// The name of the product.
    pub name: String,
    /// The vendor being watched.
    pub vendor: String,
    /// The most recently observed price.
    pub current_price: Option<f64>,
    /// The price at which the user wants to buy.
    pub target_price: Option<f64>,
    /// How much the user wants the product. Higher is more important.
    pub priority: i64,
    /// Where the entry is in its lifecycle.
    pub status: WatchlistStatus,
}

/// A watchlist snapshot together with all of its price history, as consumed
/// by the trend analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistWithHistory {
    /// The watchlist entry.
    pub watchlist: Watchlist,
    /// Every price observation recorded against the entry.
    pub price_history: Vec<PriceHistory>,
}

/// Builds a [Watchlist] to be inserted with [create_watchlist].
#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistBuilder {
    name: String,
    vendor: String,
    current_price: Option<f64>,
    target_price: Option<f64>,
    priority: i64,
    status: WatchlistStatus,
}

impl WatchlistBuilder {
    /// Create a builder for a watched product at `vendor`.
    pub fn new(name: &str, vendor: &str) -> Self {
        Self {
            name: name.to_owned(),
            vendor: vendor.to_owned(),
            current_price: None,
            target_price: None,
            priority: 0,
            status: WatchlistStatus::Watching,
        }
    }

    /// Set the price the product currently sells for.
    pub fn current_price(mut self, current_price: f64) -> Self {
        self.current_price = Some(current_price);
        self
    }

    /// Set the price at which the user wants to buy.
    pub fn target_price(mut self, target_price: f64) -> Self {
        self.target_price = Some(target_price);
        self
    }

    /// Set how much the user wants the product.
    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set the entry's lifecycle status.
    pub fn status(mut self, status: WatchlistStatus) -> Self {
        self.status = status;
        self
    }
}

/// Create a new watchlist entry in the database.
///
/// If the builder carries a current price, an initial price-history record
/// stamped `now` is created in the same SQL transaction so that trend
/// analysis has a starting point.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn create_watchlist(
    builder: WatchlistBuilder,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Watchlist, Error> {
    let tx = connection.unchecked_transaction()?;

    let watchlist = tx
        .prepare(
            "INSERT INTO watchlist (name, vendor, current_price, target_price, priority, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, name, vendor, current_price, target_price, priority, status",
        )?
        .query_row(
            (
                builder.name,
                builder.vendor,
                builder.current_price,
                builder.target_price,
                builder.priority,
                builder.status,
            ),
            Watchlist::map_row,
        )?;

    if let Some(price) = watchlist.current_price {
        tx.execute(
            "INSERT INTO price_history (watchlist_id, datetime, price, vendor, availability)
             VALUES (?1, ?2, ?3, ?4, 'available')",
            (watchlist.id, now, price, &watchlist.vendor),
        )?;
    }

    tx.commit()?;

    Ok(watchlist)
}

/// Retrieve a watchlist entry by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid watchlist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_watchlist(id: DatabaseId, connection: &Connection) -> Result<Watchlist, Error> {
    let watchlist = connection
        .prepare(
            "SELECT id, name, vendor, current_price, target_price, priority, status
             FROM watchlist WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], Watchlist::map_row)?;

    Ok(watchlist)
}

/// Retrieve watchlist entries, optionally restricted to a lifecycle `status`,
/// most important first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn list_watchlists(
    status: Option<WatchlistStatus>,
    connection: &Connection,
) -> Result<Vec<Watchlist>, Error> {
    const COLUMNS: &str = "id, name, vendor, current_price, target_price, priority, status";

    let collect = |rows: Result<Vec<Watchlist>, rusqlite::Error>| rows.map_err(Error::SqlError);

    match status {
        Some(status) => collect(
            connection
                .prepare(&format!(
                    "SELECT {COLUMNS} FROM watchlist
                     WHERE status = ?1
                     ORDER BY priority DESC, id DESC"
                ))?
                .query_map([status], Watchlist::map_row)?
                .collect(),
        ),
        None => collect(
            connection
                .prepare(&format!(
                    "SELECT {COLUMNS} FROM watchlist ORDER BY priority DESC, id DESC"
                ))?
                .query_map([], Watchlist::map_row)?
                .collect(),
        ),
    }
}

/// Retrieve watchlist entries, each paired with all of its price history
/// (most recent observation first).
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn list_watchlists_with_history(
    connection: &Connection,
) -> Result<Vec<WatchlistWithHistory>, Error> {
    let rows: Vec<(Watchlist, Option<PriceHistory>)> = connection
        .prepare(
            "SELECT w.id, w.name, w.vendor, w.current_price, w.target_price, w.priority, w.status,
                    h.id, h.watchlist_id, h.datetime, h.price, h.vendor, h.availability, h.shipping
             FROM watchlist w
             LEFT JOIN price_history h ON h.watchlist_id = w.id
             ORDER BY w.priority DESC, w.id DESC, h.datetime DESC, h.id DESC",
        )?
        .query_map([], |row| {
            let watchlist = Watchlist::map_row(row)?;
            // NULL history columns for entries with no observations yet.
            let history = match row.get::<_, Option<DatabaseId>>(7)? {
                Some(_) => Some(PriceHistory::map_row_with_offset(row, 7)?),
                None => None,
            };

            Ok((watchlist, history))
        })?
        .collect::<Result<_, rusqlite::Error>>()?;

    let mut watchlists: Vec<WatchlistWithHistory> = Vec::new();

    for (watchlist, history) in rows {
        match watchlists.last_mut() {
            Some(last) if last.watchlist.id == watchlist.id => {
                if let Some(history) = history {
                    last.price_history.push(history);
                }
            }
            _ => watchlists.push(WatchlistWithHistory {
                watchlist,
                price_history: history.into_iter().collect(),
            }),
        }
    }

    Ok(watchlists)
}

impl CreateTable for Watchlist {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS watchlist (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                vendor TEXT NOT NULL,
                current_price REAL,
                target_price REAL,
                priority INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'watching'
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Watchlist {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            vendor: row.get(offset + 2)?,
            current_price: row.get(offset + 3)?,
            target_price: row.get(offset + 4)?,
            priority: row.get(offset + 5)?,
            status: row.get(offset + 6)?,
        })
    }
}

/// Query parameters for the price-statistics route.
#[derive(Debug, Deserialize)]
pub struct PriceStatsParams {
    /// How many days to look back. Defaults to 30.
    #[serde(default = "default_stats_days")]
    pub days: i64,
}

fn default_stats_days() -> i64 {
    30
}

/// Price statistics for one watchlist entry over a trailing window.
#[derive(Debug, PartialEq, Serialize)]
pub struct PriceStatsResponse {
    /// The most recently observed price.
    pub current_price: Option<f64>,
    /// The price at which the user wants to buy.
    pub target_price: Option<f64>,
    /// The lowest price in the window, or null with no data.
    pub min_price: Option<f64>,
    /// The highest price in the window, or null with no data.
    pub max_price: Option<f64>,
    /// The mean price over the window, or null with no data.
    pub avg_price: Option<f64>,
    /// How many observations fell inside the window.
    pub samples: usize,
}

/// Report price statistics for a watchlist entry over the last `days` days.
///
/// A window with no observations yields null min/max/avg and zero samples
/// rather than an error.
pub async fn get_price_stats(
    State(state): State<AppState>,
    Path(watchlist_id): Path<DatabaseId>,
    Query(params): Query<PriceStatsParams>,
) -> Result<Json<PriceStatsResponse>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLock)?;

    let watchlist = get_watchlist(watchlist_id, &connection)?;
    let history = connection
        .prepare(
            "SELECT id, watchlist_id, datetime, price, vendor, availability, shipping
             FROM price_history WHERE watchlist_id = ?1",
        )?
        .query_map([watchlist_id], PriceHistory::map_row)?
        .collect::<Result<Vec<PriceHistory>, rusqlite::Error>>()?;

    let window = trailing_window(params.days, OffsetDateTime::now_utc().date());
    let stats = trend::window_stats(&history, &window);

    Ok(Json(PriceStatsResponse {
        current_price: watchlist.current_price,
        target_price: watchlist.target_price,
        min_price: stats.map(|stats| round2(stats.min)),
        max_price: stats.map(|stats| round2(stats.max)),
        avg_price: stats.map(|stats| round2(stats.avg)),
        samples: stats.map(|stats| stats.samples).unwrap_or(0),
    }))
}

/// The watchlist entries whose price has reached the user's target.
#[derive(Debug, PartialEq, Serialize)]
pub struct PriceDropAlertsResponse {
    /// The entries, most important first.
    pub data: Vec<Watchlist>,
    /// How many entries reached their target.
    pub total: usize,
}

/// List the watched (status `watching`) entries whose current price is at or
/// below the target price.
pub async fn get_price_drop_alerts(
    State(state): State<AppState>,
) -> Result<Json<PriceDropAlertsResponse>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLock)?;

    let data: Vec<Watchlist> = list_watchlists(Some(WatchlistStatus::Watching), &connection)?
        .into_iter()
        .filter(|watchlist| trend::target_achieved(watchlist.current_price, watchlist.target_price))
        .collect();
    let total = data.len();

    Ok(Json(PriceDropAlertsResponse { data, total }))
}

/// Query parameters for the recent-drops route.
#[derive(Debug, Deserialize)]
pub struct RecentDropsParams {
    /// How many days to look back. Defaults to 7.
    #[serde(default = "default_recent_days")]
    pub days: i64,
}

fn default_recent_days() -> i64 {
    7
}

/// A watched product whose price dropped within the lookback window.
#[derive(Debug, PartialEq, Serialize)]
pub struct RecentDropEntry {
    /// The ID of the watchlist entry.
    pub id: DatabaseId,
    /// The name of the product.
    pub name: String,
    /// The price as of the start of the window.
    pub old_price: f64,
    /// The current price.
    pub current_price: f64,
    /// How much the price dropped, rounded to 2 decimal places.
    pub drop_amount: f64,
    /// The drop as a percentage of the old price, rounded to 2 decimal
    /// places.
    pub drop_percent: f64,
}

/// List the watchlist entries whose current price is below where it sat
/// `days` days ago, biggest drop first.
///
/// Entries with no observation at or before the cutoff are excluded rather
/// than compared against an arbitrary point, as are entries with no known
/// current price.
pub async fn get_recent_price_drops(
    State(state): State<AppState>,
    Query(params): Query<RecentDropsParams>,
) -> Result<Json<Vec<RecentDropEntry>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLock)?;

    let watchlists = list_watchlists_with_history(&connection)?;
    let cutoff = OffsetDateTime::now_utc() - Duration::days(params.days.max(0));

    Ok(Json(collect_recent_drops(&watchlists, cutoff)))
}

/// Builds the recent-drops listing from watchlist snapshots. Split out from
/// the handler so it can be tested with a fixed cutoff.
fn collect_recent_drops(
    watchlists: &[WatchlistWithHistory],
    cutoff: OffsetDateTime,
) -> Vec<RecentDropEntry> {
    let mut drops: Vec<(RecentDropEntry, f64)> = watchlists
        .iter()
        .filter_map(|entry| {
            let current_price = entry.watchlist.current_price?;
            let drop = trend::recent_drop(&entry.price_history, current_price, cutoff)?;

            Some((
                RecentDropEntry {
                    id: entry.watchlist.id,
                    name: entry.watchlist.name.clone(),
                    old_price: drop.old_price,
                    current_price: drop.current_price,
                    drop_amount: round2(drop.drop_amount),
                    drop_percent: round2(drop.drop_percent),
                },
                drop.drop_percent,
            ))
        })
        .collect();

    drops.sort_by(|a, b| b.1.total_cmp(&a.1));

    drops.into_iter().map(|(entry, _)| entry).collect()
}

#[cfg(test)]
mod watchlist_store_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::db::initialize;

    use super::{
        WatchlistBuilder, WatchlistStatus, create_watchlist, list_watchlists,
        list_watchlists_with_history,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_with_current_price_seeds_the_price_history() {
        let conn = get_test_connection();

        let watchlist = create_watchlist(
            WatchlistBuilder::new("Headphones", "AudioMart")
                .current_price(299.0)
                .target_price(250.0),
            datetime!(2024-01-01 00:00 UTC),
            &conn,
        )
        .unwrap();

        let with_history = list_watchlists_with_history(&conn).unwrap();
        assert_eq!(with_history.len(), 1);
        assert_eq!(with_history[0].watchlist, watchlist);
        assert_eq!(with_history[0].price_history.len(), 1);
        assert_eq!(with_history[0].price_history[0].price, 299.0);
        assert_eq!(with_history[0].price_history[0].vendor, "AudioMart");
    }

    #[test]
    fn create_without_current_price_leaves_history_empty() {
        let conn = get_test_connection();

        create_watchlist(
            WatchlistBuilder::new("Camera", "ShutterShop"),
            datetime!(2024-01-01 00:00 UTC),
            &conn,
        )
        .unwrap();

        let with_history = list_watchlists_with_history(&conn).unwrap();
        assert!(with_history[0].price_history.is_empty());
    }

    #[test]
    fn list_orders_by_priority_and_filters_by_status() {
        let conn = get_test_connection();
        let now = datetime!(2024-01-01 00:00 UTC);

        let low = create_watchlist(
            WatchlistBuilder::new("Low priority", "Shop").priority(1),
            now,
            &conn,
        )
        .unwrap();
        let high = create_watchlist(
            WatchlistBuilder::new("High priority", "Shop").priority(9),
            now,
            &conn,
        )
        .unwrap();
        create_watchlist(
            WatchlistBuilder::new("Bought", "Shop").status(WatchlistStatus::Purchased),
            now,
            &conn,
        )
        .unwrap();

        let watching = list_watchlists(Some(WatchlistStatus::Watching), &conn).unwrap();

        assert_eq!(watching, vec![high, low]);
    }
}
