//! This file defines the `PriceHistory` type, the store function that appends
//! a price observation to a watched product, and the API route for doing so
//! over HTTP.
//!
//! Price observations arrive from outside the system (e.g. the user checking
//! a shop page); appending one also moves the watchlist's current price.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, DatabaseId, Error,
    db::{CreateTable, MapRow},
};

/// A single observed price for a watched product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    /// The ID of the price record.
    pub id: DatabaseId,
    /// The watchlist entry the price belongs to.
    pub watchlist_id: DatabaseId,
    /// When the price was observed (UTC).
    pub datetime: OffsetDateTime,
    /// The observed price. Always non-negative.
    pub price: f64,
    /// The vendor the price was observed at.
    pub vendor: String,
    /// Stock status at the time, e.g. "available" or "out_of_stock".
    pub availability: Option<String>,
    /// The shipping cost quoted alongside the price.
    pub shipping: Option<f64>,
}

/// Append a price observation to the watchlist `watchlist_id`, stamped `now`.
///
/// The watchlist's `current_price` is updated in the same SQL transaction, and
/// the record takes the watchlist's vendor.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `watchlist_id` does not refer to a valid watchlist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn append_price_history(
    watchlist_id: DatabaseId,
    price: f64,
    availability: Option<String>,
    shipping: Option<f64>,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<PriceHistory, Error> {
    let tx = connection.unchecked_transaction()?;

    let vendor: String = tx.query_row(
        "SELECT vendor FROM watchlist WHERE id = ?1",
        [watchlist_id],
        |row| row.get(0),
    )?;

    tx.execute(
        "UPDATE watchlist SET current_price = ?1 WHERE id = ?2",
        (price, watchlist_id),
    )?;

    let history = tx
        .prepare(
            "INSERT INTO price_history (watchlist_id, datetime, price, vendor, availability, shipping)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, watchlist_id, datetime, price, vendor, availability, shipping",
        )?
        .query_row(
            (watchlist_id, now, price, vendor, availability, shipping),
            PriceHistory::map_row,
        )?;

    tx.commit()?;

    Ok(history)
}

/// The request body for appending a price observation.
#[derive(Debug, Deserialize)]
pub struct AppendPriceForm {
    /// The observed price.
    pub price: f64,
    /// Stock status at the time.
    pub availability: Option<String>,
    /// The shipping cost quoted alongside the price.
    pub shipping: Option<f64>,
}

/// Append a price observation to a watchlist entry.
///
/// Responds with the created [PriceHistory] record and `201 Created`.
pub async fn post_price_history(
    State(state): State<AppState>,
    Path(watchlist_id): Path<DatabaseId>,
    Json(form): Json<AppendPriceForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLock)?;

    let history = append_price_history(
        watchlist_id,
        form.price,
        form.availability,
        form.shipping,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(history)).into_response())
}

impl CreateTable for PriceHistory {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS price_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                watchlist_id INTEGER NOT NULL,
                datetime TEXT NOT NULL,
                price REAL NOT NULL,
                vendor TEXT NOT NULL,
                availability TEXT,
                shipping REAL,
                FOREIGN KEY(watchlist_id) REFERENCES watchlist(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for PriceHistory {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            watchlist_id: row.get(offset + 1)?,
            datetime: row.get(offset + 2)?,
            price: row.get(offset + 3)?,
            vendor: row.get(offset + 4)?,
            availability: row.get(offset + 5)?,
            shipping: row.get(offset + 6)?,
        })
    }
}

#[cfg(test)]
mod price_history_store_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        watchlist::{WatchlistBuilder, create_watchlist, get_watchlist},
    };

    use super::append_price_history;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn append_updates_current_price_and_takes_vendor() {
        let conn = get_test_connection();
        let watchlist = create_watchlist(
            WatchlistBuilder::new("Noise-cancelling headphones", "AudioMart"),
            datetime!(2024-01-01 00:00 UTC),
            &conn,
        )
        .unwrap();

        let history = append_price_history(
            watchlist.id,
            249.99,
            Some("available".to_owned()),
            None,
            datetime!(2024-01-02 08:00 UTC),
            &conn,
        )
        .unwrap();

        assert_eq!(history.watchlist_id, watchlist.id);
        assert_eq!(history.price, 249.99);
        assert_eq!(history.vendor, "AudioMart");
        assert_eq!(history.availability.as_deref(), Some("available"));

        let updated = get_watchlist(watchlist.id, &conn).unwrap();
        assert_eq!(updated.current_price, Some(249.99));
    }

    #[test]
    fn append_fails_for_unknown_watchlist() {
        let conn = get_test_connection();

        let result = append_price_history(
            999,
            100.0,
            None,
            None,
            datetime!(2024-01-02 08:00 UTC),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn deleting_a_watchlist_cascades_to_its_history() {
        let conn = get_test_connection();
        let watchlist = create_watchlist(
            WatchlistBuilder::new("Camera", "ShutterShop"),
            datetime!(2024-01-01 00:00 UTC),
            &conn,
        )
        .unwrap();
        append_price_history(
            watchlist.id,
            100.0,
            None,
            None,
            datetime!(2024-01-02 08:00 UTC),
            &conn,
        )
        .unwrap();

        conn.execute("DELETE FROM watchlist WHERE id = ?1", [watchlist.id])
            .unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(id) FROM price_history", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
