//! This file defines the `Transaction` type, the builder used to create one,
//! and the store functions for saving and querying transactions.
//!
//! A transaction records a single purchase: when it happened, where, how much
//! was spent and how the spend is categorised.

use std::ops::RangeInclusive;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::{
    DatabaseId, Error,
    db::{CreateTable, MapRow},
};

/// A purchase recorded by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// When the purchase happened (UTC).
    pub datetime: OffsetDateTime,
    /// Where the purchase was made, e.g. "Mitre 10".
    pub merchant: Option<String>,
    /// How much was spent. Always non-negative.
    pub total_amount: f64,
    /// The ISO 4217 currency code for `total_amount`.
    pub currency: String,
    /// The spending category, e.g. "Food".
    pub category: Option<String>,
    /// Free-form labels attached to the transaction, in the order the user
    /// entered them.
    pub tags: Option<Vec<String>>,
}

/// Builds a [Transaction] to be inserted with [create_transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    datetime: OffsetDateTime,
    merchant: Option<String>,
    total_amount: f64,
    currency: String,
    category: Option<String>,
    tags: Option<Vec<String>>,
}

impl TransactionBuilder {
    /// Create a builder for a transaction of `total_amount`, dated now.
    pub fn new(total_amount: f64) -> Self {
        Self {
            datetime: OffsetDateTime::now_utc(),
            merchant: None,
            total_amount,
            currency: "USD".to_owned(),
            category: None,
            tags: None,
        }
    }

    /// Set when the purchase happened.
    pub fn datetime(mut self, datetime: OffsetDateTime) -> Self {
        self.datetime = datetime;
        self
    }

    /// Set where the purchase was made.
    pub fn merchant(mut self, merchant: &str) -> Self {
        self.merchant = Some(merchant.to_owned());
        self
    }

    /// Set the currency code.
    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_owned();
        self
    }

    /// Set the spending category.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    /// Set the tags, keeping their order.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Create a new transaction in the database.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (datetime, merchant, total_amount, currency, category, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, datetime, merchant, total_amount, currency, category, tags",
        )?
        .query_row(
            (
                builder.datetime,
                builder.merchant,
                builder.total_amount,
                builder.currency,
                builder.category,
                builder.tags.map(|tags| tags.join(",")),
            ),
            Transaction::map_row,
        )?;

    Ok(transaction)
}

/// Retrieve transactions, optionally restricted to those whose datetime falls
/// on a day within `date_range` (inclusive).
///
/// When a range is given it is applied in the SQL query, so rows outside the
/// range are never fetched.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn list_transactions(
    date_range: Option<RangeInclusive<Date>>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    match date_range {
        Some(range) => {
            // Datetimes are stored as UTC text, so the day range becomes a
            // half-open datetime range [start 00:00, end + 1 day 00:00).
            let start = range.start().midnight().assume_utc();
            let end_exclusive = range.end().midnight().assume_utc() + Duration::days(1);

            connection
                .prepare(
                    "SELECT id, datetime, merchant, total_amount, currency, category, tags
                     FROM \"transaction\"
                     WHERE datetime >= ?1 AND datetime < ?2
                     ORDER BY datetime DESC",
                )?
                .query_map((start, end_exclusive), Transaction::map_row)?
                .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
                .collect()
        }
        None => connection
            .prepare(
                "SELECT id, datetime, merchant, total_amount, currency, category, tags
                 FROM \"transaction\"
                 ORDER BY datetime DESC",
            )?
            .query_map([], Transaction::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect(),
    }
}

impl CreateTable for Transaction {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                datetime TEXT NOT NULL,
                merchant TEXT,
                total_amount REAL NOT NULL,
                currency TEXT NOT NULL DEFAULT 'USD',
                category TEXT,
                tags TEXT
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Transaction {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        let tags: Option<String> = row.get(offset + 6)?;

        Ok(Self {
            id: row.get(offset)?,
            datetime: row.get(offset + 1)?,
            merchant: row.get(offset + 2)?,
            total_amount: row.get(offset + 3)?,
            currency: row.get(offset + 4)?,
            category: row.get(offset + 5)?,
            tags: tags.map(|tags| tags.split(',').map(str::to_owned).collect()),
        })
    }
}
