//! This file defines the `Item` type, its lifecycle status, and the store
//! functions for saving and querying owned items.
//!
//! An item is a possession derived from a purchase. Items own their usage
//! logs: deleting an item cascades to its logs.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    DatabaseId, Error,
    db::{CreateTable, MapRow},
    usage_log::UsageLog,
};

/// Where an item is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// The item is owned and in use.
    Active,
    /// The item has been sold on.
    Sold,
    /// The item was given away.
    Gifted,
    /// The item no longer works.
    Broken,
    /// The item cannot be found.
    Lost,
}

impl ItemStatus {
    /// The status as the string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "active",
            ItemStatus::Sold => "sold",
            ItemStatus::Gifted => "gifted",
            ItemStatus::Broken => "broken",
            ItemStatus::Lost => "lost",
        }
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The error returned when a string does not name a valid [ItemStatus].
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("\"{0}\" is not a valid item status")]
pub struct ParseItemStatusError(String);

impl FromStr for ItemStatus {
    type Err = ParseItemStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ItemStatus::Active),
            "sold" => Ok(ItemStatus::Sold),
            "gifted" => Ok(ItemStatus::Gifted),
            "broken" => Ok(ItemStatus::Broken),
            "lost" => Ok(ItemStatus::Lost),
            other => Err(ParseItemStatusError(other.to_owned())),
        }
    }
}

impl ToSql for ItemStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ItemStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A possession recorded by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// The ID of the item.
    pub id: DatabaseId,
    /// The name of the item, e.g. "Espresso machine".
    pub name: String,
    /// The category the item belongs to, e.g. "Kitchen".
    pub category: Option<String>,
    /// The day the item was bought.
    pub purchase_date: Date,
    /// What the item cost. Always non-negative.
    pub purchase_price: f64,
    /// How many were bought. At least 1.
    pub quantity: i64,
    /// Where the item is in its lifecycle.
    pub status: ItemStatus,
}

/// An item snapshot together with all of its usage logs, as consumed by the
/// derived-metric calculations.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemWithUsage {
    /// The item.
    pub item: Item,
    /// Every usage log recorded against the item.
    pub usage_logs: Vec<UsageLog>,
}

/// Builds an [Item] to be inserted with [create_item].
#[derive(Debug, Clone, PartialEq)]
pub struct ItemBuilder {
    name: String,
    category: Option<String>,
    purchase_date: Date,
    purchase_price: f64,
    quantity: i64,
    status: ItemStatus,
}

impl ItemBuilder {
    /// Create a builder for an active item bought on `purchase_date` for
    /// `purchase_price`.
    pub fn new(name: &str, purchase_date: Date, purchase_price: f64) -> Self {
        Self {
            name: name.to_owned(),
            category: None,
            purchase_date,
            purchase_price,
            quantity: 1,
            status: ItemStatus::Active,
        }
    }

    /// Set the item's category.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    /// Set how many were bought.
    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the item's lifecycle status.
    pub fn status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }
}

/// Create a new item in the database.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn create_item(builder: ItemBuilder, connection: &Connection) -> Result<Item, Error> {
    let item = connection
        .prepare(
            "INSERT INTO item (name, category, purchase_date, purchase_price, quantity, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, name, category, purchase_date, purchase_price, quantity, status",
        )?
        .query_row(
            (
                builder.name,
                builder.category,
                builder.purchase_date,
                builder.purchase_price,
                builder.quantity,
                builder.status,
            ),
            Item::map_row,
        )?;

    Ok(item)
}

/// Retrieve items, optionally restricted to a lifecycle `status`, each paired
/// with all of its usage logs.
///
/// Items are returned newest purchase first; logs in date order.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub fn list_items_with_usage(
    status: Option<ItemStatus>,
    connection: &Connection,
) -> Result<Vec<ItemWithUsage>, Error> {
    const COLUMNS: &str = "i.id, i.name, i.category, i.purchase_date, i.purchase_price,
         i.quantity, i.status,
         l.id, l.item_id, l.date, l.count, l.satisfaction, l.duration_minutes";
    const ORDER: &str = "ORDER BY i.purchase_date DESC, i.id ASC, l.date ASC, l.id ASC";

    let map_joined_row = |row: &Row| {
        let item = Item::map_row(row)?;
        // The LEFT JOIN yields NULL log columns for items that were never used.
        let log = match row.get::<_, Option<DatabaseId>>(7)? {
            Some(_) => Some(UsageLog::map_row_with_offset(row, 7)?),
            None => None,
        };

        Ok((item, log))
    };

    let rows: Vec<(Item, Option<UsageLog>)> = match status {
        Some(status) => connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM item i
                 LEFT JOIN usage_log l ON l.item_id = i.id
                 WHERE i.status = ?1 {ORDER}"
            ))?
            .query_map([status], map_joined_row)?
            .collect::<Result<_, rusqlite::Error>>()?,
        None => connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM item i
                 LEFT JOIN usage_log l ON l.item_id = i.id {ORDER}"
            ))?
            .query_map([], map_joined_row)?
            .collect::<Result<_, rusqlite::Error>>()?,
    };

    let mut items: Vec<ItemWithUsage> = Vec::new();

    for (item, log) in rows {
        match items.last_mut() {
            Some(last) if last.item.id == item.id => {
                if let Some(log) = log {
                    last.usage_logs.push(log);
                }
            }
            _ => items.push(ItemWithUsage {
                item,
                usage_logs: log.into_iter().collect(),
            }),
        }
    }

    Ok(items)
}

impl CreateTable for Item {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS item (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category TEXT,
                purchase_date TEXT NOT NULL,
                purchase_price REAL NOT NULL,
                quantity INTEGER NOT NULL DEFAULT 1,
                status TEXT NOT NULL DEFAULT 'active'
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for Item {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            category: row.get(offset + 2)?,
            purchase_date: row.get(offset + 3)?,
            purchase_price: row.get(offset + 4)?,
            quantity: row.get(offset + 5)?,
            status: row.get(offset + 6)?,
        })
    }
}

#[cfg(test)]
mod item_store_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        usage_log::{UsageLogBuilder, create_usage_log},
    };

    use super::{ItemBuilder, ItemStatus, create_item, list_items_with_usage};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_round_trips_all_fields() {
        let conn = get_test_connection();

        let item = create_item(
            ItemBuilder::new("Stand mixer", date!(2024 - 01 - 10), 599.0)
                .category("Kitchen")
                .quantity(1)
                .status(ItemStatus::Active),
            &conn,
        )
        .unwrap();

        assert_eq!(item.name, "Stand mixer");
        assert_eq!(item.category.as_deref(), Some("Kitchen"));
        assert_eq!(item.purchase_date, date!(2024 - 01 - 10));
        assert_eq!(item.purchase_price, 599.0);
        assert_eq!(item.status, ItemStatus::Active);
    }

    #[test]
    fn list_with_usage_groups_logs_under_their_item() {
        let conn = get_test_connection();

        let mixer = create_item(
            ItemBuilder::new("Stand mixer", date!(2024 - 01 - 10), 599.0),
            &conn,
        )
        .unwrap();
        let bike = create_item(
            ItemBuilder::new("Gravel bike", date!(2024 - 03 - 02), 1800.0),
            &conn,
        )
        .unwrap();

        create_usage_log(UsageLogBuilder::new(mixer.id, date!(2024 - 02 - 01)), &conn).unwrap();
        create_usage_log(UsageLogBuilder::new(mixer.id, date!(2024 - 02 - 14)), &conn).unwrap();

        let got = list_items_with_usage(None, &conn).unwrap();

        // Newest purchase first.
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].item, bike);
        assert!(got[0].usage_logs.is_empty());
        assert_eq!(got[1].item, mixer);
        assert_eq!(got[1].usage_logs.len(), 2);
        assert_eq!(got[1].usage_logs[0].date, date!(2024 - 02 - 01));
        assert_eq!(got[1].usage_logs[1].date, date!(2024 - 02 - 14));
    }

    #[test]
    fn list_with_usage_filters_by_status() {
        let conn = get_test_connection();

        create_item(
            ItemBuilder::new("Kayak", date!(2023 - 11 - 20), 900.0).status(ItemStatus::Sold),
            &conn,
        )
        .unwrap();
        let kept = create_item(
            ItemBuilder::new("Tent", date!(2023 - 12 - 01), 450.0),
            &conn,
        )
        .unwrap();

        let got = list_items_with_usage(Some(ItemStatus::Active), &conn).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].item, kept);
    }
}
