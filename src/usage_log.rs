//! This file defines the `UsageLog` type and the store functions for
//! recording when an owned item was used.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    DatabaseId, Error,
    db::{CreateTable, MapRow},
};

/// A record of an item being used on a particular day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLog {
    /// The ID of the usage log.
    pub id: DatabaseId,
    /// The item that was used.
    pub item_id: DatabaseId,
    /// The day the item was used.
    pub date: Date,
    /// How many times it was used that day. At least 1.
    pub count: i64,
    /// How satisfying the use was, from 1 to 5.
    pub satisfaction: Option<i64>,
    /// How long the item was used for.
    pub duration_minutes: Option<i64>,
}

/// Builds a [UsageLog] to be inserted with [create_usage_log].
#[derive(Debug, Clone, PartialEq)]
pub struct UsageLogBuilder {
    item_id: DatabaseId,
    date: Date,
    count: i64,
    satisfaction: Option<i64>,
    duration_minutes: Option<i64>,
}

impl UsageLogBuilder {
    /// Create a builder for a single use of `item_id` on `date`.
    pub fn new(item_id: DatabaseId, date: Date) -> Self {
        Self {
            item_id,
            date,
            count: 1,
            satisfaction: None,
            duration_minutes: None,
        }
    }

    /// Set how many times the item was used.
    pub fn count(mut self, count: i64) -> Self {
        self.count = count;
        self
    }

    /// Set the 1-5 satisfaction rating.
    pub fn satisfaction(mut self, satisfaction: i64) -> Self {
        self.satisfaction = Some(satisfaction);
        self
    }

    /// Set how long the item was used for.
    pub fn duration_minutes(mut self, duration_minutes: i64) -> Self {
        self.duration_minutes = Some(duration_minutes);
        self
    }
}

/// Create a new usage log in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the builder's item ID does not refer to a valid item,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_usage_log(
    builder: UsageLogBuilder,
    connection: &Connection,
) -> Result<UsageLog, Error> {
    connection
        .prepare(
            "INSERT INTO usage_log (item_id, date, count, satisfaction, duration_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, item_id, date, count, satisfaction, duration_minutes",
        )?
        .query_row(
            (
                builder.item_id,
                builder.date,
                builder.count,
                builder.satisfaction,
                builder.duration_minutes,
            ),
            UsageLog::map_row,
        )
        .map_err(|error| match error {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            // The caller tried to log usage for a non-existent item.
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 787 => {
                Error::NotFound
            }
            error => error.into(),
        })
}

impl CreateTable for UsageLog {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS usage_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                count INTEGER NOT NULL DEFAULT 1,
                satisfaction INTEGER,
                duration_minutes INTEGER,
                FOREIGN KEY(item_id) REFERENCES item(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for UsageLog {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(offset)?,
            item_id: row.get(offset + 1)?,
            date: row.get(offset + 2)?,
            count: row.get(offset + 3)?,
            satisfaction: row.get(offset + 4)?,
            duration_minutes: row.get(offset + 5)?,
        })
    }
}

#[cfg(test)]
mod usage_log_store_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        item::{ItemBuilder, create_item},
    };

    use super::{UsageLogBuilder, create_usage_log};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn create_round_trips_all_fields() {
        let conn = get_test_connection();
        let item = create_item(
            ItemBuilder::new("Record player", date!(2023 - 09 - 01), 320.0),
            &conn,
        )
        .unwrap();

        let log = create_usage_log(
            UsageLogBuilder::new(item.id, date!(2023 - 10 - 05))
                .count(2)
                .satisfaction(5)
                .duration_minutes(90),
            &conn,
        )
        .unwrap();

        assert_eq!(log.item_id, item.id);
        assert_eq!(log.date, date!(2023 - 10 - 05));
        assert_eq!(log.count, 2);
        assert_eq!(log.satisfaction, Some(5));
        assert_eq!(log.duration_minutes, Some(90));
    }

    #[test]
    fn create_fails_for_unknown_item() {
        let conn = get_test_connection();

        let result = create_usage_log(UsageLogBuilder::new(999, date!(2023 - 10 - 05)), &conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn deleting_an_item_cascades_to_its_logs() {
        let conn = get_test_connection();
        let item = create_item(
            ItemBuilder::new("Record player", date!(2023 - 09 - 01), 320.0),
            &conn,
        )
        .unwrap();
        create_usage_log(UsageLogBuilder::new(item.id, date!(2023 - 10 - 05)), &conn).unwrap();

        conn.execute("DELETE FROM item WHERE id = ?1", [item.id])
            .unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(id) FROM usage_log", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
