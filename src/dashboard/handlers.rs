//! The HTTP layer of the dashboard: one handler per view plus the
//! comprehensive dashboard, which computes all four views concurrently.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Error, item::ItemStatus};

use super::{
    home::{HomeCards, home_cards},
    items::{ItemsDashboard, items_view},
    spending::{SpendingDashboard, spending_view},
    watchlist::{WatchlistDashboard, watchlist_view},
};

/// Query parameters for the spending dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct SpendingParams {
    /// The calendar month to report on, 1-12. Defaults to the current month.
    pub month: Option<u8>,
    /// The year of the month to report on. Defaults to the current year.
    pub year: Option<i32>,
}

/// Query parameters for the items dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct ItemsParams {
    /// Restrict the view to items with this lifecycle status. Defaults to
    /// every item.
    pub status: Option<ItemStatus>,
}

/// All four dashboard views in one response.
#[derive(Debug, PartialEq, Serialize)]
pub struct ComprehensiveDashboard {
    /// The landing-page summary numbers.
    pub home_cards: HomeCards,
    /// The current month's spending breakdown.
    pub spending: SpendingDashboard,
    /// The inventory summary and rankings.
    pub items: ItemsDashboard,
    /// The watchlist summary.
    pub watchlist: WatchlistDashboard,
}

fn lock_and_build<T>(
    connection: &Arc<Mutex<Connection>>,
    build: impl FnOnce(&Connection) -> Result<T, Error>,
) -> Result<T, Error> {
    let connection = connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLock)?;

    build(&connection)
}

/// Runs one view builder on the blocking thread pool with its own handle to
/// the database.
async fn spawn_view<T, F>(connection: Arc<Mutex<Connection>>, build: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
{
    tokio::task::spawn_blocking(move || lock_and_build(&connection, build))
        .await
        .map_err(|error| Error::TaskFailed(error.to_string()))?
}

/// Report the landing-page summary numbers.
pub async fn get_home_cards(State(state): State<AppState>) -> Result<Json<HomeCards>, Error> {
    let today = OffsetDateTime::now_utc().date();

    let cards = lock_and_build(&state.db_connection, |connection| {
        home_cards(today, connection)
    })?;

    Ok(Json(cards))
}

/// Report the spending breakdown for one calendar month, defaulting to the
/// current one.
pub async fn get_spending_dashboard(
    State(state): State<AppState>,
    Query(params): Query<SpendingParams>,
) -> Result<Json<SpendingDashboard>, Error> {
    let today = OffsetDateTime::now_utc().date();

    let view = lock_and_build(&state.db_connection, |connection| {
        spending_view(params.year, params.month, today, connection)
    })?;

    Ok(Json(view))
}

/// Report the inventory summary and rankings.
pub async fn get_items_dashboard(
    State(state): State<AppState>,
    Query(params): Query<ItemsParams>,
) -> Result<Json<ItemsDashboard>, Error> {
    let today = OffsetDateTime::now_utc().date();

    let view = lock_and_build(&state.db_connection, |connection| {
        items_view(params.status, today, connection)
    })?;

    Ok(Json(view))
}

/// Report the watchlist summary.
pub async fn get_watchlist_dashboard(
    State(state): State<AppState>,
) -> Result<Json<WatchlistDashboard>, Error> {
    let view = lock_and_build(&state.db_connection, watchlist_view)?;

    Ok(Json(view))
}

/// Report all four dashboard views in one response.
///
/// The views are independent reads, so they are computed concurrently on the
/// blocking thread pool and merged. The first failure aborts the response.
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<ComprehensiveDashboard>, Error> {
    let today = OffsetDateTime::now_utc().date();

    let (home_cards, spending, items, watchlist) = tokio::try_join!(
        spawn_view(state.db_connection.clone(), move |connection| {
            home_cards(today, connection)
        }),
        spawn_view(state.db_connection.clone(), move |connection| {
            spending_view(None, None, today, connection)
        }),
        spawn_view(state.db_connection.clone(), move |connection| {
            items_view(None, today, connection)
        }),
        spawn_view(state.db_connection.clone(), watchlist_view),
    )?;

    Ok(Json(ComprehensiveDashboard {
        home_cards,
        spending,
        items,
        watchlist,
    }))
}
