//! Application router configuration.

use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState,
    dashboard::{
        get_dashboard, get_home_cards, get_items_dashboard, get_spending_dashboard,
        get_watchlist_dashboard,
    },
    endpoints,
    price_history::post_price_history,
    watchlist::{get_price_drop_alerts, get_price_stats, get_recent_price_drops},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .route(endpoints::HOME_CARDS, get(get_home_cards))
        .route(endpoints::SPENDING_DASHBOARD, get(get_spending_dashboard))
        .route(endpoints::ITEMS_DASHBOARD, get(get_items_dashboard))
        .route(
            endpoints::WATCHLIST_DASHBOARD,
            get(get_watchlist_dashboard),
        )
        .route(endpoints::PRICE_HISTORY, post(post_price_history))
        .route(endpoints::PRICE_STATS, get(get_price_stats))
        .route(endpoints::PRICE_DROP_ALERTS, get(get_price_drop_alerts))
        .route(
            endpoints::RECENT_PRICE_DROPS,
            get(get_recent_price_drops),
        )
        .with_state(state)
}

#[cfg(test)]
mod routing_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::Value;

    use crate::{AppState, endpoints};

    use super::build_router;

    fn get_test_server() -> TestServer {
        let state = AppState::new(Connection::open_in_memory().unwrap()).unwrap();

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn dashboard_routes_respond_with_json() {
        let server = get_test_server();

        for route in [
            endpoints::DASHBOARD,
            endpoints::HOME_CARDS,
            endpoints::SPENDING_DASHBOARD,
            endpoints::ITEMS_DASHBOARD,
            endpoints::WATCHLIST_DASHBOARD,
            endpoints::PRICE_DROP_ALERTS,
            endpoints::RECENT_PRICE_DROPS,
        ] {
            let response = server.get(route).await;

            response.assert_status_ok();
            response.json::<Value>();
        }
    }

    #[tokio::test]
    async fn unknown_watchlist_stats_give_404() {
        let server = get_test_server();

        let response = server
            .get(&endpoints::format_endpoint(endpoints::PRICE_STATS, 999))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn invalid_month_gives_400() {
        let server = get_test_server();

        let response = server
            .get(&format!("{}?month=13", endpoints::SPENDING_DASHBOARD))
            .await;

        response.assert_status_bad_request();
    }
}
