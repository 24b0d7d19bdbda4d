//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/watchlists/{watchlist_id}/stats',
//! use [format_endpoint].

/// The route for the comprehensive dashboard (all four views).
pub const DASHBOARD: &str = "/api/dashboard";
/// The route for the landing-page summary numbers.
pub const HOME_CARDS: &str = "/api/dashboard/home-cards";
/// The route for the monthly spending breakdown.
pub const SPENDING_DASHBOARD: &str = "/api/dashboard/spending";
/// The route for the inventory summary and rankings.
pub const ITEMS_DASHBOARD: &str = "/api/dashboard/items";
/// The route for the watchlist summary.
pub const WATCHLIST_DASHBOARD: &str = "/api/dashboard/watchlist";

/// The route to append a price observation to a watchlist entry.
pub const PRICE_HISTORY: &str = "/api/watchlists/{watchlist_id}/price-history";
/// The route for one watchlist entry's price statistics.
pub const PRICE_STATS: &str = "/api/watchlists/{watchlist_id}/stats";
/// The route for the target-price alerts.
pub const PRICE_DROP_ALERTS: &str = "/api/watchlists/alerts/price-drops";
/// The route for the recent price drops.
pub const RECENT_PRICE_DROPS: &str = "/api/watchlists/alerts/recent-drops";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/watchlists/{watchlist_id}/stats',
/// '{watchlist_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
