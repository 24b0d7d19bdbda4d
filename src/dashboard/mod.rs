//! The dashboard: read-only views that combine transactions, items, usage
//! logs and watchlists into summary statistics.
//!
//! Each view lives in its own module as a pure-ish builder function taking a
//! `&Connection` and an injected clock, so the views can be tested with fixed
//! dates. The HTTP layer in [handlers] supplies the real clock and, for the
//! comprehensive dashboard, runs the four builders concurrently.

mod handlers;
mod home;
mod items;
mod spending;
mod watchlist;

pub use handlers::{
    ComprehensiveDashboard, ItemsParams, SpendingParams, get_dashboard, get_home_cards,
    get_items_dashboard, get_spending_dashboard, get_watchlist_dashboard,
};
pub use home::{HomeCards, home_cards};
pub use items::{ItemsDashboard, items_view};
pub use spending::{SpendingDashboard, spending_view};
pub use watchlist::{WatchlistDashboard, watchlist_view};
