//! The items view: inventory totals plus the cost-per-use, most-used and
//! idle-item rankings.

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    DatabaseId, Error,
    aggregate::{round2, top_n},
    item::{ItemStatus, ItemWithUsage, list_items_with_usage},
    metrics::{ItemMetrics, average_satisfaction, item_metrics},
};

/// How many entries each ranking carries at most.
const RANKING_SIZE: usize = 10;

/// An entry in the cost-per-use ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostPerUseEntry {
    /// The ID of the item.
    pub id: DatabaseId,
    /// The name of the item.
    pub name: String,
    /// What the item cost.
    pub purchase_price: f64,
    /// How many usage logs the item has.
    pub usage_count: usize,
    /// The purchase price amortised over the uses, rounded to 2 decimal
    /// places.
    pub cost_per_use: f64,
}

/// An entry in the most-used ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MostUsedEntry {
    /// The ID of the item.
    pub id: DatabaseId,
    /// The name of the item.
    pub name: String,
    /// How many usage logs the item has.
    pub usage_count: usize,
    /// The most recent day the item was used.
    pub last_used: Option<Date>,
    /// The mean satisfaction across the item's rated logs, 0 when none are
    /// rated.
    pub avg_satisfaction: f64,
}

/// An entry in the idle-items ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdleItemEntry {
    /// The ID of the item.
    pub id: DatabaseId,
    /// The name of the item.
    pub name: String,
    /// Whole days since the item was last used, or bought if never used.
    pub idle_days: i64,
    /// The most recent day the item was used, if ever.
    pub last_used: Option<Date>,
    /// What the item cost.
    pub purchase_price: f64,
}

/// The inventory summary and rankings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemsDashboard {
    /// How many items were fetched.
    pub total_items: usize,
    /// The sum of the purchase prices of the fetched items.
    pub total_value: f64,
    /// The top 10 items by cost per use, most expensive per use first. Only
    /// items that have been used at least once appear.
    pub cost_per_use_ranking: Vec<CostPerUseEntry>,
    /// The top 10 items by usage count. Only used items appear.
    pub most_used: Vec<MostUsedEntry>,
    /// The top 10 items by days since last use, longest idle first. Every
    /// fetched item is ranked; the 30-day cutoff applies only to the home
    /// card's idle count.
    pub idle_items: Vec<IdleItemEntry>,
}

/// Build the items view as of `today`.
///
/// `status` restricts which items are fetched; with `None` every item counts
/// towards the totals and rankings.
pub fn items_view(
    status: Option<ItemStatus>,
    today: Date,
    connection: &Connection,
) -> Result<ItemsDashboard, Error> {
    let items = list_items_with_usage(status, connection)?;

    let total_items = items.len();
    let total_value: f64 = items
        .iter()
        .map(|entry| entry.item.purchase_price)
        .sum();

    let with_metrics: Vec<(&ItemWithUsage, ItemMetrics)> = items
        .iter()
        .map(|entry| (entry, item_metrics(&entry.item, &entry.usage_logs, today)))
        .collect();

    let used: Vec<&(&ItemWithUsage, ItemMetrics)> = with_metrics
        .iter()
        .filter(|(_, metrics)| metrics.usage_count > 0)
        .collect();

    let cost_per_use_ranking = top_n(&used, RANKING_SIZE, |(_, metrics)| metrics.cost_per_use)
        .into_iter()
        .map(|(entry, metrics)| CostPerUseEntry {
            id: entry.item.id,
            name: entry.item.name.clone(),
            purchase_price: entry.item.purchase_price,
            usage_count: metrics.usage_count,
            cost_per_use: round2(metrics.cost_per_use),
        })
        .collect();

    let most_used = top_n(&used, RANKING_SIZE, |(_, metrics)| {
        metrics.usage_count as f64
    })
    .into_iter()
    .map(|(entry, metrics)| MostUsedEntry {
        id: entry.item.id,
        name: entry.item.name.clone(),
        usage_count: metrics.usage_count,
        last_used: metrics.last_used,
        avg_satisfaction: round2(average_satisfaction(&entry.usage_logs).unwrap_or(0.0)),
    })
    .collect();

    let idle_items = top_n(&with_metrics, RANKING_SIZE, |(_, metrics)| {
        metrics.idle_days as f64
    })
    .into_iter()
    .map(|(entry, metrics)| IdleItemEntry {
        id: entry.item.id,
        name: entry.item.name.clone(),
        idle_days: metrics.idle_days,
        last_used: metrics.last_used,
        purchase_price: entry.item.purchase_price,
    })
    .collect();

    Ok(ItemsDashboard {
        total_items,
        total_value: round2(total_value),
        cost_per_use_ranking,
        most_used,
        idle_items,
    })
}

#[cfg(test)]
mod items_view_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        item::{ItemBuilder, ItemStatus, create_item},
        usage_log::{UsageLogBuilder, create_usage_log},
    };

    use super::items_view;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn empty_inventory_gives_an_all_zero_view() {
        let conn = get_test_connection();

        let view = items_view(None, date!(2024 - 06 - 17), &conn).unwrap();

        assert_eq!(view.total_items, 0);
        assert_eq!(view.total_value, 0.0);
        assert!(view.cost_per_use_ranking.is_empty());
        assert!(view.most_used.is_empty());
        assert!(view.idle_items.is_empty());
    }

    #[test]
    fn totals_cover_every_fetched_item_but_rankings_need_usage() {
        let conn = get_test_connection();
        let today = date!(2024 - 06 - 17);

        let mixer = create_item(
            ItemBuilder::new("Stand mixer", date!(2024 - 05 - 01), 600.0),
            &conn,
        )
        .unwrap();
        create_item(
            ItemBuilder::new("Unused gadget", date!(2024 - 06 - 01), 150.0),
            &conn,
        )
        .unwrap();

        create_usage_log(UsageLogBuilder::new(mixer.id, date!(2024 - 05 - 10)), &conn).unwrap();
        create_usage_log(UsageLogBuilder::new(mixer.id, date!(2024 - 06 - 10)), &conn).unwrap();

        let view = items_view(None, today, &conn).unwrap();

        assert_eq!(view.total_items, 2);
        assert_eq!(view.total_value, 750.0);
        assert_eq!(view.cost_per_use_ranking.len(), 1);
        assert_eq!(view.cost_per_use_ranking[0].cost_per_use, 300.0);
        assert_eq!(view.most_used.len(), 1);
        assert_eq!(view.most_used[0].usage_count, 2);
    }

    #[test]
    fn status_filter_scopes_the_totals() {
        let conn = get_test_connection();

        create_item(
            ItemBuilder::new("Tent", date!(2023 - 12 - 01), 450.0),
            &conn,
        )
        .unwrap();
        create_item(
            ItemBuilder::new("Kayak", date!(2023 - 11 - 20), 900.0).status(ItemStatus::Sold),
            &conn,
        )
        .unwrap();

        let all = items_view(None, date!(2024 - 06 - 17), &conn).unwrap();
        let active = items_view(Some(ItemStatus::Active), date!(2024 - 06 - 17), &conn).unwrap();

        assert_eq!(all.total_value, 1350.0);
        assert_eq!(active.total_value, 450.0);
    }

    #[test]
    fn most_used_reports_zero_satisfaction_when_no_logs_are_rated() {
        let conn = get_test_connection();

        let mixer = create_item(
            ItemBuilder::new("Stand mixer", date!(2024 - 05 - 01), 600.0),
            &conn,
        )
        .unwrap();
        create_usage_log(UsageLogBuilder::new(mixer.id, date!(2024 - 05 - 10)), &conn).unwrap();

        let rated = create_item(
            ItemBuilder::new("Espresso machine", date!(2024 - 05 - 01), 900.0),
            &conn,
        )
        .unwrap();
        create_usage_log(
            UsageLogBuilder::new(rated.id, date!(2024 - 05 - 11)).satisfaction(4),
            &conn,
        )
        .unwrap();
        create_usage_log(
            UsageLogBuilder::new(rated.id, date!(2024 - 05 - 12)).satisfaction(5),
            &conn,
        )
        .unwrap();

        let view = items_view(None, date!(2024 - 06 - 17), &conn).unwrap();

        let by_name = |name: &str| {
            view.most_used
                .iter()
                .find(|entry| entry.name == name)
                .unwrap()
        };
        assert_eq!(by_name("Stand mixer").avg_satisfaction, 0.0);
        assert_eq!(by_name("Espresso machine").avg_satisfaction, 4.5);
        assert_eq!(
            by_name("Espresso machine").last_used,
            Some(date!(2024 - 05 - 12))
        );
    }

    #[test]
    fn idle_ranking_covers_every_fetched_item_sorted_longest_first() {
        let conn = get_test_connection();
        let today = date!(2024 - 06 - 17);

        create_item(
            ItemBuilder::new("Bread maker", date!(2024 - 04 - 01), 150.0),
            &conn,
        )
        .unwrap();
        create_item(
            ItemBuilder::new("Kayak", date!(2023 - 01 - 01), 900.0).status(ItemStatus::Sold),
            &conn,
        )
        .unwrap();
        let bike = create_item(
            ItemBuilder::new("Gravel bike", date!(2023 - 06 - 01), 1800.0),
            &conn,
        )
        .unwrap();
        create_usage_log(UsageLogBuilder::new(bike.id, date!(2024 - 06 - 16)), &conn).unwrap();

        let view = items_view(None, today, &conn).unwrap();

        let names: Vec<&str> = view
            .idle_items
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(names, vec!["Kayak", "Bread maker", "Gravel bike"]);
        assert_eq!(view.idle_items[2].idle_days, 1);
    }

    #[test]
    fn idle_ranking_lists_recently_bought_items_too() {
        let conn = get_test_connection();
        let today = date!(2024 - 06 - 17);

        // Bought 10 days ago and never used: still ranked.
        create_item(
            ItemBuilder::new("Air fryer", date!(2024 - 06 - 07), 120.0),
            &conn,
        )
        .unwrap();

        let view = items_view(None, today, &conn).unwrap();

        assert_eq!(view.idle_items.len(), 1);
        assert_eq!(view.idle_items[0].name, "Air fryer");
        assert_eq!(view.idle_items[0].idle_days, 10);
        assert_eq!(view.idle_items[0].last_used, None);
    }
}
