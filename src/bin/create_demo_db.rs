use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use stocktake::{
    initialize_db,
    item::{ItemBuilder, ItemStatus, create_item},
    price_history::append_price_history,
    transaction::{TransactionBuilder, create_transaction},
    usage_log::{UsageLogBuilder, create_usage_log},
    watchlist::{WatchlistBuilder, create_watchlist},
};

/// A utility for creating a demo database for the REST API server of stocktake.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let now = OffsetDateTime::now_utc();
    let today = now.date();

    println!("Creating transactions...");

    create_transaction(
        TransactionBuilder::new(68.4)
            .datetime(now - Duration::days(2))
            .merchant("Grocer")
            .category("Food"),
        &conn,
    )?;
    create_transaction(
        TransactionBuilder::new(24.9)
            .datetime(now - Duration::days(5))
            .merchant("Cafe")
            .category("Food"),
        &conn,
    )?;
    create_transaction(
        TransactionBuilder::new(599.0)
            .datetime(now - Duration::days(8))
            .merchant("KitchenWorld")
            .category("Appliances")
            .tags(vec!["big-purchase".to_owned()]),
        &conn,
    )?;
    // Last month, so the monthly views have something to exclude.
    create_transaction(
        TransactionBuilder::new(120.0)
            .datetime(now - Duration::days(40))
            .merchant("Grocer")
            .category("Food"),
        &conn,
    )?;

    println!("Creating items and usage logs...");

    let mixer = create_item(
        ItemBuilder::new("Stand mixer", today - Duration::days(8), 599.0).category("Kitchen"),
        &conn,
    )?;
    create_usage_log(
        UsageLogBuilder::new(mixer.id, today - Duration::days(6)).satisfaction(5),
        &conn,
    )?;
    create_usage_log(
        UsageLogBuilder::new(mixer.id, today - Duration::days(1)).satisfaction(4),
        &conn,
    )?;

    // Idle for well over a month.
    create_item(
        ItemBuilder::new("Bread maker", today - Duration::days(120), 150.0).category("Kitchen"),
        &conn,
    )?;

    create_item(
        ItemBuilder::new("Kayak", today - Duration::days(400), 900.0)
            .category("Outdoors")
            .status(ItemStatus::Sold),
        &conn,
    )?;

    println!("Creating watchlists and price history...");

    let headphones = create_watchlist(
        WatchlistBuilder::new("Noise-cancelling headphones", "AudioMart")
            .current_price(320.0)
            .target_price(280.0)
            .priority(5),
        now - Duration::days(20),
        &conn,
    )?;
    append_price_history(headphones.id, 300.0, None, None, now - Duration::days(10), &conn)?;
    append_price_history(
        headphones.id,
        275.0,
        Some("available".to_owned()),
        Some(0.0),
        now - Duration::days(1),
        &conn,
    )?;

    let monitor = create_watchlist(
        WatchlistBuilder::new("4K monitor", "ScreenHub")
            .current_price(450.0)
            .target_price(400.0)
            .priority(3),
        now - Duration::days(15),
        &conn,
    )?;
    append_price_history(monitor.id, 470.0, None, None, now - Duration::days(3), &conn)?;

    println!("Success!");

    Ok(())
}
