use clap::Parser;
use eyre::eyre;
use tracing::info;
use tracing_subscriber::EnvFilter;

use restbook::{
    book::{btree_book::BTreeBook, Book},
    order::{OrderId, OrderKind},
};

/// Replays a short sequence of order operations against an empty book,
/// printing the book after every step
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Number of price levels shown per side
    #[arg(short, long, default_value_t = 10)]
    depth: usize,

    /// Print snapshots as JSON instead of a price ladder
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn print_book(book: &BTreeBook, args: &Args, title: &str) -> eyre::Result<()> {
    println!("--- {title} ---");
    if args.json {
        println!("{}", serde_json::to_string(&book.snapshot(args.depth))?);
    } else {
        let snapshot = book.snapshot(args.depth);
        println!("ASKS (Price | Quantity)");
        for level in snapshot.asks.iter().rev() {
            println!("{:.2} | {}", level.price, level.quantity);
        }
        println!("BIDS (Price | Quantity)");
        for level in &snapshot.bids {
            println!("{:.2} | {}", level.price, level.quantity);
        }
    }
    println!();
    Ok(())
}

fn main() -> eyre::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut book = BTreeBook::new(1, "Demo".to_string(), "DEMO".to_string());
    info!(ticker = %book.ticker(), "replaying demo orders");
    print_book(&book, &args, "Initial Empty Book")?;

    let orders: Vec<OrderId> = [
        (OrderKind::Bid, 100.0, 10),
        (OrderKind::Bid, 100.0, 5),
        (OrderKind::Bid, 99.0, 20),
        (OrderKind::Ask, 100.0, 15),
        (OrderKind::Ask, 102.0, 10),
        (OrderKind::Ask, 101.0, 5),
    ]
    .into_iter()
    .map(|(kind, price, quantity)| book.new_order(kind, price, quantity))
    .collect::<Result<_, _>>()?;
    print_book(&book, &args, "Book After Adding Orders")?;

    let bbo = book.bbo();
    if args.json {
        println!("{}", serde_json::to_string(&bbo)?);
    } else {
        println!("Best Bid: {:.2} | Qty: {}", bbo.bid.price, bbo.bid.quantity);
        println!("Best Ask: {:.2} | Qty: {}", bbo.ask.price, bbo.ask.quantity);
    }
    if book.crossed() {
        println!("(book is crossed: resting orders are never matched)");
    }
    println!();

    if !book.cancel_order(orders[1]) {
        return Err(eyre!("order {} was not resting", orders[1]));
    }
    print_book(&book, &args, &format!("Cancelled Order {}", orders[1]))?;

    if !book.amend_order(orders[2], 99.0, 25)? {
        return Err(eyre!("order {} was not resting", orders[2]));
    }
    print_book(
        &book,
        &args,
        &format!("Amended Order {} to 25 @ 99.00", orders[2]),
    )?;

    if !book.amend_order(orders[4], 100.5, 10)? {
        return Err(eyre!("order {} was not resting", orders[4]));
    }
    print_book(
        &book,
        &args,
        &format!("Amended Order {} to 10 @ 100.50", orders[4]),
    )?;

    println!("{book}");
    Ok(())
}
