use std::error::Error;

use clap::Parser;
use rusqlite::Connection;

use delfin::{
    DEFAULT_ECB_URL, apply_ecb_rates, deduplicate_categories, fetch_ecb_xml, initialize_db,
    recalculate_all_balances, refresh_all_payee_statistics,
};

/// Create the delfin database, or bring an existing one up to date.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the SQLite database, created if it does not exist.
    #[arg(long)]
    db_path: String,

    /// Download the ECB exchange rate history after creating the tables.
    #[arg(long)]
    fetch_rates: bool,

    /// The ECB historical exchange rate feed.
    #[arg(long, default_value = DEFAULT_ECB_URL)]
    ecb_url: String,

    /// Merge categories that share a name and parent.
    #[arg(long)]
    dedupe_categories: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    println!("Opening database at {:#?}", args.db_path);
    let conn = Connection::open(&args.db_path)?;

    initialize_db(&conn)?;
    println!("Tables are ready.");

    if args.fetch_rates {
        println!("Downloading exchange rates from {}...", args.ecb_url);
        let xml = fetch_ecb_xml(&reqwest::Client::new(), &args.ecb_url).await?;
        let summary = apply_ecb_rates(&xml, &conn)?;
        println!(
            "Stored {} rates across {} days.",
            summary.rates, summary.days
        );
    }

    if args.dedupe_categories {
        let summary = deduplicate_categories(&conn)?;
        println!(
            "Merged {} duplicate categories and moved {} transactions.",
            summary.merged_categories, summary.transactions_reassigned
        );
    }

    let transaction = conn.unchecked_transaction()?;
    recalculate_all_balances(&transaction)?;
    let payee_count = refresh_all_payee_statistics(&transaction)?;
    transaction.commit()?;
    println!("Rebuilt balances and statistics for {payee_count} payees.");

    println!("Success!");

    Ok(())
}
