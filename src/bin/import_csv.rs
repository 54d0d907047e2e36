use std::{error::Error, path::PathBuf, process::exit};

use clap::Parser;
use rusqlite::Connection;

use delfin::{import_financisto_csv, initialize_db};

/// Import transactions from a Financisto CSV export into the delfin database.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the SQLite database.
    #[arg(long)]
    db_path: String,

    /// The Financisto CSV export to import.
    csv_path: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if !args.csv_path.is_file() {
        eprintln!("No file found at {:#?}", args.csv_path);
        exit(1);
    }

    let text = std::fs::read_to_string(&args.csv_path)?;

    let conn = Connection::open(&args.db_path)?;
    initialize_db(&conn)?;

    println!("Importing {:#?}...", args.csv_path);
    let summary = import_financisto_csv(&[text], &conn)?;

    println!("Import complete!");
    println!("   Imported: {}", summary.imported);
    println!("   Already imported: {}", summary.duplicates);
    println!("   Skipped: {}", summary.invalid);

    Ok(())
}
