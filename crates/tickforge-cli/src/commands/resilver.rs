use tickforge_core::clean;
use tickforge_warehouse::{TableName, Warehouse};

use crate::cli::ResilverArgs;
use crate::config::AppConfig;
use crate::error::CliError;

/// Rebuild `silver_stock` from the persisted raw rows.
pub fn run(args: &ResilverArgs, config: &AppConfig) -> Result<(), CliError> {
    let warehouse = Warehouse::open(config.warehouse.clone())?;

    let raw_rows = warehouse.fetch_raw()?;
    println!("Fetched {} rows from {}.", raw_rows.len(), TableName::Stocks);

    let outcome = clean(&raw_rows)?;
    println!(
        "Cleaned data: {} valid rows. Dropped {} rows with invalid dates.",
        outcome.quotes.len(),
        outcome.dropped_dates
    );

    warehouse.recreate(TableName::SilverStock)?;
    let batch_size = args.batch_size.unwrap_or(config.batch_size);
    let written = warehouse.insert_quotes(TableName::SilverStock, &outcome.quotes, batch_size)?;
    println!("Bulk inserted {written} rows into {}.", TableName::SilverStock);

    Ok(())
}
