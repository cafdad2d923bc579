use std::sync::Arc;

use tickforge_core::{clean, Interval, QuoteApiClient, ReqwestHttpClient};
use tickforge_warehouse::{TableName, Warehouse};

use crate::cli::RunArgs;
use crate::config::AppConfig;
use crate::error::CliError;
use crate::export;

/// Full pipeline: fetch -> raw load -> clean -> silver load -> model.
pub fn run(args: &RunArgs, config: &AppConfig) -> Result<(), CliError> {
    let symbol = super::resolve_symbol(args.symbol.as_deref())?;
    let interval: Interval = args.interval.parse()?;
    let batch_size = args.batch_size.unwrap_or(config.batch_size);

    let client = QuoteApiClient::new(
        Arc::new(ReqwestHttpClient::new()),
        config.api.base_url.as_str(),
        config.api.api_key.as_str(),
    );

    let Some(raw_rows) = client.fetch_intraday(&symbol, interval)? else {
        println!("No data found for symbol {symbol}.");
        return Ok(());
    };
    println!("Fetched {} rows for {symbol}.", raw_rows.len());

    let warehouse = Warehouse::open(config.warehouse.clone())?;
    let raw_written = warehouse.insert_raw(&raw_rows)?;
    println!("Raw data inserted into {} ({raw_written} rows).", TableName::Stocks);

    let outcome = clean(&raw_rows)?;
    println!(
        "Cleaned data: {} valid rows. Dropped {} rows with invalid dates.",
        outcome.quotes.len(),
        outcome.dropped_dates
    );

    warehouse.recreate(TableName::SilverStock)?;
    let written = warehouse.insert_quotes(TableName::SilverStock, &outcome.quotes, batch_size)?;
    println!("Cleaned data inserted into {} ({written} rows).", TableName::SilverStock);

    if let Some(path) = &args.export {
        export::write_quotes_csv(path.as_path(), &outcome.quotes)?;
        println!("Cleaned rows exported to {}.", path.display());
    }

    let reports = tickforge_ml::fit(&outcome.quotes, &symbol)?;
    super::print_reports(&reports);

    Ok(())
}
