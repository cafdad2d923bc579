use tickforge_warehouse::{TableName, Warehouse};

use crate::cli::ModelArgs;
use crate::config::AppConfig;
use crate::error::CliError;

/// Fit the regression models against existing silver rows.
pub fn run(args: &ModelArgs, config: &AppConfig) -> Result<(), CliError> {
    let symbol = super::resolve_symbol(args.symbol.as_deref())?;
    let warehouse = Warehouse::open(config.warehouse.clone())?;

    let rows = warehouse.fetch_silver(&symbol)?;
    println!(
        "Fetched {} rows for symbol {symbol} from {}.",
        rows.len(),
        TableName::SilverStock
    );

    let reports = tickforge_ml::fit(&rows, &symbol)?;
    super::print_reports(&reports);

    Ok(())
}
