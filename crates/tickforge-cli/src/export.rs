//! CSV export of cleaned rows.

use std::path::Path;

use tickforge_core::Quote;

pub fn write_quotes_csv(path: &Path, quotes: &[Quote]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["symbol", "date", "open", "high", "low", "close", "volume"])?;
    for quote in quotes {
        writer.write_record([
            quote.symbol.clone(),
            quote.date.to_string(),
            quote.open.to_string(),
            quote.high.to_string(),
            quote.low.to_string(),
            quote.close.to_string(),
            quote.volume.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
