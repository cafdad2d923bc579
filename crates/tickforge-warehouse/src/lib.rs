//! # Tickforge Warehouse
//!
//! DuckDB persistence for the quote pipeline.
//!
//! ## Overview
//!
//! Two append-only tables keyed by (symbol, date):
//!
//! | Table | Description |
//! |-------|-------------|
//! | `stocks` | Raw ingested quotes, upstream encoding cast leniently |
//! | `silver_stock` | Cleaned, validated quotes ready for modeling |
//!
//! All values travel through parameterized queries; table names come from
//! the closed [`TableName`] enum and are never interpolated from input.
//! Primary-key collisions are overwrites (`INSERT OR REPLACE`), so
//! re-running the pipeline for a symbol converges instead of failing.
//!
//! The cleaned-table load goes through [`BatchLoader`]: rows buffer up to
//! a batch size and flush at the boundary. Flushes are not transactions —
//! a mid-flush failure leaves the rows already written in place
//! (at-least-once, not all-or-nothing).

pub mod migrations;
mod session;

use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use duckdb::{Connection, ToSql};
use thiserror::Error;
use tracing::{debug, info};

use tickforge_core::clean::parse_quote_date;
use tickforge_core::{Quote, RawQuote, Symbol, ValidationError};

/// Default flush boundary for the cleaned-table bulk load.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A persisted row no longer satisfies the quote invariants.
    #[error("stored row failed validation: {0}")]
    InvalidRow(#[from] ValidationError),
}

/// The closed set of tables this warehouse manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableName {
    Stocks,
    SilverStock,
}

impl TableName {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stocks => "stocks",
            Self::SilverStock => "silver_stock",
        }
    }

    /// Fixed schema for this table. Raw columns are nullable because the
    /// upstream payload may be missing fields; silver columns are not.
    pub(crate) fn create_sql(self, if_not_exists: bool) -> String {
        let clause = if if_not_exists { "IF NOT EXISTS " } else { "" };
        let null_suffix = match self {
            Self::Stocks => "",
            Self::SilverStock => " NOT NULL",
        };
        format!(
            "CREATE TABLE {clause}{name} (\
             symbol TEXT NOT NULL, \
             date DATE NOT NULL, \
             open_price DOUBLE{null_suffix}, \
             high_price DOUBLE{null_suffix}, \
             low_price DOUBLE{null_suffix}, \
             close_price DOUBLE{null_suffix}, \
             volume BIGINT{null_suffix}, \
             PRIMARY KEY (symbol, date));",
            name = self.as_str(),
        )
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for tickforge data.
    pub home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let home = resolve_tickforge_home();
        let db_path = home.join("warehouse.duckdb");
        Self { home, db_path }
    }
}

/// The run's warehouse handle: one session, used sequentially.
pub struct Warehouse {
    config: WarehouseConfig,
    session: Connection,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let session = session::open_session(config.db_path.as_path())?;
        let warehouse = Self { config, session };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply schema migrations.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        migrations::apply_migrations(&self.session)?;
        Ok(())
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.config.db_path.as_path()
    }

    /// Drop and recreate a table with its fixed schema.
    ///
    /// Destructive: every existing row in the table is lost.
    pub fn recreate(&self, table: TableName) -> Result<(), WarehouseError> {
        self.session
            .execute_batch(format!("DROP TABLE IF EXISTS {table}").as_str())?;
        self.session
            .execute_batch(table.create_sql(false).as_str())?;
        info!(table = table.as_str(), "recreated table");
        Ok(())
    }

    /// Insert raw rows into `stocks`, one parameterized statement per row.
    ///
    /// Missing numeric fields become NULL; the timestamp string is cast
    /// to a calendar date by the database. Key collisions overwrite.
    pub fn insert_raw(&self, rows: &[RawQuote]) -> Result<usize, WarehouseError> {
        for row in rows {
            let params: [&dyn ToSql; 7] = [
                &row.symbol,
                &row.timestamp,
                &row.open,
                &row.high,
                &row.low,
                &row.close,
                &row.volume,
            ];
            self.session.execute(
                "INSERT OR REPLACE INTO stocks \
                 (symbol, date, open_price, high_price, low_price, close_price, volume) \
                 VALUES (?, CAST(TRY_CAST(? AS TIMESTAMP) AS DATE), ?, ?, ?, ?, ?)",
                params.as_slice(),
            )?;
        }
        debug!(rows = rows.len(), "inserted raw rows");
        Ok(rows.len())
    }

    /// Bulk-insert cleaned quotes through a [`BatchLoader`].
    pub fn insert_quotes(
        &self,
        table: TableName,
        rows: &[Quote],
        batch_size: usize,
    ) -> Result<usize, WarehouseError> {
        let mut loader = BatchLoader::new(self, table, batch_size);
        for quote in rows {
            loader.push(quote.clone())?;
        }
        loader.flush()?;
        Ok(loader.rows_written())
    }

    /// Read cleaned rows for one symbol, ordered by date.
    pub fn fetch_silver(&self, symbol: &Symbol) -> Result<Vec<Quote>, WarehouseError> {
        let mut statement = self.session.prepare(
            "SELECT symbol, CAST(date AS VARCHAR), \
             open_price, high_price, low_price, close_price, volume \
             FROM silver_stock WHERE symbol = ? ORDER BY date",
        )?;
        let symbol_param = symbol.as_str().to_owned();
        let params: [&dyn ToSql; 1] = [&symbol_param];
        let mapped = statement.query_map(params.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?;

        let mut quotes = Vec::new();
        for row in mapped {
            let (symbol, date, open, high, low, close, volume) = row?;
            let date = parse_quote_date(&date)?;
            quotes.push(Quote::new(symbol, date, open, high, low, close, volume)?);
        }
        Ok(quotes)
    }

    /// Read every raw row back, upstream encoding restored as strings.
    pub fn fetch_raw(&self) -> Result<Vec<RawQuote>, WarehouseError> {
        let mut statement = self.session.prepare(
            "SELECT symbol, CAST(date AS VARCHAR), \
             open_price, high_price, low_price, close_price, volume \
             FROM stocks ORDER BY symbol, date",
        )?;
        let mapped = statement.query_map([], |row| {
            Ok(RawQuote {
                symbol: row.get::<_, String>(0)?,
                timestamp: row.get::<_, String>(1)?,
                open: row.get::<_, Option<f64>>(2)?,
                high: row.get::<_, Option<f64>>(3)?,
                low: row.get::<_, Option<f64>>(4)?,
                close: row.get::<_, Option<f64>>(5)?,
                volume: row.get::<_, Option<i64>>(6)?,
            })
        })?;

        let mut rows = Vec::new();
        for row in mapped {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// Count rows in a managed table.
    pub fn count_rows(&self, table: TableName) -> Result<i64, WarehouseError> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let count = self.session.query_row(sql.as_str(), [], |row| row.get(0))?;
        Ok(count)
    }

    fn insert_quote_row(&self, table: TableName, quote: &Quote) -> Result<(), WarehouseError> {
        let date = quote.date.to_string();
        let params: [&dyn ToSql; 7] = [
            &quote.symbol,
            &date,
            &quote.open,
            &quote.high,
            &quote.low,
            &quote.close,
            &quote.volume,
        ];
        let sql = format!(
            "INSERT OR REPLACE INTO {table} \
             (symbol, date, open_price, high_price, low_price, close_price, volume) \
             VALUES (?, TRY_CAST(? AS DATE), ?, ?, ?, ?, ?)",
        );
        self.session.execute(sql.as_str(), params.as_slice())?;
        Ok(())
    }
}

/// Buffered quote writer with an explicit flush boundary.
///
/// Rows buffer until `batch_size` is reached, then flush. A flush is a
/// sequence of independent inserts: on failure, rows written before the
/// failing one stay applied and the error propagates.
pub struct BatchLoader<'a> {
    warehouse: &'a Warehouse,
    table: TableName,
    batch_size: usize,
    buffer: Vec<Quote>,
    written: usize,
}

impl<'a> BatchLoader<'a> {
    pub fn new(warehouse: &'a Warehouse, table: TableName, batch_size: usize) -> Self {
        Self {
            warehouse,
            table,
            batch_size: batch_size.max(1),
            buffer: Vec::new(),
            written: 0,
        }
    }

    /// Buffer a row, flushing when the batch boundary is reached.
    pub fn push(&mut self, quote: Quote) -> Result<(), WarehouseError> {
        self.buffer.push(quote);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Write out everything currently buffered.
    pub fn flush(&mut self) -> Result<usize, WarehouseError> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let mut flushed = 0_usize;
        for index in 0..self.buffer.len() {
            self.warehouse
                .insert_quote_row(self.table, &self.buffer[index])?;
            self.written += 1;
            flushed += 1;
        }
        self.buffer.clear();
        debug!(table = self.table.as_str(), flushed, "flushed batch");
        Ok(flushed)
    }

    /// Total rows written across all flushes so far.
    pub fn rows_written(&self) -> usize {
        self.written
    }

    /// Rows currently buffered and not yet flushed.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Resolve the tickforge home directory from environment or default.
fn resolve_tickforge_home() -> PathBuf {
    if let Some(path) = env::var_os("TICKFORGE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".tickforge");
    }

    PathBuf::from(".tickforge")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::macros::date;

    fn open_test_warehouse(temp: &tempfile::TempDir) -> Warehouse {
        Warehouse::open(WarehouseConfig {
            home: temp.path().to_path_buf(),
            db_path: temp.path().join("warehouse.duckdb"),
        })
        .expect("warehouse open")
    }

    fn quote(symbol: &str, day: time::Date, close: f64) -> Quote {
        Quote::new(symbol, day, 100.0, 105.0, 99.0, close, 1_000).expect("valid quote")
    }

    #[test]
    fn open_initializes_both_tables() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_test_warehouse(&temp);

        assert_eq!(warehouse.count_rows(TableName::Stocks).expect("count"), 0);
        assert_eq!(
            warehouse.count_rows(TableName::SilverStock).expect("count"),
            0
        );
    }

    #[test]
    fn cleaned_rows_round_trip_through_silver() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_test_warehouse(&temp);
        let rows = vec![
            quote("IBM", date!(2024 - 01 - 01), 103.0),
            quote("IBM", date!(2024 - 01 - 02), 104.5),
        ];

        let written = warehouse
            .insert_quotes(TableName::SilverStock, &rows, DEFAULT_BATCH_SIZE)
            .expect("insert should succeed");
        assert_eq!(written, 2);

        let symbol = Symbol::parse("IBM").expect("valid symbol");
        let fetched = warehouse.fetch_silver(&symbol).expect("fetch");
        assert_eq!(fetched, rows);
    }

    #[test]
    fn key_collision_is_an_overwrite_not_an_error() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_test_warehouse(&temp);
        let day = date!(2024 - 01 - 01);

        warehouse
            .insert_quotes(
                TableName::SilverStock,
                &[quote("IBM", day, 103.0)],
                DEFAULT_BATCH_SIZE,
            )
            .expect("first insert");
        warehouse
            .insert_quotes(
                TableName::SilverStock,
                &[quote("IBM", day, 110.0)],
                DEFAULT_BATCH_SIZE,
            )
            .expect("second insert");

        let symbol = Symbol::parse("IBM").expect("valid symbol");
        let fetched = warehouse.fetch_silver(&symbol).expect("fetch");
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].close, 110.0);
    }

    #[test]
    fn recreate_leaves_an_empty_table() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_test_warehouse(&temp);
        warehouse
            .insert_quotes(
                TableName::SilverStock,
                &[quote("IBM", date!(2024 - 01 - 01), 103.0)],
                DEFAULT_BATCH_SIZE,
            )
            .expect("insert");

        warehouse
            .recreate(TableName::SilverStock)
            .expect("recreate");

        assert_eq!(
            warehouse.count_rows(TableName::SilverStock).expect("count"),
            0
        );
    }

    #[test]
    fn recreate_is_idempotent_when_table_is_absent() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_test_warehouse(&temp);

        warehouse
            .recreate(TableName::SilverStock)
            .expect("first recreate");
        warehouse
            .recreate(TableName::SilverStock)
            .expect("second recreate");
    }

    #[test]
    fn raw_rows_keep_missing_fields_as_null() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_test_warehouse(&temp);
        let rows = vec![RawQuote {
            symbol: String::from("IBM"),
            timestamp: String::from("2024-01-01 19:55:00"),
            open: Some(100.0),
            high: None,
            low: Some(99.0),
            close: Some(103.0),
            volume: Some(1_000),
        }];

        warehouse.insert_raw(&rows).expect("insert raw");

        let fetched = warehouse.fetch_raw().expect("fetch raw");
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].high, None);
        assert_eq!(fetched[0].open, Some(100.0));
        assert_eq!(fetched[0].timestamp, "2024-01-01");
    }

    #[test]
    fn intraday_rows_collapse_to_one_row_per_day() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_test_warehouse(&temp);
        let row = |timestamp: &str, close: f64| RawQuote {
            symbol: String::from("IBM"),
            timestamp: timestamp.to_owned(),
            open: Some(100.0),
            high: Some(105.0),
            low: Some(99.0),
            close: Some(close),
            volume: Some(1_000),
        };

        warehouse
            .insert_raw(&[
                row("2024-01-01 19:50:00", 103.0),
                row("2024-01-01 19:55:00", 104.0),
            ])
            .expect("insert raw");

        let fetched = warehouse.fetch_raw().expect("fetch raw");
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].close, Some(104.0));
    }

    #[test]
    fn batch_loader_flushes_at_the_boundary() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_test_warehouse(&temp);
        let mut loader = BatchLoader::new(&warehouse, TableName::SilverStock, 2);

        loader
            .push(quote("IBM", date!(2024 - 01 - 01), 103.0))
            .expect("push");
        assert_eq!(loader.rows_written(), 0);
        assert_eq!(loader.pending(), 1);

        loader
            .push(quote("IBM", date!(2024 - 01 - 02), 104.0))
            .expect("push");
        assert_eq!(loader.rows_written(), 2);
        assert_eq!(loader.pending(), 0);

        loader
            .push(quote("IBM", date!(2024 - 01 - 03), 105.0))
            .expect("push");
        assert_eq!(loader.rows_written(), 2);
        let flushed = loader.flush().expect("flush");
        assert_eq!(flushed, 1);
        assert_eq!(loader.rows_written(), 3);
    }

    #[test]
    fn silver_fetch_filters_to_the_requested_symbol() {
        let temp = tempdir().expect("tempdir");
        let warehouse = open_test_warehouse(&temp);
        warehouse
            .insert_quotes(
                TableName::SilverStock,
                &[
                    quote("IBM", date!(2024 - 01 - 01), 103.0),
                    quote("MSFT", date!(2024 - 01 - 01), 410.0),
                ],
                DEFAULT_BATCH_SIZE,
            )
            .expect("insert");

        let symbol = Symbol::parse("MSFT").expect("valid symbol");
        let fetched = warehouse.fetch_silver(&symbol).expect("fetch");
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].symbol, "MSFT");
    }
}
