//! Cleaning pipeline: raw fetched rows in, validated quotes out.
//!
//! Each stage is a total function over the previous stage's output; a row
//! that fails a stage is dropped and counted, never raised. Only the
//! structural "nothing to clean" case surfaces as an error.

use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};
use tracing::{info, warn};

use crate::domain::{Quote, RawQuote, Symbol};
use crate::error::ValidationError;

const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Structural cleaning failures; per-row problems never reach here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CleanError {
    #[error("no rows to clean")]
    EmptyInput,
}

/// Cleaned rows plus the per-stage drop counters.
///
/// The counters are side observations for logging and tests; they do not
/// influence control flow.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanOutcome {
    pub quotes: Vec<Quote>,
    pub dropped_missing: usize,
    pub dropped_invalid: usize,
    pub dropped_dates: usize,
}

impl CleanOutcome {
    pub fn dropped_total(&self) -> usize {
        self.dropped_missing + self.dropped_invalid + self.dropped_dates
    }
}

/// Run the full cleaning pipeline over raw rows.
///
/// Stages: drop rows with missing fields, coerce/validate the typed
/// fields, parse and filter dates, re-sequence. Output ordering follows
/// input ordering; the output `Vec` gives the contiguous 0..n-1 index.
pub fn clean(records: &[RawQuote]) -> Result<CleanOutcome, CleanError> {
    if records.is_empty() {
        return Err(CleanError::EmptyInput);
    }

    let (complete, dropped_missing) = drop_missing(records);
    let (typed, dropped_invalid) = coerce_fields(complete);
    let (quotes, dropped_dates) = parse_dates(typed);

    if dropped_dates > 0 {
        warn!(dropped_dates, "dropped rows with invalid dates");
    }
    info!(
        kept = quotes.len(),
        dropped_missing, dropped_invalid, dropped_dates, "cleaning finished"
    );

    Ok(CleanOutcome {
        quotes,
        dropped_missing,
        dropped_invalid,
        dropped_dates,
    })
}

/// Parse a quote date from either an intraday timestamp or a bare date.
pub fn parse_quote_date(raw: &str) -> Result<Date, ValidationError> {
    let trimmed = raw.trim();
    PrimitiveDateTime::parse(trimmed, DATETIME_FORMAT)
        .map(|dt| dt.date())
        .or_else(|_| Date::parse(trimmed, DATE_FORMAT))
        .map_err(|_| ValidationError::UnparsableDate {
            value: raw.to_owned(),
        })
}

/// Stage 1: keep only rows with every required field present.
fn drop_missing(records: &[RawQuote]) -> (Vec<&RawQuote>, usize) {
    let kept: Vec<&RawQuote> = records.iter().filter(|row| row.is_complete()).collect();
    let dropped = records.len() - kept.len();
    (kept, dropped)
}

/// Intermediate shape between coercion and date parsing.
struct TypedRow<'a> {
    symbol: Symbol,
    timestamp: &'a str,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

/// Stage 2: coerce and validate typed fields; failures are dropped.
fn coerce_fields(rows: Vec<&RawQuote>) -> (Vec<TypedRow<'_>>, usize) {
    let input_len = rows.len();
    let typed: Vec<TypedRow<'_>> = rows
        .into_iter()
        .filter_map(|row| {
            let symbol = Symbol::parse(&row.symbol).ok()?;
            // stage 1 guarantees completeness; `?` keeps this stage total
            let typed = TypedRow {
                symbol,
                timestamp: row.timestamp.as_str(),
                open: row.open?,
                high: row.high?,
                low: row.low?,
                close: row.close?,
                volume: row.volume?,
            };
            let finite = [typed.open, typed.high, typed.low, typed.close]
                .iter()
                .all(|value| value.is_finite() && *value >= 0.0);
            (finite && typed.volume >= 0).then_some(typed)
        })
        .collect();
    let dropped = input_len - typed.len();
    (typed, dropped)
}

/// Stage 3 + 4: parse dates, drop invalid ones, re-sequence.
fn parse_dates(rows: Vec<TypedRow<'_>>) -> (Vec<Quote>, usize) {
    let input_len = rows.len();
    let quotes: Vec<Quote> = rows
        .into_iter()
        .filter_map(|row| {
            let date = parse_quote_date(row.timestamp).ok()?;
            Quote::new(
                row.symbol.as_str(),
                date,
                row.open,
                row.high,
                row.low,
                row.close,
                row.volume,
            )
            .ok()
        })
        .collect();
    let dropped = input_len - quotes.len();
    (quotes, dropped)
}
