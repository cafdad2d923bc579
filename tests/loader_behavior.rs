//! Behavior-driven tests for the loader and table manager
//!
//! These tests verify the stated persistence contracts: last-write-wins
//! keys, explicit batch flush boundaries, and destructive recreate.

use tempfile::tempdir;
use tickforge_core::{Quote, Symbol};
use tickforge_tests::open_temp_warehouse;
use tickforge_warehouse::{BatchLoader, TableName, DEFAULT_BATCH_SIZE};
use time::macros::date;

fn quote(symbol: &str, day: time::Date, close: f64, volume: i64) -> Quote {
    Quote::new(symbol, day, close - 1.0, close + 1.5, close - 2.0, close, volume)
        .expect("valid quote")
}

#[test]
fn when_a_key_is_written_twice_the_read_returns_the_last_values() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_temp_warehouse(&temp);
    let day = date!(2024 - 01 - 01);

    warehouse
        .insert_quotes(
            TableName::SilverStock,
            &[quote("IBM", day, 103.0, 1_000)],
            DEFAULT_BATCH_SIZE,
        )
        .expect("first write");
    warehouse
        .insert_quotes(
            TableName::SilverStock,
            &[quote("IBM", day, 108.5, 2_500)],
            DEFAULT_BATCH_SIZE,
        )
        .expect("second write");

    let symbol = Symbol::parse("IBM").expect("valid symbol");
    let fetched = warehouse.fetch_silver(&symbol).expect("fetch");
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].close, 108.5);
    assert_eq!(fetched[0].volume, 2_500);
}

#[test]
fn when_pushes_cross_the_batch_boundary_rows_flush_without_an_explicit_call() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_temp_warehouse(&temp);
    let mut loader = BatchLoader::new(&warehouse, TableName::SilverStock, 3);
    let start = date!(2024 - 01 - 01);

    for offset in 0..7_i64 {
        loader
            .push(quote(
                "IBM",
                start + time::Duration::days(offset),
                100.0 + offset as f64,
                1_000,
            ))
            .expect("push");
    }

    // Two full batches flushed on push, one row still buffered
    assert_eq!(loader.rows_written(), 6);
    assert_eq!(loader.pending(), 1);
    assert_eq!(
        warehouse
            .count_rows(TableName::SilverStock)
            .expect("count"),
        6
    );

    loader.flush().expect("flush");
    assert_eq!(loader.rows_written(), 7);
    assert_eq!(
        warehouse
            .count_rows(TableName::SilverStock)
            .expect("count"),
        7
    );
}

#[test]
fn when_a_table_is_recreated_the_next_read_sees_zero_rows() {
    let temp = tempdir().expect("tempdir");
    let warehouse = open_temp_warehouse(&temp);
    warehouse
        .insert_quotes(
            TableName::SilverStock,
            &[quote("IBM", date!(2024 - 01 - 01), 103.0, 1_000)],
            DEFAULT_BATCH_SIZE,
        )
        .expect("insert");

    warehouse
        .recreate(TableName::SilverStock)
        .expect("recreate");

    let symbol = Symbol::parse("IBM").expect("valid symbol");
    assert!(warehouse.fetch_silver(&symbol).expect("fetch").is_empty());
}
