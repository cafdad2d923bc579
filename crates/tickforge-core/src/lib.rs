//! # Tickforge Core
//!
//! Domain contracts and the ingest half of the tickforge pipeline.
//!
//! ## Overview
//!
//! This crate provides the pieces that run before anything touches the
//! warehouse:
//!
//! - **Domain types** for symbols, intraday intervals, and quote rows
//! - **HTTP transport abstraction** with a production reqwest client and
//!   a no-op client for deterministic offline tests
//! - **Quote API client** for the Alpha Vantage intraday endpoint
//! - **Cleaning pipeline** turning raw fetched rows into validated quotes
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`alphavantage`] | Intraday time-series fetcher |
//! | [`clean`] | Validation/coercion/date-filter pipeline |
//! | [`domain`] | Domain models (Symbol, Interval, RawQuote, Quote) |
//! | [`error`] | Core error types |
//! | [`http`] | HTTP client abstraction |

pub mod alphavantage;
pub mod clean;
pub mod domain;
pub mod error;
pub mod http;

pub use alphavantage::{FetchError, QuoteApiClient};
pub use clean::{clean, CleanError, CleanOutcome};
pub use domain::{Interval, Quote, RawQuote, Symbol};
pub use error::ValidationError;
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient};
