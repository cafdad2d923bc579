//! Intraday time-series fetcher for the Alpha Vantage quote API.
//!
//! The response is keyed by `Time Series (<interval>)` with string-encoded
//! OHLCV fields, so decoding goes through `serde_json::Value` and a
//! `BTreeMap` over the per-timestamp entries. The map's key order doubles
//! as chronological order.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Interval, RawQuote, Symbol};
use crate::http::{HttpClient, HttpError, HttpRequest, NoopHttpClient};

/// Errors raised when a fetch actually failed.
///
/// An upstream "no data for this symbol" outcome is not an error: it is
/// reported as `Ok(None)` so callers can tell absence from failure.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    #[error("quote API returned status {status}")]
    Status { status: u16 },

    #[error("quote API response was not valid JSON: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("quote API throttled the request: {note}")]
    Throttled { note: String },
}

/// Per-timestamp payload entry; fields arrive as strings.
#[derive(Debug, Deserialize)]
struct SeriesEntry {
    #[serde(rename = "1. open")]
    open: Option<String>,
    #[serde(rename = "2. high")]
    high: Option<String>,
    #[serde(rename = "3. low")]
    low: Option<String>,
    #[serde(rename = "4. close")]
    close: Option<String>,
    #[serde(rename = "5. volume")]
    volume: Option<String>,
}

/// Client for the intraday quote endpoint.
pub struct QuoteApiClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    api_key: String,
}

impl QuoteApiClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.alphavantage.co/query";

    pub fn new(
        http: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Fetch one symbol/interval worth of intraday rows.
    ///
    /// Returns `Ok(None)` when the API reports no usable time series for
    /// the symbol; the cause is logged. Transport, status, parse, and
    /// throttle failures surface as [`FetchError`].
    pub fn fetch_intraday(
        &self,
        symbol: &Symbol,
        interval: Interval,
    ) -> Result<Option<Vec<RawQuote>>, FetchError> {
        let request = HttpRequest::get(self.query_url(symbol, interval));
        let response = self.http.execute(request)?;

        if !response.is_success() {
            return Err(FetchError::Status {
                status: response.status,
            });
        }

        let payload: serde_json::Value = serde_json::from_str(&response.body)?;

        if let Some(message) = string_field(&payload, "Error Message") {
            warn!(symbol = %symbol, %message, "quote API reported no data");
            return Ok(None);
        }
        for key in ["Note", "Information"] {
            if let Some(note) = string_field(&payload, key) {
                return Err(FetchError::Throttled { note });
            }
        }

        let series_key = interval.series_key();
        let Some(series_value) = payload.get(&series_key) else {
            warn!(symbol = %symbol, %series_key, "response carried no time series");
            return Ok(None);
        };

        let entries: BTreeMap<String, SeriesEntry> =
            serde_json::from_value(series_value.clone())?;
        if entries.is_empty() {
            warn!(symbol = %symbol, "time series was empty");
            return Ok(None);
        }

        let mut incomplete = 0_usize;
        let rows: Vec<RawQuote> = entries
            .into_iter()
            .map(|(timestamp, entry)| {
                let row = RawQuote {
                    symbol: symbol.as_str().to_owned(),
                    timestamp,
                    open: coerce_f64(entry.open),
                    high: coerce_f64(entry.high),
                    low: coerce_f64(entry.low),
                    close: coerce_f64(entry.close),
                    volume: coerce_i64(entry.volume),
                };
                if !row.is_complete() {
                    incomplete += 1;
                }
                row
            })
            .collect();

        if incomplete > 0 {
            debug!(symbol = %symbol, incomplete, "fetched rows with missing fields");
        }

        Ok(Some(rows))
    }

    fn query_url(&self, symbol: &Symbol, interval: Interval) -> String {
        format!(
            "{base}?function=TIME_SERIES_INTRADAY&symbol={symbol}&interval={interval}&apikey={key}",
            base = self.base_url,
            symbol = symbol.as_str(),
            interval = interval.as_str(),
            key = self.api_key,
        )
    }
}

impl Default for QuoteApiClient {
    fn default() -> Self {
        Self {
            http: Arc::new(NoopHttpClient),
            base_url: String::from(Self::DEFAULT_BASE_URL),
            api_key: std::env::var("TICKFORGE_API_KEY").unwrap_or_else(|_| String::from("demo")),
        }
    }
}

fn string_field(payload: &serde_json::Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

fn coerce_f64(value: Option<String>) -> Option<f64> {
    value.and_then(|raw| raw.trim().parse::<f64>().ok())
}

fn coerce_i64(value: Option<String>) -> Option<i64> {
    value.and_then(|raw| raw.trim().parse::<i64>().ok())
}
