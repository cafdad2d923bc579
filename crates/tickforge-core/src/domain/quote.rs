use time::Date;

use crate::error::ValidationError;

/// A quote row exactly as fetched, before cleaning.
///
/// Numeric fields are coerced at fetch time; an upstream field that was
/// missing or not a number is `None`. The timestamp keeps the upstream
/// string encoding so the raw table stores what the API actually sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
    pub symbol: String,
    pub timestamp: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

impl RawQuote {
    /// True when every required field is present.
    pub fn is_complete(&self) -> bool {
        !self.symbol.trim().is_empty()
            && !self.timestamp.trim().is_empty()
            && self.open.is_some()
            && self.high.is_some()
            && self.low.is_some()
            && self.close.is_some()
            && self.volume.is_some()
    }
}

/// A validated, cleaned quote keyed by (symbol, calendar date).
///
/// Invariant: all five numeric fields are present and finite, and the
/// date parsed successfully. Rows that cannot satisfy this are dropped
/// by the cleaner instead of constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub date: Date,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Quote {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        date: Date,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Result<Self, ValidationError> {
        validate_price("open", open)?;
        validate_price("high", high)?;
        validate_price("low", low)?;
        validate_price("close", close)?;
        if volume < 0 {
            return Err(ValidationError::NegativeValue { field: "volume" });
        }

        Ok(Self {
            symbol: symbol.into(),
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

fn validate_price(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn builds_valid_quote() {
        let quote = Quote::new("IBM", date!(2024 - 01 - 01), 100.0, 105.0, 99.0, 103.0, 1_000)
            .expect("quote should validate");
        assert_eq!(quote.symbol, "IBM");
        assert_eq!(quote.volume, 1_000);
    }

    #[test]
    fn rejects_non_finite_price() {
        let err = Quote::new("IBM", date!(2024 - 01 - 01), f64::NAN, 105.0, 99.0, 103.0, 1_000)
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::NonFiniteValue { field: "open" }));
    }

    #[test]
    fn rejects_negative_volume() {
        let err = Quote::new("IBM", date!(2024 - 01 - 01), 100.0, 105.0, 99.0, 103.0, -5)
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::NegativeValue { field: "volume" }));
    }

    #[test]
    fn raw_quote_completeness_requires_every_field() {
        let complete = RawQuote {
            symbol: String::from("IBM"),
            timestamp: String::from("2024-01-01 19:55:00"),
            open: Some(100.0),
            high: Some(105.0),
            low: Some(99.0),
            close: Some(103.0),
            volume: Some(1_000),
        };
        assert!(complete.is_complete());

        let missing = RawQuote {
            close: None,
            ..complete
        };
        assert!(!missing.is_complete());
    }
}
