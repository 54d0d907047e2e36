//! Currency codes and the rounding rules for amounts and exchange rates.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

/// The currency every exchange rate is stored relative to.
pub const REFERENCE_CURRENCY: &str = "GBP";

/// A three letter, upper case ISO 4217 style currency code, e.g. "GBP".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a currency code from `code`, trimming whitespace and converting
    /// it to upper case.
    ///
    /// # Errors
    /// Returns [Error::InvalidCurrencyCode] if `code` is not three ASCII letters.
    pub fn new(code: &str) -> Result<Self, Error> {
        let code = code.trim();

        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(Error::InvalidCurrencyCode(code.to_owned()))
        }
    }

    /// The currency exchange rates are quoted against.
    pub fn reference() -> Self {
        Self(REFERENCE_CURRENCY.to_owned())
    }

    pub fn is_reference(&self) -> bool {
        self.0 == REFERENCE_CURRENCY
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        CurrencyCode::new(&code).map_err(serde::de::Error::custom)
    }
}

impl ToSql for CurrencyCode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for CurrencyCode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_str()?;
        CurrencyCode::new(code).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// Round a monetary amount to two decimal places.
pub fn round_amount(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Round an exchange rate to six decimal places.
pub fn round_rate(rate: f64) -> f64 {
    (rate * 1_000_000.0).round() / 1_000_000.0
}
