//! Stored exchange rates and currency conversion.
//!
//! Rates are expressed as units of a currency per one unit of the reference
//! currency (GBP), so the rate of GBP itself is always 1.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use time::{Date, Duration};

use crate::{
    Error,
    money::{CurrencyCode, REFERENCE_CURRENCY, round_rate},
};

/// How many days before a date to look for a rate when the date has none,
/// e.g. for weekends and bank holidays.
pub const RATE_LOOK_BACK_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRate {
    pub id: i64,
    pub currency: CurrencyCode,
    pub rate: f64,
    #[serde(with = "crate::datetime::iso_date")]
    pub date: Date,
}

pub fn create_exchange_rate_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS exchange_rate (
            id INTEGER PRIMARY KEY,
            currency TEXT NOT NULL,
            rate REAL NOT NULL,
            date TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(currency, date)
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<ExchangeRate, rusqlite::Error> {
    Ok(ExchangeRate {
        id: row.get(0)?,
        currency: row.get(1)?,
        rate: row.get(2)?,
        date: row.get(3)?,
    })
}

/// Store the rate of `currency` on `date`, replacing any rate already stored
/// for that day.
pub fn upsert_exchange_rate(
    currency: &CurrencyCode,
    rate: f64,
    date: Date,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO exchange_rate (currency, rate, date) VALUES (?1, ?2, ?3)
        ON CONFLICT(currency, date) DO UPDATE SET rate = excluded.rate",
        params![currency, round_rate(rate), date],
    )?;

    Ok(())
}

/// The most recent rate of every stored currency, plus the reference currency.
pub fn get_latest_rates(connection: &Connection) -> Result<HashMap<CurrencyCode, f64>, Error> {
    let mut rates: HashMap<CurrencyCode, f64> = connection
        .prepare(
            "SELECT e.currency, e.rate FROM exchange_rate e
            WHERE e.date = (SELECT MAX(date) FROM exchange_rate WHERE currency = e.currency)",
        )?
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;

    rates.insert(CurrencyCode::reference(), 1.0);

    Ok(rates)
}

/// The latest stored rates as rows, sorted by currency.
pub fn get_latest_exchange_rates(connection: &Connection) -> Result<Vec<ExchangeRate>, Error> {
    connection
        .prepare(
            "SELECT e.id, e.currency, e.rate, e.date FROM exchange_rate e
            WHERE e.date = (SELECT MAX(date) FROM exchange_rate WHERE currency = e.currency)
            ORDER BY e.currency ASC",
        )?
        .query_map([], map_row)?
        .map(|maybe_rate| maybe_rate.map_err(Error::from))
        .collect()
}

/// The most recently dated rates, newest first.
pub fn get_exchange_rate_history(
    limit: u32,
    connection: &Connection,
) -> Result<Vec<ExchangeRate>, Error> {
    connection
        .prepare(
            "SELECT id, currency, rate, date FROM exchange_rate
            ORDER BY date DESC, currency ASC LIMIT ?1",
        )?
        .query_map([limit], map_row)?
        .map(|maybe_rate| maybe_rate.map_err(Error::from))
        .collect()
}

/// The rate of `currency` on `date`, or the closest earlier rate within
/// [RATE_LOOK_BACK_DAYS].
pub fn get_rate_for_date(
    currency: &CurrencyCode,
    date: Date,
    connection: &Connection,
) -> Result<Option<f64>, Error> {
    if currency.is_reference() {
        return Ok(Some(1.0));
    }

    connection
        .query_row(
            "SELECT rate FROM exchange_rate
            WHERE currency = ?1 AND date <= ?2 AND date >= ?3
            ORDER BY date DESC LIMIT 1",
            params![currency, date, date - Duration::days(RATE_LOOK_BACK_DAYS)],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
}

/// Every rate stored for `date`.
///
/// If `date` has no rates, the closest earlier day with rates within
/// [RATE_LOOK_BACK_DAYS] is used instead. The reference currency is always
/// included.
pub fn get_rates_for_date(
    date: Date,
    connection: &Connection,
) -> Result<HashMap<CurrencyCode, f64>, Error> {
    let rate_date: Option<Date> = connection
        .query_row(
            "SELECT MAX(date) FROM exchange_rate WHERE date <= ?1 AND date >= ?2",
            params![date, date - Duration::days(RATE_LOOK_BACK_DAYS)],
            |row| row.get::<_, Option<Date>>(0),
        )
        .optional()?
        .flatten();

    let mut rates: HashMap<CurrencyCode, f64> = match rate_date {
        Some(rate_date) => connection
            .prepare("SELECT currency, rate FROM exchange_rate WHERE date = ?1")?
            .query_map([rate_date], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?,
        None => HashMap::new(),
    };

    rates.insert(CurrencyCode::reference(), 1.0);

    Ok(rates)
}

/// The rates of `currencies` for each day from `start` to `end` inclusive.
///
/// Days without a stored rate carry the last known rate forward. Currencies
/// with no rate yet in the range are left out of that day's map.
pub fn get_rates_in_range(
    currencies: &[CurrencyCode],
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<(Date, HashMap<CurrencyCode, f64>)>, Error> {
    let mut statement = connection.prepare(
        "SELECT currency, rate, date FROM exchange_rate
        WHERE date >= ?1 AND date <= ?2
        ORDER BY date ASC",
    )?;

    let mut by_date: HashMap<Date, Vec<(CurrencyCode, f64)>> = HashMap::new();
    for row in statement.query_map(params![start, end], |row| {
        Ok((row.get::<_, CurrencyCode>(0)?, row.get(1)?, row.get(2)?))
    })? {
        let (currency, rate, date): (CurrencyCode, f64, Date) = row?;

        if currencies.contains(&currency) {
            by_date.entry(date).or_default().push((currency, rate));
        }
    }

    let mut current = HashMap::from([(CurrencyCode::reference(), 1.0)]);
    let mut days = Vec::new();
    let mut date = start;

    while date <= end {
        if let Some(rates) = by_date.remove(&date) {
            current.extend(rates);
        }

        days.push((date, current.clone()));

        match date.next_day() {
            Some(next) => date = next,
            None => break,
        }
    }

    Ok(days)
}

/// Convert `amount` from one currency to another through the reference
/// currency. `rate_from` and `rate_to` are the currencies' rates against the
/// reference currency. A zero source rate converts to zero.
pub fn convert_amount(
    amount: f64,
    from: &CurrencyCode,
    to: &CurrencyCode,
    rate_from: f64,
    rate_to: f64,
) -> f64 {
    if from == to {
        return amount;
    }

    if rate_from == 0.0 {
        return 0.0;
    }

    amount / rate_from * rate_to
}

/// The currency used by the most transactions, or GBP if there are none.
pub fn get_base_currency(connection: &Connection) -> Result<CurrencyCode, Error> {
    let currency: Option<CurrencyCode> = connection
        .query_row(
            "SELECT currency FROM \"transaction\"
            GROUP BY currency
            ORDER BY COUNT(*) DESC, currency ASC
            LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(currency.unwrap_or_else(CurrencyCode::reference))
}

/// The currencies other than GBP used by at least one transaction.
pub fn get_foreign_transaction_currencies(
    connection: &Connection,
) -> Result<Vec<CurrencyCode>, Error> {
    connection
        .prepare(
            "SELECT DISTINCT currency FROM \"transaction\"
            WHERE currency != ?1 ORDER BY currency",
        )?
        .query_map([REFERENCE_CURRENCY], |row| row.get(0))?
        .map(|maybe_currency| maybe_currency.map_err(Error::from))
        .collect()
}
