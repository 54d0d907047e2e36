//! Monthly figures for the dashboard charts, converted to the base currency
//! with the exchange rate of each transaction's day.
//!
//! Transfers only move money between accounts, so they are left out of the
//! income and expense figures.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::{
    Error,
    budget::YearMonth,
    exchange_rate::{convert_amount, get_latest_rates, get_rates_in_range},
    money::{CurrencyCode, round_amount},
};

/// The label for expenses without a category.
pub const UNCATEGORISED_LABEL: &str = "Uncategorised";

/// Income and expenses for one month. Both are positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub month: YearMonth,
    pub income: f64,
    pub expenses: f64,
}

/// Consecutive months from `first` to `last`, inclusive.
pub fn months_between(first: YearMonth, last: YearMonth) -> Vec<YearMonth> {
    let mut months = Vec::new();
    let mut month = first;

    while month <= last {
        months.push(month);
        month = month.next();
    }

    months
}

/// The twelve months ending with `last`.
pub fn last_twelve_months(last: YearMonth) -> Vec<YearMonth> {
    let first = (0..11).fold(last, |month, _| month.previous());
    months_between(first, last)
}

/// Converts amounts to one currency using the rates stored for each day.
///
/// Currencies without a rate on or before a day use the latest known rate.
struct DailyConverter {
    start: Date,
    days: Vec<HashMap<CurrencyCode, f64>>,
    latest: HashMap<CurrencyCode, f64>,
    to: CurrencyCode,
}

impl DailyConverter {
    fn load(
        start: Date,
        end: Date,
        to: &CurrencyCode,
        connection: &Connection,
    ) -> Result<Self, Error> {
        let currencies: Vec<CurrencyCode> = connection
            .prepare("SELECT DISTINCT currency FROM \"transaction\"")?
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let days = get_rates_in_range(&currencies, start, end, connection)?
            .into_iter()
            .map(|(_, rates)| rates)
            .collect();

        Ok(Self {
            start,
            days,
            latest: get_latest_rates(connection)?,
            to: to.clone(),
        })
    }

    fn rate(&self, currency: &CurrencyCode, date: Date) -> f64 {
        let index = (date - self.start).whole_days();

        usize::try_from(index)
            .ok()
            .and_then(|index| self.days.get(index))
            .and_then(|rates| rates.get(currency))
            .or_else(|| self.latest.get(currency))
            .copied()
            .unwrap_or(1.0)
    }

    fn convert(&self, amount: f64, currency: &CurrencyCode, date: Date) -> f64 {
        convert_amount(
            amount,
            currency,
            &self.to,
            self.rate(currency, date),
            self.rate(&self.to, date),
        )
    }
}

fn month_bounds(months: &[YearMonth]) -> Option<(YearMonth, YearMonth)> {
    Some((*months.first()?, *months.last()?))
}

fn start_of(month: YearMonth) -> PrimitiveDateTime {
    PrimitiveDateTime::new(month.first_day(), Time::MIDNIGHT)
}

/// Income and expenses for each of `months`, which must be in order.
///
/// Months without transactions are included with zero totals.
pub fn get_monthly_totals(
    months: &[YearMonth],
    base_currency: &CurrencyCode,
    connection: &Connection,
) -> Result<Vec<MonthlyTotals>, Error> {
    let Some((first, last)) = month_bounds(months) else {
        return Ok(Vec::new());
    };
    let end = last.next().first_day();
    let converter = DailyConverter::load(
        first.first_day(),
        end.previous_day().unwrap_or(end),
        base_currency,
        connection,
    )?;

    let mut totals: HashMap<YearMonth, (f64, f64)> = HashMap::new();
    let mut statement = connection.prepare(
        "SELECT date, amount, currency FROM \"transaction\"
        WHERE transfer_id IS NULL AND date >= ?1 AND date < ?2",
    )?;
    let rows = statement.query_map(params![start_of(first), start_of(last.next())], |row| {
        Ok((
            row.get::<_, PrimitiveDateTime>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, CurrencyCode>(2)?,
        ))
    })?;

    for row in rows {
        let (date, amount, currency) = row?;
        let amount = converter.convert(amount, &currency, date.date());
        let (income, expenses) = totals.entry(YearMonth::of(date.date())).or_default();

        if amount >= 0.0 {
            *income += amount;
        } else {
            *expenses -= amount;
        }
    }

    Ok(months
        .iter()
        .map(|month| {
            let (income, expenses) = totals.get(month).copied().unwrap_or_default();
            MonthlyTotals {
                month: *month,
                income: round_amount(income),
                expenses: round_amount(expenses),
            }
        })
        .collect())
}

/// Expenses over `months` grouped by top level category, largest first.
///
/// Expenses in a subcategory count towards its parent.
pub fn get_expenses_by_category(
    months: &[YearMonth],
    base_currency: &CurrencyCode,
    connection: &Connection,
) -> Result<Vec<(String, f64)>, Error> {
    let Some((first, last)) = month_bounds(months) else {
        return Ok(Vec::new());
    };
    let end = last.next().first_day();
    let converter = DailyConverter::load(
        first.first_day(),
        end.previous_day().unwrap_or(end),
        base_currency,
        connection,
    )?;

    let mut totals: HashMap<String, f64> = HashMap::new();
    let mut statement = connection.prepare(
        "SELECT t.date, t.amount, t.currency, COALESCE(parent.name, c.name)
        FROM \"transaction\" t
        LEFT JOIN category c ON c.id = t.category_id
        LEFT JOIN category parent ON parent.id = c.parent_id
        WHERE t.transfer_id IS NULL AND t.amount < 0 AND t.date >= ?1 AND t.date < ?2",
    )?;
    let rows = statement.query_map(params![start_of(first), start_of(last.next())], |row| {
        Ok((
            row.get::<_, PrimitiveDateTime>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, CurrencyCode>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    for row in rows {
        let (date, amount, currency, category) = row?;
        let category = category.unwrap_or_else(|| UNCATEGORISED_LABEL.to_owned());

        *totals.entry(category).or_default() -= converter.convert(amount, &currency, date.date());
    }

    let mut totals: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(category, amount)| (category, round_amount(amount)))
        .collect();
    totals.sort_by(|(a_name, a), (b_name, b)| b.total_cmp(a).then_with(|| a_name.cmp(b_name)));

    Ok(totals)
}

/// The total balance across accounts at the end of each month.
///
/// Months before the first transaction have a balance of zero.
pub fn get_month_end_balances(
    months: &[YearMonth],
    connection: &Connection,
) -> Result<Vec<f64>, Error> {
    let mut statement = connection.prepare(
        "SELECT total_balance_after FROM \"transaction\"
        WHERE date < ?1
        ORDER BY date DESC, id DESC
        LIMIT 1",
    )?;

    months
        .iter()
        .map(|month| {
            let balance: Option<Option<f64>> = statement
                .query_row([start_of(month.next())], |row| row.get(0))
                .optional()?;

            Ok(balance.flatten().unwrap_or(0.0))
        })
        .collect()
}

/// Month names as three letter abbreviations with the year, e.g. "Mar 25".
pub fn format_month_labels(months: &[YearMonth]) -> Vec<String> {
    months
        .iter()
        .map(|month| {
            let name = match month.first_day().month() {
                Month::January => "Jan",
                Month::February => "Feb",
                Month::March => "Mar",
                Month::April => "Apr",
                Month::May => "May",
                Month::June => "Jun",
                Month::July => "Jul",
                Month::August => "Aug",
                Month::September => "Sep",
                Month::October => "Oct",
                Month::November => "Nov",
                Month::December => "Dec",
            };

            format!("{name} {:02}", month.first_day().year() % 100)
        })
        .collect()
}
