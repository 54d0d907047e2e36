use std::{collections::HashMap, fmt::Display, str::FromStr};

use rusqlite::{
    Connection, OptionalExtension, Row, ToSql, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Serialize, Serializer};
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::{
    Error,
    balance::to_base_currency,
    error::is_unique_violation,
    exchange_rate::{get_base_currency, get_latest_rates},
    money::{CurrencyCode, round_amount},
};

pub type BudgetId = i64;

/// A calendar month, written as "YYYY-MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: Month,
}

impl YearMonth {
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    pub fn of(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn first_day(&self) -> Date {
        // Day 1 exists in every month, so this only fails for years outside
        // the range `time` supports.
        Date::from_calendar_date(self.year, self.month, 1).unwrap_or(Date::MIN)
    }

    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self::new(self.year + 1, Month::January),
            month => Self::new(self.year, month.next()),
        }
    }

    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self::new(self.year - 1, Month::December),
            month => Self::new(self.year, month.previous()),
        }
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let invalid = || Error::InvalidYearMonth(text.to_owned());

        let (year, month) = text.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;

        Ok(Self::new(year, month))
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month as u8)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl ToSql for YearMonth {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for YearMonth {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A spending target for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    pub id: BudgetId,
    pub year_month: YearMonth,
    pub amount: f64,
    pub currency: CurrencyCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub year_month: YearMonth,
    pub amount: f64,
    /// Defaults to the base currency.
    pub currency: Option<CurrencyCode>,
}

/// A budget alongside what was actually spent in its month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetProgress {
    #[serde(flatten)]
    pub budget: Budget,
    /// Total expenses in the month in the budget's currency, as a positive number.
    pub spent: f64,
    pub remaining: f64,
}

impl BudgetProgress {
    /// Spending as a percentage of the budget, capped at 100 for display.
    pub fn percent_used(&self) -> f64 {
        (self.spent / self.budget.amount * 100.0).clamp(0.0, 100.0)
    }

    pub fn is_over(&self) -> bool {
        self.spent > self.budget.amount
    }
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            year_month TEXT NOT NULL UNIQUE,
            amount REAL NOT NULL CHECK (amount > 0),
            currency TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        year_month: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
    })
}

fn validate(budget: &NewBudget, connection: &Connection) -> Result<(f64, CurrencyCode), Error> {
    if budget.amount <= 0.0 || !budget.amount.is_finite() {
        return Err(Error::NonPositiveAmount);
    }

    let currency = match &budget.currency {
        Some(currency) => currency.clone(),
        None => get_base_currency(connection)?,
    };

    Ok((round_amount(budget.amount), currency))
}

pub fn create_budget(budget: &NewBudget, connection: &Connection) -> Result<Budget, Error> {
    let (amount, currency) = validate(budget, connection)?;

    connection
        .execute(
            "INSERT INTO budget (year_month, amount, currency) VALUES (?1, ?2, ?3)",
            params![budget.year_month, amount, currency],
        )
        .map_err(|error| map_duplicate_month(error, budget.year_month))?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        year_month: budget.year_month,
        amount,
        currency,
    })
}

pub fn get_budget(id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    connection
        .query_row(
            "SELECT id, year_month, amount, currency FROM budget WHERE id = ?1",
            [id],
            map_row,
        )
        .map_err(Error::from)
}

/// Every budget, latest month first.
pub fn get_all_budgets(connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare("SELECT id, year_month, amount, currency FROM budget ORDER BY year_month DESC")?
        .query_map([], map_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

pub fn update_budget(id: BudgetId, budget: &NewBudget, connection: &Connection) -> Result<(), Error> {
    let (amount, currency) = validate(budget, connection)?;

    let rows_affected = connection
        .execute(
            "UPDATE budget SET year_month = ?1, amount = ?2, currency = ?3,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?4",
            params![budget.year_month, amount, currency, id],
        )
        .map_err(|error| map_duplicate_month(error, budget.year_month))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("budget"));
    }

    Ok(())
}

pub fn delete_budget(id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM budget WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissing("budget"));
    }

    Ok(())
}

/// The expenses in `year_month` converted to `currency` with the latest rates.
///
/// Expenses are negative transactions that are not part of a transfer. The
/// result is positive.
pub fn get_month_spending(
    year_month: YearMonth,
    currency: &CurrencyCode,
    rates: &HashMap<CurrencyCode, f64>,
    connection: &Connection,
) -> Result<f64, Error> {
    let start = PrimitiveDateTime::new(year_month.first_day(), Time::MIDNIGHT);
    let end = PrimitiveDateTime::new(year_month.next().first_day(), Time::MIDNIGHT);

    let spent = connection
        .prepare(
            "SELECT currency, SUM(amount) FROM \"transaction\"
            WHERE amount < 0 AND transfer_id IS NULL AND date >= ?1 AND date < ?2
            GROUP BY currency",
        )?
        .query_map(params![start, end], |row| {
            Ok((row.get::<_, CurrencyCode>(0)?, row.get::<_, f64>(1)?))
        })?
        .try_fold(0.0, |total, row| {
            let (from, amount) = row?;
            Ok::<_, Error>(total - to_base_currency(amount, &from, currency, rates))
        })?;

    Ok(round_amount(spent))
}

fn with_progress(
    budget: Budget,
    rates: &HashMap<CurrencyCode, f64>,
    connection: &Connection,
) -> Result<BudgetProgress, Error> {
    let spent = get_month_spending(budget.year_month, &budget.currency, rates, connection)?;

    Ok(BudgetProgress {
        remaining: round_amount(budget.amount - spent),
        spent,
        budget,
    })
}

/// Every budget with its spending, latest month first.
pub fn get_budget_progress(connection: &Connection) -> Result<Vec<BudgetProgress>, Error> {
    let rates = get_latest_rates(connection)?;

    get_all_budgets(connection)?
        .into_iter()
        .map(|budget| with_progress(budget, &rates, connection))
        .collect()
}

/// The budget for `year_month` and its spending, if one was set.
pub fn get_budget_progress_for_month(
    year_month: YearMonth,
    connection: &Connection,
) -> Result<Option<BudgetProgress>, Error> {
    let budget = connection
        .query_row(
            "SELECT id, year_month, amount, currency FROM budget WHERE year_month = ?1",
            [year_month],
            map_row,
        )
        .optional()?;

    match budget {
        Some(budget) => {
            let rates = get_latest_rates(connection)?;
            with_progress(budget, &rates, connection).map(Some)
        }
        None => Ok(None),
    }
}

fn map_duplicate_month(error: rusqlite::Error, year_month: YearMonth) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateName("budget for", year_month.to_string())
    } else {
        error.into()
    }
}
