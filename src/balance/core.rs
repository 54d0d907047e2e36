//! Maintains the running balances cached on transactions.
//!
//! Every transaction stores `account_balance_after`, the balance of its account
//! after it, and `total_balance_after`, the balance of all accounts after it
//! converted to the base currency. Transactions are ordered by [SortKey].

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, params};
use time::PrimitiveDateTime;

use crate::{
    Error,
    account::AccountId,
    exchange_rate::{convert_amount, get_base_currency, get_latest_rates},
    money::{CurrencyCode, round_amount},
    transaction::TransactionId,
};

/// The position of a transaction in balance order: by date, then by ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    pub date: PrimitiveDateTime,
    pub id: TransactionId,
}

/// Records the base currency the cached totals were computed in.
pub fn create_balance_state_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS balance_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            base_currency TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Recompute cached balances from `from` onwards.
///
/// The running balance of each account in `account_ids` is recalculated for
/// transactions at or after `from`, as is the total balance of every
/// transaction at or after `from`. `None` recomputes everything.
///
/// This function does not open an SQL transaction, callers that also modify
/// transactions should call it inside the same SQL transaction.
pub fn recalculate_balances(
    from: Option<SortKey>,
    account_ids: &[AccountId],
    connection: &Connection,
) -> Result<(), Error> {
    let mut account_ids = account_ids.to_vec();
    account_ids.sort_unstable();
    account_ids.dedup();

    for account_id in account_ids {
        recalculate_account_balances(from, account_id, connection)?;
    }

    recalculate_total_balances(from, connection)
}

/// Rebuild the cached balances of every account and every total.
pub fn recalculate_all_balances(connection: &Connection) -> Result<(), Error> {
    let account_ids: Vec<AccountId> = connection
        .prepare("SELECT id FROM account")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    recalculate_balances(None, &account_ids, connection)
}

/// The balance of all accounts after the latest transaction, in the base
/// currency, excluding initial balances.
pub fn get_total_balance(connection: &Connection) -> Result<f64, Error> {
    let total: Option<Option<f64>> = connection
        .query_row(
            "SELECT total_balance_after FROM \"transaction\"
            ORDER BY date DESC, id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(total.flatten().unwrap_or(0.0))
}

/// Where to start walking forward from, and the balance just before it.
///
/// The starting point is dropped when the cached value before it is missing,
/// which forces a full recomputation.
fn resolve_seed(
    from: Option<SortKey>,
    previous: Option<Option<f64>>,
    default: f64,
) -> (f64, Option<SortKey>) {
    match (from, previous) {
        (Some(from), None) => (default, Some(from)),
        (Some(from), Some(Some(balance))) => (balance, Some(from)),
        _ => (default, None),
    }
}

fn recalculate_account_balances(
    from: Option<SortKey>,
    account_id: AccountId,
    connection: &Connection,
) -> Result<(), Error> {
    let initial_balance: Option<f64> = connection
        .query_row(
            "SELECT initial_balance FROM account WHERE id = ?1",
            [account_id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(initial_balance) = initial_balance else {
        return Ok(());
    };

    let previous: Option<Option<f64>> = match from {
        Some(from) => connection
            .query_row(
                "SELECT account_balance_after FROM \"transaction\"
                WHERE account_id = ?1 AND (date < ?2 OR (date = ?2 AND id < ?3))
                ORDER BY date DESC, id DESC LIMIT 1",
                params![account_id, from.date, from.id],
                |row| row.get(0),
            )
            .optional()?,
        None => None,
    };

    let (mut running_balance, from) = resolve_seed(from, previous, initial_balance);

    let rows: Vec<(TransactionId, f64)> = match from {
        Some(from) => connection
            .prepare(
                "SELECT id, amount FROM \"transaction\"
                WHERE account_id = ?1 AND (date > ?2 OR (date = ?2 AND id >= ?3))
                ORDER BY date ASC, id ASC",
            )?
            .query_map(params![account_id, from.date, from.id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<_, _>>()?,
        None => connection
            .prepare(
                "SELECT id, amount FROM \"transaction\"
                WHERE account_id = ?1
                ORDER BY date ASC, id ASC",
            )?
            .query_map([account_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?,
    };

    let mut update = connection
        .prepare("UPDATE \"transaction\" SET account_balance_after = ?1 WHERE id = ?2")?;

    for (id, amount) in rows {
        running_balance = round_amount(running_balance + amount);
        update.execute(params![running_balance, id])?;
    }

    connection.execute(
        "UPDATE account SET current_balance = ?1 WHERE id = ?2",
        params![running_balance, account_id],
    )?;

    Ok(())
}

fn recalculate_total_balances(
    from: Option<SortKey>,
    connection: &Connection,
) -> Result<(), Error> {
    let base_currency = get_base_currency(connection)?;
    let rates = get_latest_rates(connection)?;

    let cached_base_currency: Option<CurrencyCode> = connection
        .query_row(
            "SELECT base_currency FROM balance_state WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let from = if cached_base_currency.as_ref() == Some(&base_currency) {
        from
    } else {
        tracing::debug!("Base currency is now {base_currency}, rebuilding total balances");
        None
    };

    let previous: Option<Option<f64>> = match from {
        Some(from) => connection
            .query_row(
                "SELECT total_balance_after FROM \"transaction\"
                WHERE date < ?1 OR (date = ?1 AND id < ?2)
                ORDER BY date DESC, id DESC LIMIT 1",
                params![from.date, from.id],
                |row| row.get(0),
            )
            .optional()?,
        None => None,
    };

    let (mut running_total, from) = resolve_seed(from, previous, 0.0);

    let rows: Vec<(TransactionId, f64, CurrencyCode)> = match from {
        Some(from) => connection
            .prepare(
                "SELECT id, amount, currency FROM \"transaction\"
                WHERE date > ?1 OR (date = ?1 AND id >= ?2)
                ORDER BY date ASC, id ASC",
            )?
            .query_map(params![from.date, from.id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<_, _>>()?,
        None => connection
            .prepare(
                "SELECT id, amount, currency FROM \"transaction\"
                ORDER BY date ASC, id ASC",
            )?
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<_, _>>()?,
    };

    let mut update =
        connection.prepare("UPDATE \"transaction\" SET total_balance_after = ?1 WHERE id = ?2")?;

    for (id, amount, currency) in rows {
        let converted = to_base_currency(amount, &currency, &base_currency, &rates);
        running_total = round_amount(running_total + converted);
        update.execute(params![running_total, id])?;
    }

    connection.execute(
        "INSERT INTO balance_state (id, base_currency) VALUES (1, ?1)
        ON CONFLICT(id) DO UPDATE SET base_currency = excluded.base_currency",
        [&base_currency],
    )?;

    Ok(())
}

/// Convert `amount` into the base currency with the latest rates, rounded to
/// cents. Currencies without a rate are treated as having a rate of 1.
pub(crate) fn to_base_currency(
    amount: f64,
    currency: &CurrencyCode,
    base_currency: &CurrencyCode,
    rates: &HashMap<CurrencyCode, f64>,
) -> f64 {
    let rate_from = rates.get(currency).copied().unwrap_or(1.0);
    let rate_to = rates.get(base_currency).copied().unwrap_or(1.0);

    round_amount(convert_amount(
        amount,
        currency,
        base_currency,
        rate_from,
        rate_to,
    ))
}
