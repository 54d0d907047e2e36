use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

use crate::{
    Error,
    balance::recalculate_balances,
    error::is_unique_violation,
    money::{CurrencyCode, round_amount},
    name::Name,
};

pub type AccountId = i64;

/// A bank account, wallet, credit card, etc. that transactions are recorded against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The unique display name of the account.
    pub name: Name,
    /// Free text describing the account, e.g. "bank", "cash" or "credit card".
    pub kind: Option<String>,
    /// The currency transactions in this account default to.
    pub currency: CurrencyCode,
    /// The balance before the first transaction.
    pub initial_balance: f64,
    /// The balance after the latest transaction, maintained by the balance module.
    pub current_balance: f64,
    /// Inactive accounts are hidden from the transaction form.
    pub is_active: bool,
}

/// The data needed to create or update an account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: Name,
    pub kind: Option<String>,
    pub currency: CurrencyCode,
    pub initial_balance: f64,
    pub is_active: bool,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            kind TEXT,
            currency TEXT NOT NULL DEFAULT 'GBP',
            initial_balance REAL NOT NULL DEFAULT 0,
            current_balance REAL NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        (),
    )?;

    Ok(())
}

const SELECT_ACCOUNT: &str =
    "SELECT id, name, kind, currency, initial_balance, current_balance, is_active FROM account";

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        currency: row.get(3)?,
        initial_balance: row.get(4)?,
        current_balance: row.get(5)?,
        is_active: row.get(6)?,
    })
}

/// Create an account. Its current balance starts at its initial balance.
///
/// # Errors
/// Returns [Error::DuplicateName] if an account with the same name exists.
pub fn create_account(account: &NewAccount, connection: &Connection) -> Result<Account, Error> {
    let initial_balance = round_amount(account.initial_balance);

    connection
        .execute(
            "INSERT INTO account (name, kind, currency, initial_balance, current_balance, is_active)
            VALUES (?1, ?2, ?3, ?4, ?4, ?5)",
            params![
                account.name,
                account.kind,
                account.currency,
                initial_balance,
                account.is_active
            ],
        )
        .map_err(|error| map_duplicate_name(error, &account.name))?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        name: account.name.clone(),
        kind: account.kind.clone(),
        currency: account.currency.clone(),
        initial_balance,
        current_balance: initial_balance,
        is_active: account.is_active,
    })
}

pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare(&format!("{SELECT_ACCOUNT} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_row_to_account)
        .map_err(|error| error.into())
}

/// Get all accounts ordered alphabetically by name.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!("{SELECT_ACCOUNT} ORDER BY name ASC"))?
        .query_map([], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Update an account's details.
///
/// Changing the initial balance shifts every running balance of the account,
/// so they are recalculated in the same SQL transaction.
///
/// # Errors
/// Returns [Error::UpdateMissing] if the account does not exist, or
/// [Error::DuplicateName] if the new name is taken.
pub fn update_account(
    id: AccountId,
    account: &NewAccount,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    let previous_initial_balance: Option<f64> = transaction
        .query_row(
            "SELECT initial_balance FROM account WHERE id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(previous_initial_balance) = previous_initial_balance else {
        return Err(Error::UpdateMissing("account"));
    };

    let initial_balance = round_amount(account.initial_balance);

    transaction
        .execute(
            "UPDATE account
            SET name = ?1, kind = ?2, currency = ?3, initial_balance = ?4, is_active = ?5
            WHERE id = ?6",
            params![
                account.name,
                account.kind,
                account.currency,
                initial_balance,
                account.is_active,
                id
            ],
        )
        .map_err(|error| map_duplicate_name(error, &account.name))?;

    if previous_initial_balance != initial_balance {
        recalculate_balances(None, &[id], &transaction)?;
    }

    transaction.commit()?;

    Ok(())
}

/// Delete an account that has no transactions.
///
/// # Errors
/// Returns [Error::AccountHasTransactions] if transactions still refer to the
/// account, or [Error::DeleteMissing] if it does not exist.
pub fn delete_account(id: AccountId, connection: &Connection) -> Result<(), Error> {
    let transaction_count = count_account_transactions(id, connection)?;

    if transaction_count > 0 {
        return Err(Error::AccountHasTransactions(transaction_count));
    }

    let rows_affected = connection.execute("DELETE FROM account WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissing("account"));
    }

    Ok(())
}

pub fn count_account_transactions(id: AccountId, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(*) FROM \"transaction\" WHERE account_id = ?1",
            [id],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Find an account by name, creating it with `currency` if it does not exist.
///
/// Used when importing transactions that refer to accounts by name.
pub fn get_or_create_account(
    name: &Name,
    currency: &CurrencyCode,
    connection: &Connection,
) -> Result<AccountId, Error> {
    let existing: Option<AccountId> = connection
        .query_row("SELECT id FROM account WHERE name = ?1", [name], |row| {
            row.get(0)
        })
        .optional()?;

    match existing {
        Some(id) => Ok(id),
        None => {
            let account = create_account(
                &NewAccount {
                    name: name.clone(),
                    kind: None,
                    currency: currency.clone(),
                    initial_balance: 0.0,
                    is_active: true,
                },
                connection,
            )?;

            tracing::info!("Created account \"{name}\" ({currency})");

            Ok(account.id)
        }
    }
}

fn map_duplicate_name(error: rusqlite::Error, name: &Name) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateName("account", name.to_string())
    } else {
        error.into()
    }
}
