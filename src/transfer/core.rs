use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use time::PrimitiveDateTime;

use crate::{
    Error,
    account::AccountId,
    balance::{SortKey, recalculate_balances},
    datetime::iso_date_time,
    location::get_or_create_location,
    money::{CurrencyCode, round_amount},
    name::Name,
    transaction::{NewTransaction, TransactionId, insert_transfer_leg},
};

pub type TransferId = i64;

/// The location given to the leg that takes money out of the source account.
pub const TRANSFER_OUT_LOCATION: &str = "Transfer Out";
/// The location given to the leg that puts money into the destination account.
pub const TRANSFER_IN_LOCATION: &str = "Transfer In";

/// The data needed to move money between two accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransfer {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub date: PrimitiveDateTime,
    /// The amount leaving the source account, in its currency.
    pub from_amount: f64,
    /// The amount arriving in the destination account, in its currency.
    /// Defaults to `from_amount`.
    pub to_amount: Option<f64>,
    pub note: String,
}

/// Both legs of a transfer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    pub id: TransferId,
    #[serde(with = "iso_date_time")]
    pub date: PrimitiveDateTime,
    pub note: String,
    pub from_transaction_id: TransactionId,
    pub from_account_id: AccountId,
    pub from_account_name: String,
    /// The out leg's amount negated, so positive unless the leg was edited.
    pub from_amount: f64,
    pub from_currency: CurrencyCode,
    pub to_transaction_id: TransactionId,
    pub to_account_id: AccountId,
    pub to_account_name: String,
    pub to_amount: f64,
    pub to_currency: CurrencyCode,
}

pub fn create_transfer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transfer (
            id INTEGER PRIMARY KEY,
            date TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        (),
    )?;

    Ok(())
}

/// Move money from one account to another.
///
/// Creates a transfer and its two transactions, then recomputes the balances
/// of both accounts once.
///
/// # Errors
/// Returns [Error::SameTransferAccounts] if both accounts are the same,
/// [Error::NonPositiveAmount] if an amount is not positive, or
/// [Error::InvalidForeignKey] if an account does not exist.
pub fn create_transfer(transfer: &NewTransfer, connection: &Connection) -> Result<Transfer, Error> {
    if transfer.from_account_id == transfer.to_account_id {
        return Err(Error::SameTransferAccounts);
    }

    let from_amount = round_amount(transfer.from_amount);
    let to_amount = round_amount(transfer.to_amount.unwrap_or(transfer.from_amount));
    if [from_amount, to_amount]
        .iter()
        .any(|amount| !amount.is_finite() || *amount <= 0.0)
    {
        return Err(Error::NonPositiveAmount);
    }

    let sql_transaction = connection.unchecked_transaction()?;

    let from_currency = account_currency(transfer.from_account_id, &sql_transaction)?;
    let to_currency = account_currency(transfer.to_account_id, &sql_transaction)?;
    let out_location =
        get_or_create_location(&Name::new_unchecked(TRANSFER_OUT_LOCATION), &sql_transaction)?;
    let in_location =
        get_or_create_location(&Name::new_unchecked(TRANSFER_IN_LOCATION), &sql_transaction)?;
    let note = transfer.note.trim();

    sql_transaction.execute(
        "INSERT INTO transfer (date, note) VALUES (?1, ?2)",
        params![transfer.date, note],
    )?;
    let transfer_id = sql_transaction.last_insert_rowid();

    let out_id = insert_transfer_leg(
        &NewTransaction {
            currency: Some(from_currency),
            note: note.to_owned(),
            location_id: Some(out_location),
            ..NewTransaction::new(
                transfer.from_account_id,
                transfer.date,
                -from_amount,
            )
        },
        transfer_id,
        &sql_transaction,
    )?;

    insert_transfer_leg(
        &NewTransaction {
            currency: Some(to_currency),
            note: note.to_owned(),
            location_id: Some(in_location),
            ..NewTransaction::new(transfer.to_account_id, transfer.date, to_amount)
        },
        transfer_id,
        &sql_transaction,
    )?;

    recalculate_balances(
        Some(SortKey {
            date: transfer.date,
            id: out_id,
        }),
        &[transfer.from_account_id, transfer.to_account_id],
        &sql_transaction,
    )?;

    let created = get_transfer(transfer_id, &sql_transaction)?;
    sql_transaction.commit()?;

    tracing::debug!(
        "Created transfer {transfer_id} from account {} to account {}",
        transfer.from_account_id,
        transfer.to_account_id
    );

    Ok(created)
}

// The out leg is always inserted first, so the legs are told apart by id.
// Either leg may be edited afterwards, sign and location included.
const SELECT_TRANSFER: &str = "SELECT transfer.id, transfer.date, transfer.note,
        out_leg.id, out_leg.account_id, out_account.name, out_leg.amount, out_leg.currency,
        in_leg.id, in_leg.account_id, in_account.name, in_leg.amount, in_leg.currency
    FROM transfer
    INNER JOIN \"transaction\" out_leg ON out_leg.id =
        (SELECT MIN(id) FROM \"transaction\" WHERE transfer_id = transfer.id)
    INNER JOIN \"transaction\" in_leg ON in_leg.id =
        (SELECT MAX(id) FROM \"transaction\" WHERE transfer_id = transfer.id)
        AND in_leg.id <> out_leg.id
    INNER JOIN account out_account ON out_account.id = out_leg.account_id
    INNER JOIN account in_account ON in_account.id = in_leg.account_id";

fn map_row(row: &rusqlite::Row) -> Result<Transfer, rusqlite::Error> {
    Ok(Transfer {
        id: row.get(0)?,
        date: row.get(1)?,
        note: row.get(2)?,
        from_transaction_id: row.get(3)?,
        from_account_id: row.get(4)?,
        from_account_name: row.get(5)?,
        from_amount: -row.get::<_, f64>(6)?,
        from_currency: row.get(7)?,
        to_transaction_id: row.get(8)?,
        to_account_id: row.get(9)?,
        to_account_name: row.get(10)?,
        to_amount: row.get(11)?,
        to_currency: row.get(12)?,
    })
}

pub fn get_transfer(id: TransferId, connection: &Connection) -> Result<Transfer, Error> {
    connection
        .query_row(&format!("{SELECT_TRANSFER} WHERE transfer.id = ?1"), [id], map_row)
        .map_err(Error::from)
}

/// Get every transfer, newest first.
pub fn get_all_transfers(connection: &Connection) -> Result<Vec<Transfer>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSFER} ORDER BY transfer.date DESC, transfer.id DESC"
        ))?
        .query_map([], map_row)?
        .map(|maybe_transfer| maybe_transfer.map_err(Error::from))
        .collect()
}

/// Delete a transfer and both of its transactions.
///
/// # Errors
/// Returns [Error::DeleteMissing] if the transfer does not exist.
pub fn delete_transfer(id: TransferId, connection: &Connection) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let legs: Vec<(TransactionId, PrimitiveDateTime, AccountId)> = sql_transaction
        .prepare("SELECT id, date, account_id FROM \"transaction\" WHERE transfer_id = ?1")?
        .query_map([id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<_, _>>()?;

    let rows_affected = sql_transaction.execute("DELETE FROM transfer WHERE id = ?1", [id])?;
    if rows_affected == 0 {
        return Err(Error::DeleteMissing("transfer"));
    }

    let from = legs
        .iter()
        .map(|(id, date, _)| SortKey {
            date: *date,
            id: *id,
        })
        .min();
    let account_ids: Vec<AccountId> = legs.iter().map(|leg| leg.2).collect();
    recalculate_balances(from, &account_ids, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}

fn account_currency(id: AccountId, connection: &Connection) -> Result<CurrencyCode, Error> {
    connection
        .query_row("SELECT currency FROM account WHERE id = ?1", [id], |row| {
            row.get(0)
        })
        .optional()?
        .ok_or(Error::InvalidForeignKey)
}
