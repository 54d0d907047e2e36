use rusqlite::{Connection, OptionalExtension, Row, ToSql, params, params_from_iter};
use serde::Serialize;
use time::{Date, PrimitiveDateTime, Time};

use crate::{
    Error,
    account::AccountId,
    balance::{SortKey, recalculate_balances},
    category::CategoryId,
    datetime::iso_date_time,
    location::LocationId,
    money::{CurrencyCode, round_amount},
    payee::{PayeeId, refresh_payee_statistics},
    project::ProjectId,
};

pub type TransactionId = i64;

/// A single movement of money in or out of an account.
///
/// Negative amounts are expenses, positive amounts are income.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(with = "iso_date_time")]
    pub date: PrimitiveDateTime,
    pub amount: f64,
    pub currency: CurrencyCode,
    pub note: String,
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
    pub payee_id: Option<PayeeId>,
    pub location_id: Option<LocationId>,
    pub project_id: Option<ProjectId>,
    /// Set on both legs of a transfer between accounts.
    pub transfer_id: Option<i64>,
    /// A hash of the CSV row this transaction was imported from.
    pub import_id: Option<i64>,
    /// The balance of the account after this transaction.
    pub account_balance_after: Option<f64>,
    /// The balance of all accounts after this transaction, in the base currency.
    pub total_balance_after: Option<f64>,
}

/// The data needed to create or update a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub date: PrimitiveDateTime,
    pub amount: f64,
    /// Defaults to the account's currency.
    pub currency: Option<CurrencyCode>,
    pub note: String,
    pub category_id: Option<CategoryId>,
    pub payee_id: Option<PayeeId>,
    pub location_id: Option<LocationId>,
    pub project_id: Option<ProjectId>,
}

impl NewTransaction {
    /// A transaction with no note and no optional references.
    pub fn new(account_id: AccountId, date: PrimitiveDateTime, amount: f64) -> Self {
        Self {
            account_id,
            date,
            amount,
            currency: None,
            note: String::new(),
            category_id: None,
            payee_id: None,
            location_id: None,
            project_id: None,
        }
    }
}

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            amount REAL NOT NULL,
            currency TEXT NOT NULL DEFAULT 'GBP',
            note TEXT NOT NULL DEFAULT '',
            account_id INTEGER NOT NULL REFERENCES account(id),
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            payee_id INTEGER REFERENCES payee(id) ON DELETE SET NULL,
            location_id INTEGER REFERENCES location(id) ON DELETE SET NULL,
            project_id INTEGER REFERENCES project(id) ON DELETE SET NULL,
            transfer_id INTEGER REFERENCES transfer(id) ON DELETE CASCADE,
            import_id INTEGER UNIQUE,
            account_balance_after REAL,
            total_balance_after REAL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_transaction_account_date
            ON \"transaction\"(account_id, date, id)",
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date, id)",
        "CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id)",
        "CREATE INDEX IF NOT EXISTS idx_transaction_payee ON \"transaction\"(payee_id)",
        "CREATE INDEX IF NOT EXISTS idx_transaction_currency ON \"transaction\"(currency)",
    ] {
        connection.execute(statement, ())?;
    }

    Ok(())
}

const SELECT_TRANSACTION: &str = "SELECT id, date, amount, currency, note, account_id,
    category_id, payee_id, location_id, project_id, transfer_id, import_id,
    account_balance_after, total_balance_after FROM \"transaction\"";

pub fn map_row_to_transaction(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        note: row.get(4)?,
        account_id: row.get(5)?,
        category_id: row.get(6)?,
        payee_id: row.get(7)?,
        location_id: row.get(8)?,
        project_id: row.get(9)?,
        transfer_id: row.get(10)?,
        import_id: row.get(11)?,
        account_balance_after: row.get(12)?,
        total_balance_after: row.get(13)?,
    })
}

/// Insert a transaction row without touching the cached balances.
///
/// Used by bulk operations such as imports that recompute balances once at
/// the end. Most callers want [create_transaction] instead.
///
/// # Errors
/// Returns [Error::InvalidForeignKey] if the account or a reference does not
/// exist, or [Error::DuplicateImportId] if `import_id` was already imported.
pub fn insert_transaction(
    transaction: &NewTransaction,
    import_id: Option<i64>,
    connection: &Connection,
) -> Result<TransactionId, Error> {
    insert_transaction_row(transaction, import_id, None, connection)
}

/// Insert one leg of a transfer, see [insert_transaction].
pub(crate) fn insert_transfer_leg(
    transaction: &NewTransaction,
    transfer_id: i64,
    connection: &Connection,
) -> Result<TransactionId, Error> {
    insert_transaction_row(transaction, None, Some(transfer_id), connection)
}

fn insert_transaction_row(
    transaction: &NewTransaction,
    import_id: Option<i64>,
    transfer_id: Option<i64>,
    connection: &Connection,
) -> Result<TransactionId, Error> {
    let currency = resolve_currency(transaction, connection)?;

    connection.execute(
        "INSERT INTO \"transaction\" (date, amount, currency, note, account_id,
            category_id, payee_id, location_id, project_id, transfer_id, import_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            transaction.date,
            round_amount(transaction.amount),
            currency,
            transaction.note.trim(),
            transaction.account_id,
            transaction.category_id,
            transaction.payee_id,
            transaction.location_id,
            transaction.project_id,
            transfer_id,
            import_id,
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

/// Create a transaction and update the cached balances and payee statistics
/// it affects, all in one SQL transaction.
///
/// # Errors
/// See [insert_transaction].
pub fn create_transaction(
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let id = insert_transaction(&transaction, None, &sql_transaction)?;

    recalculate_balances(
        Some(SortKey {
            date: transaction.date,
            id,
        }),
        &[transaction.account_id],
        &sql_transaction,
    )?;

    if let Some(payee_id) = transaction.payee_id {
        refresh_payee_statistics(payee_id, &sql_transaction)?;
    }

    let created = get_transaction(id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(created)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid transaction.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    connection
        .prepare(&format!("{SELECT_TRANSACTION} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_row_to_transaction)
        .map_err(|error| error.into())
}

/// Replace the details of a transaction.
///
/// Balances are recomputed from whichever of the old and new positions comes
/// first, for both the old and the new account.
///
/// # Errors
/// Returns [Error::UpdateMissing] if the transaction does not exist, plus the
/// errors documented on [insert_transaction].
pub fn update_transaction(
    id: TransactionId,
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let previous: Option<(PrimitiveDateTime, AccountId, Option<PayeeId>)> = sql_transaction
        .query_row(
            "SELECT date, account_id, payee_id FROM \"transaction\" WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let Some((previous_date, previous_account_id, previous_payee_id)) = previous else {
        return Err(Error::UpdateMissing("transaction"));
    };

    let currency = resolve_currency(&transaction, &sql_transaction)?;

    sql_transaction
        .execute(
            "UPDATE \"transaction\"
            SET date = ?1, amount = ?2, currency = ?3, note = ?4, account_id = ?5,
                category_id = ?6, payee_id = ?7, location_id = ?8, project_id = ?9,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?10",
            params![
                transaction.date,
                round_amount(transaction.amount),
                currency,
                transaction.note.trim(),
                transaction.account_id,
                transaction.category_id,
                transaction.payee_id,
                transaction.location_id,
                transaction.project_id,
                id,
            ],
        )?;

    let from = SortKey {
        date: previous_date.min(transaction.date),
        id,
    };
    recalculate_balances(
        Some(from),
        &[previous_account_id, transaction.account_id],
        &sql_transaction,
    )?;

    let mut payee_ids: Vec<PayeeId> = [previous_payee_id, transaction.payee_id]
        .into_iter()
        .flatten()
        .collect();
    payee_ids.dedup();
    for payee_id in payee_ids {
        refresh_payee_statistics(payee_id, &sql_transaction)?;
    }

    sql_transaction.commit()?;

    Ok(())
}

/// Delete a transaction. Deleting either leg of a transfer deletes the whole
/// transfer.
///
/// Returns the transfer ID if a transfer was deleted.
///
/// # Errors
/// Returns [Error::DeleteMissing] if the transaction does not exist.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<Option<i64>, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let transfer_id: Option<Option<i64>> = sql_transaction
        .query_row(
            "SELECT transfer_id FROM \"transaction\" WHERE id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(transfer_id) = transfer_id else {
        return Err(Error::DeleteMissing("transaction"));
    };

    let deleted: Vec<(TransactionId, PrimitiveDateTime, AccountId, Option<PayeeId>)> =
        sql_transaction
            .prepare(
                "SELECT id, date, account_id, payee_id FROM \"transaction\"
                WHERE id = ?1 OR (?2 IS NOT NULL AND transfer_id = ?2)",
            )?
            .query_map(params![id, transfer_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<Result<_, _>>()?;

    match transfer_id {
        // The legs go with the transfer row.
        Some(transfer_id) => {
            sql_transaction.execute("DELETE FROM transfer WHERE id = ?1", [transfer_id])?
        }
        None => sql_transaction.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?,
    };

    let from = deleted
        .iter()
        .map(|(id, date, _, _)| SortKey {
            date: *date,
            id: *id,
        })
        .min();
    let account_ids: Vec<AccountId> = deleted.iter().map(|row| row.2).collect();
    recalculate_balances(from, &account_ids, &sql_transaction)?;

    let mut payee_ids: Vec<PayeeId> = deleted.iter().filter_map(|row| row.3).collect();
    payee_ids.sort_unstable();
    payee_ids.dedup();
    for payee_id in payee_ids {
        refresh_payee_statistics(payee_id, &sql_transaction)?;
    }

    sql_transaction.commit()?;

    Ok(transfer_id)
}

/// Get the total number of transactions in the database.
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\"", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Narrows down a transaction listing. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub account_id: Option<AccountId>,
    /// Matches the category and its child categories.
    pub category_id: Option<CategoryId>,
    pub payee_id: Option<PayeeId>,
    pub start_date: Option<Date>,
    /// Inclusive.
    pub end_date: Option<Date>,
}

impl TransactionFilter {
    fn where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(account_id) = self.account_id {
            conditions.push("t.account_id = ?");
            params.push(Box::new(account_id));
        }

        if let Some(category_id) = self.category_id {
            conditions.push(
                "(t.category_id = ? OR t.category_id IN
                    (SELECT id FROM category WHERE parent_id = ?))",
            );
            params.push(Box::new(category_id));
            params.push(Box::new(category_id));
        }

        if let Some(payee_id) = self.payee_id {
            conditions.push("t.payee_id = ?");
            params.push(Box::new(payee_id));
        }

        if let Some(start_date) = self.start_date {
            conditions.push("t.date >= ?");
            params.push(Box::new(PrimitiveDateTime::new(start_date, Time::MIDNIGHT)));
        }

        if let Some(end_date) = self.end_date {
            match end_date.next_day() {
                Some(next_day) => {
                    conditions.push("t.date < ?");
                    params.push(Box::new(PrimitiveDateTime::new(next_day, Time::MIDNIGHT)));
                }
                None => tracing::debug!("end date {end_date} is the last representable date"),
            }
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

/// A transaction together with the names of everything it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionListing {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub account_name: String,
    pub category_name: Option<String>,
    pub parent_category_name: Option<String>,
    pub payee_name: Option<String>,
    pub location_name: Option<String>,
    pub project_name: Option<String>,
}

const SELECT_LISTING: &str = "SELECT t.id, t.date, t.amount, t.currency, t.note, t.account_id,
        t.category_id, t.payee_id, t.location_id, t.project_id, t.transfer_id, t.import_id,
        t.account_balance_after, t.total_balance_after,
        account.name, category.name, parent.name, payee.name, location.name, project.name
    FROM \"transaction\" t
    INNER JOIN account ON account.id = t.account_id
    LEFT JOIN category ON category.id = t.category_id
    LEFT JOIN category parent ON parent.id = category.parent_id
    LEFT JOIN payee ON payee.id = t.payee_id
    LEFT JOIN location ON location.id = t.location_id
    LEFT JOIN project ON project.id = t.project_id";

fn map_row_to_listing(row: &Row) -> Result<TransactionListing, rusqlite::Error> {
    Ok(TransactionListing {
        transaction: map_row_to_transaction(row)?,
        account_name: row.get(14)?,
        category_name: row.get(15)?,
        parent_category_name: row.get(16)?,
        payee_name: row.get(17)?,
        location_name: row.get(18)?,
        project_name: row.get(19)?,
    })
}

/// Get a transaction with the names of its account and references.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a valid transaction.
pub fn get_transaction_listing(
    id: TransactionId,
    connection: &Connection,
) -> Result<TransactionListing, Error> {
    connection
        .prepare(&format!("{SELECT_LISTING} WHERE t.id = ?1"))?
        .query_row([id], map_row_to_listing)
        .map_err(|error| error.into())
}

/// Get one page of the transactions matching `filter`, newest first.
pub fn query_transactions(
    filter: &TransactionFilter,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<TransactionListing>, Error> {
    let (where_clause, mut params) = filter.where_clause();
    // SQLite treats a negative LIMIT as no limit.
    params.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));
    params.push(Box::new(i64::try_from(offset).unwrap_or(i64::MAX)));

    connection
        .prepare(&format!(
            "{SELECT_LISTING} {where_clause} ORDER BY t.date DESC, t.id DESC LIMIT ? OFFSET ?"
        ))?
        .query_map(params_from_iter(params.iter()), map_row_to_listing)?
        .map(|maybe_listing| maybe_listing.map_err(Error::SqlError))
        .collect()
}

/// Get every transaction with its names, oldest first.
pub fn get_all_transaction_listings(
    connection: &Connection,
) -> Result<Vec<TransactionListing>, Error> {
    connection
        .prepare(&format!("{SELECT_LISTING} ORDER BY t.date ASC, t.id ASC"))?
        .query_map([], map_row_to_listing)?
        .map(|maybe_listing| maybe_listing.map_err(Error::SqlError))
        .collect()
}

/// Count the transactions matching `filter`.
pub fn count_filtered_transactions(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u32, Error> {
    let (where_clause, params) = filter.where_clause();

    connection
        .query_row(
            &format!("SELECT COUNT(*) FROM \"transaction\" t {where_clause}"),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn resolve_currency(
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<CurrencyCode, Error> {
    if let Some(currency) = &transaction.currency {
        return Ok(currency.clone());
    }

    connection
        .query_row(
            "SELECT currency FROM account WHERE id = ?1",
            [transaction.account_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(Error::InvalidForeignKey)
}
