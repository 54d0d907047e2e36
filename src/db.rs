//! Creates the application's SQLite schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    account::create_account_table, balance::create_balance_state_table,
    budget::create_budget_table, category::create_category_table,
    exchange_rate::create_exchange_rate_table, location::create_location_table,
    payee::create_payee_table, project::create_project_table,
    transaction::create_transaction_table, transfer::create_transfer_table,
};

/// Enable foreign keys and create every table and index that does not exist yet.
///
/// Tables are created in dependency order inside a single transaction, so a
/// failure leaves the database untouched.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    // Cannot be changed inside a transaction.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_location_table(&transaction)?;
    create_project_table(&transaction)?;
    create_payee_table(&transaction)?;
    create_transfer_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_exchange_rate_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_balance_state_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        assert_eq!(Ok(()), initialize(&connection));
        assert_eq!(Ok(()), initialize(&connection));
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let enabled: i64 = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert_eq!(enabled, 1);
    }

    #[test]
    fn creates_all_tables() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let mut tables: Vec<String> = connection
            .prepare(
                "SELECT name FROM sqlite_master
                WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        tables.sort();

        assert_eq!(
            tables,
            [
                "account",
                "balance_state",
                "budget",
                "category",
                "exchange_rate",
                "location",
                "payee",
                "project",
                "transaction",
                "transfer"
            ]
        );
    }
}
