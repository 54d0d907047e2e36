//! Headline figures and per-account balances.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    account::{AccountId, get_all_accounts},
    balance::{get_total_balance, to_base_currency},
    exchange_rate::{get_base_currency, get_latest_rates},
    money::{CurrencyCode, round_amount},
    name::Name,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_transactions: u32,
    pub total_accounts: u32,
    pub total_categories: u32,
    pub base_currency: CurrencyCode,
    /// The total balance after the latest transaction, zero without transactions.
    pub total_balance: f64,
}

/// An account's current balance alongside its value in the base currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub name: Name,
    pub currency: CurrencyCode,
    pub balance: f64,
    pub base_balance: f64,
}

fn count(table: &str, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
            row.get(0)
        })
        .map_err(Error::from)
}

pub fn get_dashboard_summary(connection: &Connection) -> Result<DashboardSummary, Error> {
    Ok(DashboardSummary {
        total_transactions: count("transaction", connection)?,
        total_accounts: count("account", connection)?,
        total_categories: count("category", connection)?,
        base_currency: get_base_currency(connection)?,
        total_balance: round_amount(get_total_balance(connection)?),
    })
}

/// The balances of active accounts, plus inactive accounts that still hold money.
pub fn get_account_balances(
    base_currency: &CurrencyCode,
    connection: &Connection,
) -> Result<Vec<AccountBalance>, Error> {
    let rates = get_latest_rates(connection)?;

    Ok(get_all_accounts(connection)?
        .into_iter()
        .filter(|account| account.is_active || account.current_balance != 0.0)
        .map(|account| AccountBalance {
            base_balance: to_base_currency(
                account.current_balance,
                &account.currency,
                base_currency,
                &rates,
            ),
            account_id: account.id,
            name: account.name,
            currency: account.currency,
            balance: account.current_balance,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        account::{NewAccount, create_account},
        dashboard::summary::{DashboardSummary, get_account_balances, get_dashboard_summary},
        db::initialize,
        exchange_rate::upsert_exchange_rate,
        money::CurrencyCode,
        name::Name,
        transaction::{NewTransaction, create_transaction},
    };

    fn get_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn empty_database_has_zero_summary() {
        let connection = get_connection();

        assert_eq!(
            get_dashboard_summary(&connection),
            Ok(DashboardSummary {
                total_transactions: 0,
                total_accounts: 0,
                total_categories: 0,
                base_currency: CurrencyCode::reference(),
                total_balance: 0.0,
            })
        );
    }

    #[test]
    fn summary_and_balances_convert_to_base_currency() {
        let connection = get_connection();
        let eur = CurrencyCode::new("EUR").unwrap();
        for (name, currency, is_active) in [
            ("Current", CurrencyCode::reference(), true),
            ("Euro", eur.clone(), true),
            ("Closed", CurrencyCode::reference(), false),
        ] {
            create_account(
                &NewAccount {
                    name: Name::new_unchecked(name),
                    kind: None,
                    currency,
                    initial_balance: 0.0,
                    is_active,
                },
                &connection,
            )
            .unwrap();
        }
        upsert_exchange_rate(&eur, 1.25, date!(2025 - 01 - 01), &connection).unwrap();
        create_transaction(
            NewTransaction::new(1, datetime!(2025-01-02 09:00), 100.0),
            &connection,
        )
        .unwrap();
        create_transaction(
            NewTransaction::new(2, datetime!(2025-01-03 09:00), 50.0),
            &connection,
        )
        .unwrap();
        create_transaction(
            NewTransaction::new(1, datetime!(2025-01-04 09:00), -10.0),
            &connection,
        )
        .unwrap();

        let summary = get_dashboard_summary(&connection).unwrap();
        assert_eq!(summary.total_transactions, 3);
        assert_eq!(summary.base_currency, CurrencyCode::reference());
        assert_eq!(summary.total_accounts, 3);
        assert_eq!(summary.total_balance, 130.0);

        let balances = get_account_balances(&summary.base_currency, &connection).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[1].name.as_ref(), "Euro");
        assert_eq!(balances[1].balance, 50.0);
        assert_eq!(balances[1].base_balance, 40.0);
    }
}
