//! Defines the endpoint for deleting an account.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    account::{AccountId, create_endpoint::AccountEndpointState, delete_account},
    alert::Alert,
};

/// A route handler for deleting an account, responds with an alert.
pub async fn delete_account_endpoint(
    State(state): State<AccountEndpointState>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_account(account_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Account deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error @ (Error::DeleteMissing(_) | Error::AccountHasTransactions(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("Could not delete account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        account::{
            NewAccount, create_account, create_endpoint::AccountEndpointState,
            delete_account_endpoint,
        },
        db::initialize,
        money::CurrencyCode,
        name::Name,
        transaction::{NewTransaction, create_transaction},
    };

    fn get_state_with_account() -> (AccountEndpointState, i64) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let account = create_account(
            &NewAccount {
                name: Name::new_unchecked("Current"),
                kind: None,
                currency: CurrencyCode::new("GBP").unwrap(),
                initial_balance: 0.0,
                is_active: true,
            },
            &connection,
        )
        .unwrap();

        (
            AccountEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            account.id,
        )
    }

    #[tokio::test]
    async fn delete_account_succeeds() {
        let (state, account_id) = get_state_with_account();

        let response = delete_account_endpoint(State(state), Path(account_id)).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_missing_account_returns_not_found() {
        let (state, account_id) = get_state_with_account();

        let response = delete_account_endpoint(State(state), Path(account_id + 1)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_account_with_transactions_returns_bad_request() {
        let (state, account_id) = get_state_with_account();
        create_transaction(
            NewTransaction::new(account_id, datetime!(2025-02-01 09:00), 5.0),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = delete_account_endpoint(State(state), Path(account_id)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
