use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error,
    alert::Alert,
    endpoints,
    transaction::{TransactionId, TransactionState, delete_transaction},
};

/// Delete a transaction.
///
/// Deleting one side of a transfer removes both sides, so the page is reloaded
/// instead of only removing the clicked row.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transaction(transaction_id, &connection) {
        Ok(None) => Alert::SuccessSimple {
            message: "Transaction deleted successfully".to_owned(),
        }
        .into_response(),
        Ok(Some(transfer_id)) => {
            tracing::info!("Deleted transfer {transfer_id} via transaction {transaction_id}");
            (
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
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
        account::{NewAccount, create_account},
        db::initialize,
        money::CurrencyCode,
        name::Name,
        transaction::{
            NewTransaction, TransactionState, count_transactions, create_transaction,
            delete_transaction_endpoint,
        },
    };

    #[tokio::test]
    async fn delete_then_not_found() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let account = create_account(
            &NewAccount {
                name: Name::new_unchecked("Current"),
                kind: None,
                currency: CurrencyCode::reference(),
                initial_balance: 0.0,
                is_active: true,
            },
            &connection,
        )
        .unwrap();
        let transaction = create_transaction(
            NewTransaction::new(account.id, datetime!(2025-02-03 08:30), -2.5),
            &connection,
        )
        .unwrap();
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = delete_transaction_endpoint(Path(transaction.id), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            count_transactions(&state.db_connection.lock().unwrap()),
            Ok(0)
        );

        let response = delete_transaction_endpoint(Path(transaction.id), State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
