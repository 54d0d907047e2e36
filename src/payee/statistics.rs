//! Endpoints exposing and refreshing payee statistics.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::Alert,
    payee::{PayeeId, PayeeState, get_payee_defaults, refresh_all_payee_statistics},
};

/// The most common category, location and project for a payee, used to
/// prefill the transaction form.
pub async fn get_payee_defaults_endpoint(
    Path(payee_id): Path<PayeeId>,
    State(state): State<PayeeState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_payee_defaults(payee_id, &connection) {
        Ok(defaults) => Json(defaults).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

pub async fn refresh_payee_statistics_endpoint(State(state): State<PayeeState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = connection
        .unchecked_transaction()
        .map_err(Error::from)
        .and_then(|transaction| {
            let count = refresh_all_payee_statistics(&transaction)?;
            transaction.commit()?;
            Ok(count)
        });

    match result {
        Ok(count) => {
            tracing::info!("Refreshed statistics for {count} payees");
            Alert::SuccessSimple {
                message: format!("Refreshed statistics for {count} payees"),
            }
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not refresh payee statistics: {error}");
            error.into_alert_response()
        }
    }
}
