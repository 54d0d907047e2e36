use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::Alert,
    payee::{PayeeId, PayeeState, delete_payee},
};

/// Delete a payee. Transactions keep everything but the payee reference.
pub async fn delete_payee_endpoint(
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

    match delete_payee(payee_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Payee deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete payee {payee_id}: {error}");
            error.into_alert_response()
        }
    }
}
