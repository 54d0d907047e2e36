use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, alert::Alert, balance::recalculate_all_balances};

#[derive(Debug, Clone)]
pub struct RecalculateBalancesState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecalculateBalancesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Rebuild every cached balance from scratch.
pub async fn recalculate_balances_endpoint(
    State(state): State<RecalculateBalancesState>,
) -> Response {
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
            recalculate_all_balances(&transaction)?;
            transaction.commit().map_err(Error::from)
        });

    match result {
        Ok(()) => {
            tracing::info!("Recalculated all balances");
            Alert::SuccessSimple {
                message: "Balances recalculated".to_owned(),
            }
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not recalculate balances: {error}");
            error.into_alert_response()
        }
    }
}
