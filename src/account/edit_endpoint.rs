//! Defines the endpoint for updating an account.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;

use crate::{
    Error,
    account::{AccountId, create_endpoint::AccountEndpointState, form::AccountForm, update_account},
    endpoints,
};

/// A route handler for updating an account, redirects to accounts view on success.
pub async fn edit_account_endpoint(
    State(state): State<AccountEndpointState>,
    Path(account_id): Path<AccountId>,
    Form(form): Form<AccountForm>,
) -> Response {
    let account = match form.validate() {
        Ok(account) => account,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_account(account_id, &account, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update account {account_id}: {error}");
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
    use axum_extra::extract::Form;
    use rusqlite::Connection;

    use crate::{
        account::{
            NewAccount, create_account, create_endpoint::AccountEndpointState,
            edit_account_endpoint, form::AccountForm, get_account,
        },
        db::initialize,
        endpoints,
        money::CurrencyCode,
        name::Name,
        test_utils::assert_hx_redirect,
    };

    fn get_state() -> AccountEndpointState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        AccountEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn can_update_account() {
        let state = get_state();
        let account = create_account(
            &NewAccount {
                name: Name::new_unchecked("Old"),
                kind: None,
                currency: CurrencyCode::new("GBP").unwrap(),
                initial_balance: 0.0,
                is_active: true,
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        let form = AccountForm {
            name: "New".to_owned(),
            kind: None,
            currency: Some("GBP".to_owned()),
            initial_balance: Some(10.0),
            is_active: None,
        };

        let response =
            edit_account_endpoint(State(state.clone()), Path(account.id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ACCOUNTS_VIEW);
        let got = get_account(account.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(got.name.as_ref(), "New");
        assert_eq!(got.current_balance, 10.0);
        assert!(!got.is_active);
    }

    #[tokio::test]
    async fn missing_account_returns_not_found() {
        let form = AccountForm {
            name: "New".to_owned(),
            kind: None,
            currency: None,
            initial_balance: None,
            is_active: None,
        };

        let response = edit_account_endpoint(State(get_state()), Path(7), Form(form)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
