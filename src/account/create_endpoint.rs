//! Defines the endpoint for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{create_account, form::AccountForm},
    endpoints,
};

/// The state needed to create or update an account.
#[derive(Debug, Clone)]
pub struct AccountEndpointState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new account, redirects to accounts view on success.
pub async fn create_account_endpoint(
    State(state): State<AccountEndpointState>,
    Form(form): Form<AccountForm>,
) -> Response {
    let new_account = match form.validate() {
        Ok(new_account) => new_account,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_account(&new_account, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not create account with {new_account:?}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;

    use crate::{
        account::{
            create_account_endpoint, create_endpoint::AccountEndpointState, form::AccountForm,
            get_all_accounts,
        },
        db::initialize,
        endpoints,
        test_utils::assert_hx_redirect,
    };

    fn get_state() -> AccountEndpointState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        AccountEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn form(name: &str) -> AccountForm {
        AccountForm {
            name: name.to_owned(),
            kind: Some("bank".to_owned()),
            currency: Some("usd".to_owned()),
            initial_balance: Some(123.45),
            is_active: Some("on".to_owned()),
        }
    }

    #[tokio::test]
    async fn can_create_account() {
        let state = get_state();

        let response = create_account_endpoint(State(state.clone()), Form(form("Checking"))).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ACCOUNTS_VIEW);
        let accounts = get_all_accounts(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name.as_ref(), "Checking");
        assert_eq!(accounts[0].currency.as_ref(), "USD");
        assert_eq!(accounts[0].current_balance, 123.45);
    }

    #[tokio::test]
    async fn duplicate_name_returns_bad_request() {
        let state = get_state();
        create_account_endpoint(State(state.clone()), Form(form("Checking"))).await;

        let response = create_account_endpoint(State(state), Form(form("Checking"))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_currency_returns_bad_request() {
        let mut form = form("Checking");
        form.currency = Some("dollars".to_owned());

        let response = create_account_endpoint(State(get_state()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
