//! Defines the route handler for the page for editing an account.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{
        Account, AccountId,
        form::{AccountFormAction, account_form_view},
        get_account,
    },
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for the edit account page.
#[derive(Debug, Clone)]
pub struct EditAccountPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing an account.
pub async fn get_edit_account_page(
    State(state): State<EditAccountPageState>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_account(account_id, &connection).inspect_err(|error| {
        if *error != Error::NotFound {
            tracing::error!("could not get account {account_id}: {error}");
        }
    })?;

    Ok(edit_account_view(&account).into_response())
}

fn edit_account_view(account: &Account) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();
    let update_endpoint = format_endpoint(endpoints::ACCOUNT, account.id);
    let form = account_form_view(
        AccountFormAction::Update {
            endpoint: &update_endpoint,
        },
        Some(account),
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { "Edit Account" }
            (form)
        }
    };

    base("Edit Account", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{NewAccount, create_account, edit_page::EditAccountPageState, get_edit_account_page},
        db::initialize,
        endpoints::{self, format_endpoint},
        money::CurrencyCode,
        name::Name,
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_valid_html, must_get_form,
            parse_html_document,
        },
    };

    fn get_state() -> EditAccountPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        EditAccountPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn render_page_with_account_values() {
        let state = get_state();
        let account = create_account(
            &NewAccount {
                name: Name::new_unchecked("Travel Card"),
                kind: Some("credit card".to_owned()),
                currency: CurrencyCode::new("EUR").unwrap(),
                initial_balance: -12.5,
                is_active: true,
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = get_edit_account_page(State(state), Path(account.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::ACCOUNT, account.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "name", "text", "Travel Card");
        assert_form_input_with_value(&form, "currency", "text", "EUR");
        assert_form_input_with_value(&form, "initial_balance", "number", "-12.50");
    }

    #[tokio::test]
    async fn missing_account_returns_not_found() {
        let result = get_edit_account_page(State(get_state()), Path(42)).await;

        assert_eq!(result.as_ref().err(), Some(&Error::NotFound));
        assert_eq!(
            result.unwrap_err().into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
