//! The new transaction page and the endpoint its form posts to.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    datetime::format_date_time_input,
    endpoints,
    html::{FORM_CONTAINER_STYLE, LINK_STYLE, base},
    navigation::NavBar,
    timezone::get_local_now,
    transaction::{
        create_transaction,
        form::{TransactionForm, TransactionFormOptions, transaction_form_view},
    },
};

/// The state needed to create and edit transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// Used to prefill the date input with the current local time.
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

pub async fn get_new_transaction_page(
    State(state): State<TransactionState>,
) -> Result<Response, Error> {
    let now = get_local_now(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let options = TransactionFormOptions::load(&connection)
        .inspect_err(|error| tracing::error!("could not load transaction form options: {error}"))?;

    Ok(new_transaction_view(&options, &format_date_time_input(now)).into_response())
}

pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let transaction = match form.validate() {
        Ok(transaction) => transaction,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_transaction(transaction, &connection) {
        Ok(transaction) => {
            tracing::debug!("Created transaction {}", transaction.id);
            (
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::warn!("Could not create transaction: {error}");
            error.into_alert_response()
        }
    }
}

fn new_transaction_view(options: &TransactionFormOptions, default_date: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { "New Transaction" }

            @if options.accounts.is_empty() {
                p
                {
                    "You need an account before you can add transactions. Create one "
                    a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE) { "here" }
                    "."
                }
            } @else {
                (transaction_form_view(
                    endpoints::TRANSACTIONS_API,
                    "hx-post",
                    None,
                    options,
                    default_date,
                    "Create Transaction",
                ))
            }
        }
    };

    base("New Transaction", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;

    use crate::{
        account::{NewAccount, create_account, get_account},
        db::initialize,
        endpoints,
        money::CurrencyCode,
        name::Name,
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_hx_redirect, assert_valid_html,
            must_get_form, parse_html_document,
        },
        transaction::{
            TransactionState, count_transactions, create_transaction_endpoint,
            form::TransactionForm, get_new_transaction_page,
        },
    };

    fn get_state(with_account: bool) -> TransactionState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        if with_account {
            create_account(
                &NewAccount {
                    name: Name::new_unchecked("Current"),
                    kind: None,
                    currency: CurrencyCode::reference(),
                    initial_balance: 50.0,
                    is_active: true,
                },
                &connection,
            )
            .unwrap();
        }

        TransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    #[tokio::test]
    async fn page_renders_form() {
        let response = get_new_transaction_page(State(get_state(true)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "date", "datetime-local");
        assert_form_input(&form, "transaction_type", "radio");
    }

    #[tokio::test]
    async fn page_without_accounts_links_to_new_account() {
        let response = get_new_transaction_page(State(get_state(false)))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("You need an account"));
    }

    #[tokio::test]
    async fn create_redirects_and_updates_balance() {
        let state = get_state(true);
        let form: TransactionForm = serde_html_form::from_str(
            "transaction_type=expense&amount=20&date=2025-03-14T09%3A05&account_id=1",
        )
        .unwrap();

        let response = create_transaction_endpoint(State(state.clone()), Form(form)).await;

        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection), Ok(1));
        assert_eq!(get_account(1, &connection).unwrap().current_balance, 30.0);
    }

    #[tokio::test]
    async fn create_with_missing_account_is_bad_request() {
        let state = get_state(true);
        let form: TransactionForm = serde_html_form::from_str(
            "transaction_type=income&amount=20&date=2025-03-14T09%3A05&account_id=9",
        )
        .unwrap();

        let response = create_transaction_endpoint(State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
