//! Transaction editing page and endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, Query};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    transaction::{
        Transaction, TransactionId, TransactionState,
        form::{TransactionForm, TransactionFormOptions, transaction_form_view},
        get_transaction, update_transaction,
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    /// Where to send the user after saving, defaults to the transactions page.
    pub redirect_url: Option<String>,
}

pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
    Query(query): Query<RedirectQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, &connection)?;
    let options = TransactionFormOptions::load(&connection)
        .inspect_err(|error| tracing::error!("could not load transaction form options: {error}"))?;

    let mut update_endpoint = format_endpoint(endpoints::TRANSACTION, transaction.id);
    if let Some(redirect_url) = query.redirect_url {
        let redirect_query =
            serde_urlencoded::to_string([("redirect_url", redirect_url)]).unwrap_or_default();
        update_endpoint.push('?');
        update_endpoint.push_str(&redirect_query);
    }

    Ok(edit_transaction_view(&transaction, &update_endpoint, &options).into_response())
}

pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
    Query(query): Query<RedirectQuery>,
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

    if let Err(error) = update_transaction(transaction_id, transaction, &connection) {
        tracing::warn!("Could not update transaction {transaction_id}: {error}");
        return error.into_alert_response();
    }

    // Only local paths, never another site.
    let redirect_url = query
        .redirect_url
        .filter(|url| url.starts_with('/') && !url.starts_with("//"))
        .unwrap_or_else(|| endpoints::TRANSACTIONS_VIEW.to_owned());

    (HxRedirect(redirect_url), StatusCode::SEE_OTHER).into_response()
}

fn edit_transaction_view(
    transaction: &Transaction,
    update_endpoint: &str,
    options: &TransactionFormOptions,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { "Edit Transaction" }

            @if transaction.transfer_id.is_some() {
                p class="w-full mb-4 text-sm text-gray-500 dark:text-gray-400"
                {
                    "This transaction is one side of a transfer. Changes only apply to this side."
                }
            }

            (transaction_form_view(
                update_endpoint,
                "hx-put",
                Some(transaction),
                options,
                "",
                "Save Changes",
            ))
        }
    };

    base("Edit Transaction", &[], &content)
}
