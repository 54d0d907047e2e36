//! A single transaction as a page or JSON.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    endpoints::{self, format_endpoint},
    html::{BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_currency, format_datetime},
    navigation::NavBar,
    transaction::{TransactionId, TransactionListing, TransactionState, get_transaction_listing},
};

pub async fn get_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<TransactionState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let listing = get_transaction_listing(transaction_id, &connection)?;

    Ok(transaction_view(&listing).into_response())
}

/// Returns a transaction with the names of its account, category, payee,
/// location and project.
pub async fn get_transaction_json(
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

    match get_transaction_listing(transaction_id, &connection) {
        Ok(listing) => Json(listing).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

fn detail_row(label: &str, value: Option<&str>) -> Markup {
    html! {
        div class="py-3 sm:grid sm:grid-cols-3 sm:gap-4"
        {
            dt class="text-sm font-medium text-gray-500 dark:text-gray-400" { (label) }
            dd class="mt-1 text-sm text-gray-900 dark:text-white sm:col-span-2 sm:mt-0"
            {
                (value.unwrap_or("-"))
            }
        }
    }
}

fn transaction_view(listing: &TransactionListing) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let transaction = &listing.transaction;
    let view_url = format_endpoint(endpoints::TRANSACTION_VIEW, transaction.id);
    let edit_url = format!(
        "{}?{}",
        format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id),
        serde_urlencoded::to_string([("redirect_url", view_url.as_str())]).unwrap_or_default()
    );
    let category = match (&listing.parent_category_name, &listing.category_name) {
        (Some(parent), Some(category)) => Some(format!("{parent} › {category}")),
        (_, category) => category.clone(),
    };
    let amount = format_currency(transaction.amount, &transaction.currency);
    let account_balance = transaction
        .account_balance_after
        .map(|balance| format_currency(balance, &transaction.currency));
    let date = format_datetime(transaction.date);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-2xl space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transaction" }

                    div class="flex gap-4"
                    {
                        a href=(edit_url) class=(LINK_STYLE) { "Edit" }
                        a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "Back to transactions" }
                    }
                }

                @if transaction.transfer_id.is_some() {
                    span class=(BADGE_STYLE) { "Transfer" }
                }

                dl class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    (detail_row("Date", Some(&date)))
                    (detail_row("Amount", Some(&amount)))
                    (detail_row("Account", Some(&listing.account_name)))
                    (detail_row("Balance after", account_balance.as_deref()))
                    (detail_row("Payee", listing.payee_name.as_deref()))
                    (detail_row("Category", category.as_deref()))
                    (detail_row("Location", listing.location_name.as_deref()))
                    (detail_row("Project", listing.project_name.as_deref()))
                    (detail_row("Note", Some(transaction.note.as_str()).filter(|note| !note.is_empty())))
                }
            }
        }
    };

    base("Transaction", &[], &content)
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
        payee::create_payee,
        test_utils::{assert_valid_html, parse_html_document, response_json},
        transaction::{
            NewTransaction, TransactionState, create_transaction,
            view::{get_transaction_json, get_transaction_page},
        },
    };

    fn get_state() -> TransactionState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let account = create_account(
            &NewAccount {
                name: Name::new_unchecked("Current"),
                kind: None,
                currency: CurrencyCode::reference(),
                initial_balance: 10.0,
                is_active: true,
            },
            &connection,
        )
        .unwrap();
        let payee = create_payee(&Name::new_unchecked("Bakery"), &connection).unwrap();
        create_transaction(
            NewTransaction {
                payee_id: Some(payee.id),
                note: "Bread".to_owned(),
                ..NewTransaction::new(account.id, datetime!(2025-02-03 08:30), -2.5)
            },
            &connection,
        )
        .unwrap();

        TransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    #[tokio::test]
    async fn page_shows_details() {
        let response = get_transaction_page(Path(1), State(get_state()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Bakery"));
        assert!(text.contains("-£2.50"));
        assert!(text.contains("£7.50"));
    }

    #[tokio::test]
    async fn json_includes_names_and_balances() {
        let response = get_transaction_json(Path(1), State(get_state())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["payee_name"], "Bakery");
        assert_eq!(json["account_name"], "Current");
        assert_eq!(json["note"], "Bread");
        assert_eq!(json["account_balance_after"], 7.5);
        assert_eq!(json["date"], "2025-02-03T08:30:00");
    }

    #[tokio::test]
    async fn json_for_missing_transaction_is_not_found() {
        let response = get_transaction_json(Path(5), State(get_state())).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
