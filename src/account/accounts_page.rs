//! Displays accounts and their balances.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::{Account, get_all_accounts},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
};

/// The state needed for the accounts page and the account list API.
#[derive(Debug, Clone)]
pub struct AccountsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The account data to display in the view
struct AccountRow {
    account: Account,
    edit_url: String,
    delete_url: String,
    confirm_message: String,
}

impl From<Account> for AccountRow {
    fn from(account: Account) -> Self {
        Self {
            edit_url: format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, account.id),
            delete_url: format_endpoint(endpoints::ACCOUNT, account.id),
            confirm_message: format!(
                "Are you sure you want to delete the account '{}'? This cannot be undone.",
                account.name
            ),
            account,
        }
    }
}

/// Renders the accounts page showing all accounts.
pub async fn get_accounts_page(State(state): State<AccountsPageState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts: Vec<AccountRow> = get_all_accounts(&connection)
        .inspect_err(|error| tracing::error!("could not get all accounts: {error}"))?
        .into_iter()
        .map(AccountRow::from)
        .collect();

    Ok(accounts_view(&accounts).into_response())
}

/// Returns every account as JSON, ordered by name.
pub async fn get_accounts_json(State(state): State<AccountsPageState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_all_accounts(&connection) {
        Ok(accounts) => Json(accounts).into_response(),
        Err(error) => {
            tracing::error!("could not get all accounts: {error}");
            error.into_alert_response()
        }
    }
}

fn accounts_view(accounts: &[AccountRow]) -> Markup {
    let create_account_page_url = endpoints::NEW_ACCOUNT_VIEW;
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let table_row = |row: &AccountRow| {
        let account = &row.account;

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (account.name)

                    @if !account.is_active {
                        " "
                        span class="text-xs text-gray-500" { "(inactive)" }
                    }
                }

                td class=(TABLE_CELL_STYLE) { (account.kind.as_deref().unwrap_or("")) }

                td class=(TABLE_CELL_STYLE)
                {
                    span class=(BADGE_STYLE) { (account.currency) }
                }

                td class="px-6 py-4 text-right tabular-nums"
                {
                    (format_currency(account.initial_balance, &account.currency))
                }

                td class="px-6 py-4 text-right tabular-nums"
                {
                    (format_currency(account.current_balance, &account.currency))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (edit_delete_action_links(
                        &row.edit_url,
                        &row.delete_url,
                        &row.confirm_message,
                        "closest tr",
                        "delete",
                    ))
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Accounts" }

                    a href=(create_account_page_url) class=(LINK_STYLE)
                    {
                        "Add Account"
                    }
                }

                (accounts_cards_view(accounts, create_account_page_url))

                section class="hidden lg:block w-full overflow-x-auto lg:overflow-visible dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Currency" }
                                th scope="col" class="px-6 py-3 text-right" { "Initial" }
                                th scope="col" class="px-6 py-3 text-right" { "Balance" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (table_row(account))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No accounts found. Create an account "
                                        a href=(create_account_page_url) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Accounts", &[], &content)
}

fn accounts_cards_view(accounts: &[AccountRow], create_account_page_url: &str) -> Markup {
    html!(
        ul class="lg:hidden space-y-4"
        {
            @for row in accounts {
                li class=(CARD_STYLE) data-account-card="true"
                {
                    div class="flex items-start justify-between gap-3"
                    {
                        div class="text-sm font-semibold text-gray-900 dark:text-white"
                        { (row.account.name) }
                        div class="text-sm tabular-nums text-right text-gray-900 dark:text-white"
                        { (format_currency(row.account.current_balance, &row.account.currency)) }
                    }

                    div class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                    {
                        (row.account.kind.as_deref().unwrap_or("account"))
                        " · "
                        (row.account.currency)
                    }

                    div class="mt-2 flex items-center gap-4 text-sm"
                    {
                        (edit_delete_action_links(
                            &row.edit_url,
                            &row.delete_url,
                            &row.confirm_message,
                            "closest [data-account-card='true']",
                            "outerHTML",
                        ))
                    }
                }
            }

            @if accounts.is_empty() {
                li class="rounded border border-dashed border-gray-300 bg-white px-4 py-6 text-center text-sm text-gray-500 dark:border-gray-700 dark:bg-gray-800 dark:text-gray-400"
                {
                    "No accounts found. Create an account "
                    a href=(create_account_page_url) class=(LINK_STYLE)
                    {
                        "here"
                    }
                    "."
                }
            }
        }
    )
}
