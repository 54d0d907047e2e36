//! The transactions page and the transaction list API.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, AccountId, get_all_accounts},
    category::{CategoryId, get_category_options},
    datetime::{format_date_time_input, iso_date},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, NOTE_PREVIEW_LENGTH, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links, format_currency,
        format_datetime, truncate_text,
    },
    navigation::NavBar,
    pagination::{PaginationConfig, Pager, pagination_view},
    payee::{Payee, PayeeId, get_all_payees},
    transaction::{
        TransactionFilter, TransactionListing, count_filtered_transactions, query_transactions,
    },
};

/// The default and maximum number of transactions returned by the list API.
/// The maximum also caps the page size of the transactions page.
const DEFAULT_API_LIMIT: u64 = 100;
const MAX_API_LIMIT: u64 = 1000;

/// The state needed for the transactions page and list API.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters of the transactions page and list API.
///
/// The page uses `page` and `per_page`, the API uses `skip` and `limit`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionsQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub payee_id: Option<PayeeId>,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
}

impl TransactionsQuery {
    fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            account_id: self.account_id,
            category_id: self.category_id,
            payee_id: self.payee_id,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// The filters as URL query parameters, so page links keep them.
    fn filter_query_string(&self) -> String {
        let pairs: Vec<(&str, String)> = [
            ("account_id", self.account_id.map(|id| id.to_string())),
            ("category_id", self.category_id.map(|id| id.to_string())),
            ("payee_id", self.payee_id.map(|id| id.to_string())),
            ("start_date", self.start_date.map(|date| date.to_string())),
            ("end_date", self.end_date.map(|date| date.to_string())),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect();

        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }
}

pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let config = &state.pagination_config;
    let per_page = query
        .per_page
        .unwrap_or(config.default_page_size)
        .clamp(1, MAX_API_LIMIT);
    let filter = query.filter();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction_count = count_filtered_transactions(&filter, &connection)
        .inspect_err(|error| tracing::error!("could not count transactions: {error}"))?;
    let pager = Pager::new(
        query.page.unwrap_or(config.default_page),
        u64::from(transaction_count),
        per_page,
    );

    let transactions = query_transactions(&filter, per_page, pager.offset(), &connection)
        .inspect_err(|error| tracing::error!("could not query transactions: {error}"))?;

    let filter_options = FilterOptions {
        accounts: get_all_accounts(&connection)?,
        categories: get_category_options(&connection)?,
        payees: get_all_payees(&connection)?,
    };

    let filter_query = query.filter_query_string();
    let pagination = pagination_view(
        &pager.links(config.max_pages),
        |page| {
            let mut url = format!(
                "{}?page={page}&per_page={per_page}",
                endpoints::TRANSACTIONS_VIEW
            );
            if !filter_query.is_empty() {
                url.push('&');
                url.push_str(&filter_query);
            }
            url
        },
    );

    Ok(transactions_view(
        &transactions,
        &query,
        &filter_options,
        transaction_count,
        &pagination,
    )
    .into_response())
}

/// Returns the transactions matching the filters as JSON, newest first.
pub async fn get_transactions_json(
    State(state): State<TransactionsViewState>,
    Query(query): Query<TransactionsQuery>,
) -> Response {
    let filter = query.filter();
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_API_LIMIT).min(MAX_API_LIMIT);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match query_transactions(&filter, limit, skip, &connection) {
        Ok(transactions) => Json(transactions).into_response(),
        Err(error) => {
            tracing::error!("could not query transactions: {error}");
            error.into_alert_response()
        }
    }
}

struct FilterOptions {
    accounts: Vec<Account>,
    categories: Vec<(CategoryId, String)>,
    payees: Vec<Payee>,
}

fn amount_class(amount: f64) -> &'static str {
    if amount < 0.0 {
        "text-red-700 dark:text-red-400"
    } else {
        "text-green-700 dark:text-green-400"
    }
}

fn category_label(listing: &TransactionListing) -> Option<String> {
    match (&listing.parent_category_name, &listing.category_name) {
        (Some(parent), Some(category)) => Some(format!("{parent} › {category}")),
        (None, Some(category)) => Some(category.clone()),
        _ => None,
    }
}

fn confirm_message(listing: &TransactionListing) -> String {
    if listing.transaction.transfer_id.is_some() {
        "This transaction is part of a transfer, both sides of the transfer will be deleted. \
        This cannot be undone."
            .to_owned()
    } else {
        "Are you sure you want to delete this transaction? This cannot be undone.".to_owned()
    }
}

fn filter_form_view(filter: &TransactionsQuery, options: &FilterOptions) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="grid w-full gap-4 sm:grid-cols-2 lg:grid-cols-6 items-end"
        {
            div
            {
                label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }
                select id="account_id" name="account_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }
                    @for account in &options.accounts {
                        option value=(account.id) selected[filter.account_id == Some(account.id)]
                        { (account.name) }
                    }
                }
            }

            div
            {
                label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }
                select id="category_id" name="category_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }
                    @for (id, label) in &options.categories {
                        option value=(id) selected[filter.category_id == Some(*id)] { (label) }
                    }
                }
            }

            div
            {
                label for="payee_id" class=(FORM_LABEL_STYLE) { "Payee" }
                select id="payee_id" name="payee_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }
                    @for payee in &options.payees {
                        option value=(payee.id) selected[filter.payee_id == Some(payee.id)]
                        { (payee.name) }
                    }
                }
            }

            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                input
                    id="start_date"
                    type="date"
                    name="start_date"
                    value=[filter.start_date]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                input
                    id="end_date"
                    type="date"
                    name="end_date"
                    value=[filter.end_date]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filter" }
        }
    }
}

fn transactions_view(
    transactions: &[TransactionListing],
    filter: &TransactionsQuery,
    options: &FilterOptions,
    transaction_count: u32,
    pagination: &Markup,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let new_transaction_url = endpoints::NEW_TRANSACTION_VIEW;

    let table_row = |listing: &TransactionListing| {
        let transaction = &listing.transaction;
        let view_url = format_endpoint(endpoints::TRANSACTION_VIEW, transaction.id);
        let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
        let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id);

        html! {
            tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
            {
                td class=(TABLE_CELL_STYLE)
                {
                    a href=(view_url) class=(LINK_STYLE)
                    {
                        time datetime=(format_date_time_input(transaction.date)) { (format_datetime(transaction.date)) }
                    }
                }
                td class=(TABLE_CELL_STYLE) { (listing.account_name) }
                td class=(TABLE_CELL_STYLE) { (listing.payee_name.as_deref().unwrap_or("")) }
                td class=(TABLE_CELL_STYLE)
                {
                    @if let Some(label) = category_label(listing) {
                        span class=(BADGE_STYLE) { (label) }
                    }
                }
                td class=(TABLE_CELL_STYLE) title=(transaction.note)
                {
                    (truncate_text(&transaction.note, NOTE_PREVIEW_LENGTH))
                }
                td class={ "px-6 py-4 text-right tabular-nums " (amount_class(transaction.amount)) }
                {
                    (format_currency(transaction.amount, &transaction.currency))
                }
                td class="px-6 py-4 text-right tabular-nums"
                {
                    @if let Some(balance) = transaction.account_balance_after {
                        (format_currency(balance, &transaction.currency))
                    }
                }
                td class=(TABLE_CELL_STYLE)
                {
                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        &confirm_message(listing),
                        "closest tr",
                        "delete",
                    ))
                }
            }
        }
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full space-y-4 lg:max-w-6xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    div class="flex gap-4"
                    {
                        a href=(endpoints::NEW_TRANSFER_VIEW) class=(LINK_STYLE) { "New Transfer" }
                        a href=(new_transaction_url) class=(LINK_STYLE) { "Add Transaction" }
                    }
                }

                (filter_form_view(filter, options))

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    (transaction_count) " transaction(s)"
                }

                ul class="lg:hidden space-y-4"
                {
                    @for listing in transactions {
                        li class=(CARD_STYLE) data-transaction-card="true"
                        {
                            div class="flex items-start justify-between gap-3"
                            {
                                div class="text-sm font-semibold text-gray-900 dark:text-white"
                                {
                                    (listing.payee_name.as_deref().unwrap_or(&listing.account_name))
                                }
                                div class={ "text-sm tabular-nums text-right " (amount_class(listing.transaction.amount)) }
                                {
                                    (format_currency(listing.transaction.amount, &listing.transaction.currency))
                                }
                            }

                            div class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                            {
                                (format_datetime(listing.transaction.date))
                                " · "
                                (listing.account_name)
                                @if let Some(label) = category_label(listing) {
                                    " · " (label)
                                }
                            }

                            div class="mt-2 flex items-center gap-4 text-sm"
                            {
                                (edit_delete_action_links(
                                    &format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, listing.transaction.id),
                                    &format_endpoint(endpoints::TRANSACTION, listing.transaction.id),
                                    &confirm_message(listing),
                                    "closest [data-transaction-card='true']",
                                    "outerHTML",
                                ))
                            }
                        }
                    }
                }

                section class="hidden lg:block w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Payee" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Note" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class="px-6 py-3 text-right" { "Balance" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for listing in transactions {
                                (table_row(listing))
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td colspan="8" class="px-6 py-4 text-center"
                                    {
                                        "No transactions found. Add one "
                                        a href=(new_transaction_url) class=(LINK_STYLE) { "here" }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }

                (pagination)
            }
        }
    };

    base("Transactions", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Query;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::{Duration, macros::datetime};

    use crate::{
        account::{NewAccount, create_account},
        db::initialize,
        money::CurrencyCode,
        name::Name,
        pagination::PaginationConfig,
        test_utils::{assert_valid_html, parse_html_document, response_json},
        transaction::{
            NewTransaction, create_transaction,
            transactions_page::{
                TransactionsQuery, TransactionsViewState, get_transactions_json,
                get_transactions_page,
            },
        },
    };

    fn get_state(transaction_count: i64) -> TransactionsViewState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let account = create_account(
            &NewAccount {
                name: Name::new_unchecked("Current"),
                kind: None,
                currency: CurrencyCode::reference(),
                initial_balance: 0.0,
                is_active: true,
            },
            &connection,
        )
        .unwrap();
        for i in 0..transaction_count {
            create_transaction(
                NewTransaction::new(
                    account.id,
                    datetime!(2025-01-01 12:00) + Duration::days(i),
                    -(i as f64 + 1.0),
                ),
                &connection,
            )
            .unwrap();
        }

        TransactionsViewState {
            db_connection: Arc::new(Mutex::new(connection)),
            pagination_config: PaginationConfig {
                default_page: 1,
                default_page_size: 3,
                max_pages: 5,
            },
        }
    }

    #[tokio::test]
    async fn page_shows_newest_transactions_first() {
        let state = get_state(5);

        let response = get_transactions_page(State(state), Query(TransactionsQuery::default()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let dates: Vec<String> = html
            .select(&Selector::parse("tbody tr time").unwrap())
            .map(|time| time.text().collect())
            .collect();
        assert_eq!(
            dates,
            ["2025-01-05 12:00", "2025-01-04 12:00", "2025-01-03 12:00"]
        );
    }

    #[tokio::test]
    async fn page_links_to_next_page_with_page_size() {
        let state = get_state(5);

        let response = get_transactions_page(State(state), Query(TransactionsQuery::default()))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let next = html
            .select(&Selector::parse("nav.pagination a[rel=next]").unwrap())
            .next()
            .expect("no next link");
        assert_eq!(next.value().attr("href"), Some("/transactions?page=2&per_page=3"));
    }

    #[tokio::test]
    async fn page_past_the_end_shows_last_page() {
        let state = get_state(5);

        let response = get_transactions_page(
            State(state),
            Query(TransactionsQuery {
                page: Some(10),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let row_count = html
            .select(&Selector::parse("tbody tr[data-transaction-row]").unwrap())
            .count();
        assert_eq!(row_count, 2);
    }

    #[tokio::test]
    async fn json_applies_skip_and_limit() {
        let state = get_state(5);

        let response = get_transactions_json(
            State(state),
            Query(TransactionsQuery {
                skip: Some(1),
                limit: Some(2),
                ..Default::default()
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["date"], "2025-01-04T12:00:00");
        assert_eq!(rows[0]["account_name"], "Current");
        assert_eq!(rows[0]["amount"], -4.0);
    }

    #[tokio::test]
    async fn huge_page_size_is_capped() {
        let state = get_state(5);

        let response = get_transactions_page(
            State(state),
            Query(TransactionsQuery {
                per_page: Some(u64::MAX),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        let row_count = html
            .select(&Selector::parse("tbody tr[data-transaction-row]").unwrap())
            .count();
        assert_eq!(row_count, 5);
    }

    #[tokio::test]
    async fn json_huge_skip_returns_nothing() {
        let state = get_state(5);

        let response = get_transactions_json(
            State(state),
            Query(TransactionsQuery {
                skip: Some(u64::MAX),
                limit: Some(u64::MAX),
                ..Default::default()
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json.as_array().map(Vec::len), Some(0));
    }
}
