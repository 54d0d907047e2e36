//! Pages and endpoints for moving money between accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::{Account, AccountId, get_all_accounts},
    alert::{ALERT_CONTAINER_ID, Alert},
    datetime::{format_date_time_input, parse_date_time},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_CONTAINER_STYLE,
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
        format_datetime,
    },
    navigation::NavBar,
    timezone::get_local_now,
    transfer::{NewTransfer, Transfer, TransferId, create_transfer, delete_transfer, get_all_transfers},
};

#[derive(Debug, Clone)]
pub struct TransferState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for TransferState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferForm {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub date: String,
    pub from_amount: f64,
    /// Only needed when the accounts use different currencies.
    pub to_amount: Option<f64>,
    pub note: Option<String>,
}

impl TransferForm {
    pub fn validate(self) -> Result<NewTransfer, Error> {
        let date = parse_date_time(&self.date).ok_or(Error::InvalidDateTime(self.date))?;

        Ok(NewTransfer {
            from_account_id: self.from_account_id,
            to_account_id: self.to_account_id,
            date,
            from_amount: self.from_amount,
            to_amount: self.to_amount,
            note: self.note.unwrap_or_default(),
        })
    }
}

pub async fn get_transfers_page(State(state): State<TransferState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transfers = get_all_transfers(&connection)
        .inspect_err(|error| tracing::error!("could not get transfers: {error}"))?;

    Ok(transfers_view(&transfers).into_response())
}

pub async fn get_transfers_json(State(state): State<TransferState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_all_transfers(&connection) {
        Ok(transfers) => Json(transfers).into_response(),
        Err(error) => {
            tracing::error!("could not get transfers: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn get_new_transfer_page(State(state): State<TransferState>) -> Result<Response, Error> {
    let now = get_local_now(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts: Vec<Account> = get_all_accounts(&connection)?
        .into_iter()
        .filter(|account| account.is_active)
        .collect();

    Ok(new_transfer_view(&accounts, &format_date_time_input(now)).into_response())
}

pub async fn create_transfer_endpoint(
    State(state): State<TransferState>,
    Form(form): Form<TransferForm>,
) -> Response {
    let transfer = match form.validate() {
        Ok(transfer) => transfer,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_transfer(&transfer, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSFERS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::warn!("Could not create transfer: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn delete_transfer_endpoint(
    Path(transfer_id): Path<TransferId>,
    State(state): State<TransferState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transfer(transfer_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Transfer deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete transfer {transfer_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn delete_button(transfer: &Transfer, hx_target: &str) -> Markup {
    html! {
        button
            type="button"
            hx-delete=(format_endpoint(endpoints::TRANSFER, transfer.id))
            hx-confirm="Are you sure you want to delete this transfer? Both transactions will be deleted."
            hx-target=(hx_target)
            hx-swap="delete"
            hx-target-error={ "#" (ALERT_CONTAINER_ID) }
            class=(BUTTON_DELETE_STYLE)
        {
            "Delete"
        }
    }
}

fn transfers_view(transfers: &[Transfer]) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSFERS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full space-y-4 lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transfers" }
                    a href=(endpoints::NEW_TRANSFER_VIEW) class=(LINK_STYLE) { "New Transfer" }
                }

                ul class="lg:hidden space-y-4"
                {
                    @for transfer in transfers {
                        li class=(CARD_STYLE) data-transfer-card="true"
                        {
                            div class="text-sm font-semibold text-gray-900 dark:text-white"
                            {
                                (transfer.from_account_name) " → " (transfer.to_account_name)
                            }
                            div class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                            {
                                (format_datetime(transfer.date)) " · "
                                (format_currency(transfer.from_amount, &transfer.from_currency))
                                @if transfer.from_currency != transfer.to_currency {
                                    " → " (format_currency(transfer.to_amount, &transfer.to_currency))
                                }
                            }
                            div class="mt-2 text-sm"
                            {
                                (delete_button(transfer, "closest [data-transfer-card='true']"))
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "From" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "To" }
                                th scope="col" class="px-6 py-3 text-right" { "Sent" }
                                th scope="col" class="px-6 py-3 text-right" { "Received" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Note" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for transfer in transfers {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (format_datetime(transfer.date)) }
                                    td class=(TABLE_CELL_STYLE) { (transfer.from_account_name) }
                                    td class=(TABLE_CELL_STYLE) { (transfer.to_account_name) }
                                    td class="px-6 py-4 text-right tabular-nums"
                                    { (format_currency(transfer.from_amount, &transfer.from_currency)) }
                                    td class="px-6 py-4 text-right tabular-nums"
                                    { (format_currency(transfer.to_amount, &transfer.to_currency)) }
                                    td class=(TABLE_CELL_STYLE) { (transfer.note) }
                                    td class=(TABLE_CELL_STYLE) { (delete_button(transfer, "closest tr")) }
                                }
                            }

                            @if transfers.is_empty() {
                                tr
                                {
                                    td colspan="7" class="px-6 py-4 text-center"
                                    {
                                        "No transfers yet."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Transfers", &[], &content)
}

fn account_select(name: &str, label: &str, accounts: &[Account]) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            select id=(name) name=(name) required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for account in accounts {
                    option value=(account.id) { (account.name) " (" (account.currency) ")" }
                }
            }
        }
    }
}

fn new_transfer_view(accounts: &[Account], default_date: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSFERS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { "New Transfer" }

            @if accounts.len() < 2 {
                p
                {
                    "You need at least two active accounts to make a transfer. Create one "
                    a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE) { "here" }
                    "."
                }
            } @else {
                form
                    hx-post=(endpoints::TRANSFERS_API)
                    hx-target-error={ "#" (ALERT_CONTAINER_ID) }
                    class="w-full space-y-4 md:space-y-6"
                {
                    (account_select("from_account_id", "From", accounts))
                    (account_select("to_account_id", "To", accounts))

                    div
                    {
                        label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                        input
                            id="date"
                            type="datetime-local"
                            name="date"
                            value=(default_date)
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="from_amount" class=(FORM_LABEL_STYLE) { "Amount sent" }
                        input
                            id="from_amount"
                            type="number"
                            name="from_amount"
                            step="0.01"
                            min="0.01"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="to_amount" class=(FORM_LABEL_STYLE)
                        {
                            "Amount received (if the currencies differ)"
                        }
                        input
                            id="to_amount"
                            type="number"
                            name="to_amount"
                            step="0.01"
                            min="0.01"
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="note" class=(FORM_LABEL_STYLE) { "Note" }
                        input id="note" type="text" name="note" class=(FORM_TEXT_INPUT_STYLE);
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Transfer" }
                }
            }
        }
    };

    base("New Transfer", &[], &content)
}
