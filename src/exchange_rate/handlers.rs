//! Exchange rate page, manual entry and ECB update endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    alert::{ALERT_CONTAINER_ID, Alert},
    balance::recalculate_all_balances,
    endpoints,
    exchange_rate::{
        ExchangeRate, RateUpdateSummary, fetch_ecb_xml, get_exchange_rate_history,
        get_latest_exchange_rates, parse_ecb_xml, store_ecb_rates, upsert_exchange_rate,
    },
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    money::CurrencyCode,
    navigation::NavBar,
};

const HISTORY_LENGTH: u32 = 50;

#[derive(Debug, Clone)]
pub struct ExchangeRateState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub http_client: reqwest::Client,
    pub exchange_rate_url: String,
}

impl FromRef<AppState> for ExchangeRateState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            http_client: state.http_client.clone(),
            exchange_rate_url: state.exchange_rate_url.clone(),
        }
    }
}

/// A rate entered by hand.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeRateForm {
    pub currency: String,
    pub rate: f64,
    #[serde(with = "crate::datetime::iso_date")]
    pub date: Date,
}

/// Parse an ECB feed and store the new rates, then rebuild the total
/// balances with the new rates in one SQL transaction.
pub fn apply_ecb_rates(xml: &str, connection: &Connection) -> Result<RateUpdateSummary, Error> {
    let days = parse_ecb_xml(xml)?;
    tracing::debug!("Parsed {} days of ECB rates", days.len());

    let transaction = connection.unchecked_transaction()?;
    let summary = store_ecb_rates(&days, &transaction)?;

    if summary.rates > 0 {
        recalculate_all_balances(&transaction)?;
    }

    transaction.commit()?;

    Ok(summary)
}

pub async fn get_exchange_rates_page(
    State(state): State<ExchangeRateState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let latest = get_latest_exchange_rates(&connection)?;
    let history = get_exchange_rate_history(HISTORY_LENGTH, &connection)?;

    Ok(exchange_rates_view(&latest, &history).into_response())
}

pub async fn get_exchange_rates_json(State(state): State<ExchangeRateState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_latest_exchange_rates(&connection) {
        Ok(rates) => Json(rates).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

pub async fn create_exchange_rate_endpoint(
    State(state): State<ExchangeRateState>,
    Form(form): Form<ExchangeRateForm>,
) -> Response {
    let currency = match CurrencyCode::new(&form.currency) {
        Ok(currency) => currency,
        Err(error) => return error.into_alert_response(),
    };

    if form.rate <= 0.0 || !form.rate.is_finite() {
        return Error::NonPositiveAmount.into_alert_response();
    }

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
            upsert_exchange_rate(&currency, form.rate, form.date, &transaction)?;
            recalculate_all_balances(&transaction)?;
            transaction.commit().map_err(Error::from)
        });

    match result {
        Ok(()) => (
            HxRedirect(endpoints::EXCHANGE_RATES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not store exchange rate for {currency}: {error}");
            error.into_alert_response()
        }
    }
}

/// Fetch the ECB feed and store any new rates.
///
/// The database lock is only taken once the download has finished.
pub async fn update_exchange_rates_endpoint(State(state): State<ExchangeRateState>) -> Response {
    let xml = match fetch_ecb_xml(&state.http_client, &state.exchange_rate_url).await {
        Ok(xml) => xml,
        Err(error) => {
            tracing::error!("Could not fetch exchange rates: {error}");
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match apply_ecb_rates(&xml, &connection) {
        Ok(summary) => {
            tracing::info!(
                "Stored {} exchange rates for {} days",
                summary.rates,
                summary.days
            );

            Alert::Success {
                message: "Exchange rates updated".to_owned(),
                details: format!(
                    "Stored {} rates for {} new days.",
                    summary.rates, summary.days
                ),
            }
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not store exchange rates: {error}");
            error.into_alert_response()
        }
    }
}

fn rates_table(rates: &[ExchangeRate]) -> Markup {
    html! {
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Currency" }
                    th scope="col" class="px-6 py-3 text-right" { "Per £1" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                }
            }

            tbody
            {
                @for rate in rates {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (rate.currency) }
                        td class="px-6 py-4 text-right tabular-nums" { (format!("{:.4}", rate.rate)) }
                        td class=(TABLE_CELL_STYLE) { (rate.date) }
                    }
                }

                @if rates.is_empty() {
                    tr
                    {
                        td colspan="3" class="px-6 py-4 text-center" { "No exchange rates stored." }
                    }
                }
            }
        }
    }
}

fn exchange_rates_view(latest: &[ExchangeRate], history: &[ExchangeRate]) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXCHANGE_RATES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="space-y-8 lg:max-w-3xl lg:mx-auto"
            {
                section class="space-y-4"
                {
                    header class="flex justify-between flex-wrap items-end gap-4"
                    {
                        h1 class="text-xl font-bold" { "Exchange Rates" }

                        div class="w-48"
                        {
                            button
                                type="button"
                                hx-post=(endpoints::UPDATE_EXCHANGE_RATES)
                                hx-swap="none"
                                hx-target-error={ "#" (ALERT_CONTAINER_ID) }
                                hx-disabled-elt="this"
                                class=(BUTTON_SECONDARY_STYLE)
                            {
                                "Update from ECB"
                            }
                        }
                    }

                    (rates_table(latest))
                }

                section class="space-y-4"
                {
                    h2 class="text-lg font-semibold" { "Add a Rate" }

                    form
                        hx-post=(endpoints::EXCHANGE_RATES_API)
                        hx-target-error={ "#" (ALERT_CONTAINER_ID) }
                        class="grid grid-cols-1 gap-4 md:grid-cols-4 md:items-end"
                    {
                        div
                        {
                            label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }
                            input id="currency" type="text" name="currency" minlength="3"
                                maxlength="3" placeholder="EUR" required
                                class=(FORM_TEXT_INPUT_STYLE);
                        }

                        div
                        {
                            label for="rate" class=(FORM_LABEL_STYLE) { "Per £1" }
                            input id="rate" type="number" name="rate" step="0.000001"
                                min="0.000001" required class=(FORM_TEXT_INPUT_STYLE);
                        }

                        div
                        {
                            label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                            input id="date" type="date" name="date" required
                                class=(FORM_TEXT_INPUT_STYLE);
                        }

                        button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
                    }
                }

                section class="space-y-4"
                {
                    h2 class="text-lg font-semibold" { "Recent History" }
                    (rates_table(history))
                }
            }
        }
    };

    base("Exchange Rates", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::{date, datetime};

    use crate::{
        account::{NewAccount, create_account},
        db::initialize,
        exchange_rate::{
            ExchangeRateForm, ExchangeRateState, apply_ecb_rates, create_exchange_rate_endpoint,
            get_exchange_rates_json, get_exchange_rates_page, update_exchange_rates_endpoint,
        },
        money::CurrencyCode,
        name::Name,
        test_utils::{
            assert_balances_match_rebuild, assert_valid_html, parse_html_document, response_json,
        },
        transaction::{NewTransaction, create_transaction, get_transaction},
    };

    fn get_state() -> ExchangeRateState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        ExchangeRateState {
            db_connection: Arc::new(Mutex::new(connection)),
            http_client: reqwest::Client::new(),
            exchange_rate_url: "http://127.0.0.1:9/eurofxref-hist.xml".to_owned(),
        }
    }

    fn form(currency: &str, rate: f64) -> Form<ExchangeRateForm> {
        Form(ExchangeRateForm {
            currency: currency.to_owned(),
            rate,
            date: date!(2025-01-02),
        })
    }

    #[tokio::test]
    async fn manual_rate_is_listed() {
        let state = get_state();

        let response = create_exchange_rate_endpoint(State(state.clone()), form("eur", 1.2)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let html = parse_html_document(get_exchange_rates_page(State(state.clone())).await.unwrap()).await;
        assert_valid_html(&html);
        let first_cell = html
            .select(&Selector::parse("tbody td").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(first_cell, "EUR");

        let json = response_json(get_exchange_rates_json(State(state)).await).await;
        assert_eq!(json[0]["rate"], 1.2);
        assert_eq!(json[0]["date"], "2025-01-02");
    }

    #[tokio::test]
    async fn manual_rate_rebuilds_totals() {
        let state = get_state();
        let transaction_id = {
            let connection = state.db_connection.lock().unwrap();
            let account = create_account(
                &NewAccount {
                    name: Name::new_unchecked("Pounds"),
                    kind: None,
                    currency: CurrencyCode::reference(),
                    initial_balance: 0.0,
                    is_active: true,
                },
                &connection,
            )
            .unwrap();
            let euro = create_account(
                &NewAccount {
                    name: Name::new_unchecked("Euros"),
                    kind: None,
                    currency: CurrencyCode::new("EUR").unwrap(),
                    initial_balance: 0.0,
                    is_active: true,
                },
                &connection,
            )
            .unwrap();
            create_transaction(
                NewTransaction::new(account.id, datetime!(2025-01-01 09:00), 10.0),
                &connection,
            )
            .unwrap();
            create_transaction(
                NewTransaction::new(account.id, datetime!(2025-01-01 10:00), 10.0),
                &connection,
            )
            .unwrap();
            create_transaction(
                NewTransaction::new(euro.id, datetime!(2025-01-02 09:00), 12.5),
                &connection,
            )
            .unwrap()
            .id
        };

        {
            let connection = state.db_connection.lock().unwrap();
            let transaction = get_transaction(transaction_id, &connection).unwrap();
            assert_eq!(transaction.total_balance_after, Some(32.5));
        }

        create_exchange_rate_endpoint(State(state.clone()), form("EUR", 1.25)).await;

        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(transaction_id, &connection).unwrap();
        assert_eq!(transaction.total_balance_after, Some(30.0));
        assert_balances_match_rebuild(&connection);
    }

    const ECB_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gesmes:Envelope xmlns:gesmes="http://www.gesmes.org/xml/2002-08-01" xmlns="http://www.ecb.int/vocabulary/2002-08-01/eurofxref">
    <Cube>
        <Cube time="2025-01-02">
            <Cube currency="USD" rate="1.0000"/>
            <Cube currency="GBP" rate="0.8000"/>
        </Cube>
    </Cube>
</gesmes:Envelope>"#;

    #[test]
    fn ecb_rates_rebuild_totals() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let mut ids = Vec::new();
        for (name, currency, date, amount) in [
            ("Pounds", "GBP", datetime!(2025-01-02 08:00), 10.0),
            ("More Pounds", "GBP", datetime!(2025-01-02 09:00), 10.0),
            ("Dollars", "USD", datetime!(2025-01-02 10:00), 12.5),
        ] {
            let account = create_account(
                &NewAccount {
                    name: Name::new_unchecked(name),
                    kind: None,
                    currency: CurrencyCode::new(currency).unwrap(),
                    initial_balance: 0.0,
                    is_active: true,
                },
                &connection,
            )
            .unwrap();
            ids.push(
                create_transaction(NewTransaction::new(account.id, date, amount), &connection)
                    .unwrap()
                    .id,
            );
        }
        let last = ids[2];
        assert_eq!(
            get_transaction(last, &connection).unwrap().total_balance_after,
            Some(32.5)
        );

        let summary = apply_ecb_rates(ECB_FEED, &connection).unwrap();

        assert_eq!(summary.rates, 1);
        // 1 USD per euro and 0.8 GBP per euro is 1.25 USD per pound.
        assert_eq!(
            get_transaction(last, &connection).unwrap().total_balance_after,
            Some(30.0)
        );
        assert_balances_match_rebuild(&connection);
    }

    #[tokio::test]
    async fn invalid_rate_is_rejected() {
        let response = create_exchange_rate_endpoint(State(get_state()), form("EUR", 0.0)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unreachable_feed_returns_bad_gateway() {
        let response = update_exchange_rates_endpoint(State(get_state())).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
