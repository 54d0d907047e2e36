//! Dashboard page and summary endpoint.

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
    budget::{BudgetProgress, YearMonth, budget_progress_bar, get_budget_progress_for_month},
    dashboard::{
        aggregation::{
            get_expenses_by_category, get_month_end_balances, get_monthly_totals,
            last_twelve_months,
        },
        charts::{
            DashboardChart, balance_chart, category_expenses_chart, charts_script, charts_view,
            income_expenses_chart,
        },
        summary::{AccountBalance, DashboardSummary, get_account_balances, get_dashboard_summary},
    },
    endpoints,
    html::{
        CARD_STYLE, HeadElement, LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency, link,
    },
    navigation::NavBar,
    timezone::get_local_now,
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Europe/London".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Everything shown on the dashboard once there are transactions.
struct DashboardData {
    summary: DashboardSummary,
    account_balances: Vec<AccountBalance>,
    budget: Option<BudgetProgress>,
    charts: [DashboardChart; 3],
}

/// Display a page with an overview of the user's finances.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let this_month = YearMonth::of(get_local_now(&state.local_timezone)?.date());

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    match build_dashboard_data(this_month, &connection)
        .inspect_err(|error| tracing::error!("could not build dashboard: {error}"))?
    {
        Some(data) => Ok(dashboard_view(nav_bar, this_month, &data).into_response()),
        None => Ok(dashboard_no_data_view(nav_bar).into_response()),
    }
}

pub async fn get_dashboard_summary_json(State(state): State<DashboardState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_dashboard_summary(&connection) {
        Ok(summary) => Json(summary).into_response(),
        Err(error) => {
            tracing::error!("could not get dashboard summary: {error}");
            error.into_alert_response()
        }
    }
}

/// Returns `None` when there are no transactions to summarise.
fn build_dashboard_data(
    this_month: YearMonth,
    connection: &Connection,
) -> Result<Option<DashboardData>, Error> {
    let summary = get_dashboard_summary(connection)?;

    if summary.total_transactions == 0 {
        return Ok(None);
    }

    let months = last_twelve_months(this_month);
    let base_currency = &summary.base_currency;

    let charts = [
        DashboardChart {
            id: "income-expenses-chart",
            options: income_expenses_chart(
                &get_monthly_totals(&months, base_currency, connection)?,
                base_currency,
            )
            .to_string(),
        },
        DashboardChart {
            id: "category-expenses-chart",
            options: category_expenses_chart(
                &get_expenses_by_category(&months, base_currency, connection)?,
                base_currency,
            )
            .to_string(),
        },
        DashboardChart {
            id: "balance-chart",
            options: balance_chart(
                &months,
                get_month_end_balances(&months, connection)?,
                base_currency,
            )
            .to_string(),
        },
    ];

    Ok(Some(DashboardData {
        account_balances: get_account_balances(base_currency, connection)?,
        budget: get_budget_progress_for_month(this_month, connection)?,
        summary,
        charts,
    }))
}

fn dashboard_no_data_view(nav_bar: NavBar) -> Markup {
    let nav_bar = nav_bar.into_html();
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "manually");
    let import_transaction_link = link(endpoints::IMPORT_VIEW, "importing a Financisto export");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Your balances and charts will show up here once you add some transactions.
                You can add transactions " (new_transaction_link) " or
                by " (import_transaction_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn summary_card(label: &str, value: &str) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class="mt-1 text-2xl font-semibold tabular-nums" { (value) }
        }
    }
}

fn account_balances_table(balances: &[AccountBalance], summary: &DashboardSummary) -> Markup {
    html! {
        section class="w-full overflow-x-auto rounded-lg shadow"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                        th scope="col" class="px-6 py-3 text-right" { "Balance" }
                        th scope="col" class="px-6 py-3 text-right"
                        { "In " (summary.base_currency) }
                    }
                }

                tbody
                {
                    @for account in balances {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                            { (account.name) }
                            td class="px-6 py-4 text-right tabular-nums"
                            { (format_currency(account.balance, &account.currency)) }
                            td class="px-6 py-4 text-right tabular-nums"
                            { (format_currency(account.base_balance, &summary.base_currency)) }
                        }
                    }
                }
            }
        }
    }
}

fn budget_section(this_month: YearMonth, budget: Option<&BudgetProgress>) -> Markup {
    html! {
        section class={ "w-full " (CARD_STYLE) } id="budget-progress"
        {
            h3 class="mb-2 text-lg font-semibold" { "Budget for " (this_month) }

            @if let Some(progress) = budget {
                (budget_progress_bar(progress))
            } @else {
                p class="text-sm"
                {
                    "No budget set for this month. "
                    a href=(endpoints::NEW_BUDGET_VIEW) class=(LINK_STYLE) { "Set one" }
                }
            }
        }
    }
}

fn dashboard_view(nav_bar: NavBar, this_month: YearMonth, data: &DashboardData) -> Markup {
    let nav_bar = nav_bar.into_html();
    let summary = &data.summary;

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center gap-4 px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            section id="summary" class="w-full grid grid-cols-2 lg:grid-cols-4 gap-4"
            {
                (summary_card(
                    "Total balance",
                    &format_currency(summary.total_balance, &summary.base_currency),
                ))
                (summary_card("Transactions", &summary.total_transactions.to_string()))
                (summary_card("Accounts", &summary.total_accounts.to_string()))
                (summary_card("Categories", &summary.total_categories.to_string()))
            }

            (budget_section(this_month, data.budget.as_ref()))

            (account_balances_table(&data.account_balances, summary))

            (charts_view(&data.charts))
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(&data.charts),
    ];

    base("Dashboard", &scripts, &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::datetime;

    use crate::{
        account::{NewAccount, create_account},
        dashboard::{DashboardState, get_dashboard_page, get_dashboard_summary_json},
        db::initialize,
        money::CurrencyCode,
        name::Name,
        test_utils::{assert_valid_html, parse_html_document, response_json},
        transaction::{NewTransaction, create_transaction},
    };

    fn get_state(with_transaction: bool) -> DashboardState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        if with_transaction {
            create_account(
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
            create_transaction(
                NewTransaction::new(1, datetime!(2025-01-10 12:00), 1234.5),
                &connection,
            )
            .unwrap();
        }

        DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    #[tokio::test]
    async fn empty_dashboard_prompts_for_transactions() {
        let response = get_dashboard_page(State(get_state(false))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Nothing here yet"));
    }

    #[tokio::test]
    async fn dashboard_shows_summary_and_charts() {
        let response = get_dashboard_page(State(get_state(true))).await.unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("£1,234.50"));
        assert!(text.contains("No budget set for this month"));
        for id in ["income-expenses-chart", "category-expenses-chart", "balance-chart"] {
            let selector = Selector::parse(&format!("#{id}")).unwrap();
            assert!(html.select(&selector).next().is_some(), "missing chart {id}");
        }
    }

    #[tokio::test]
    async fn summary_json() {
        let response = get_dashboard_summary_json(State(get_state(true))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["total_transactions"], 1);
        assert_eq!(json["total_accounts"], 1);
        assert_eq!(json["base_currency"], "GBP");
        assert_eq!(json["total_balance"], 1234.5);
    }
}
