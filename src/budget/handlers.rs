//! Budget pages and endpoints.

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
    alert::{ALERT_CONTAINER_ID, Alert},
    budget::{
        Budget, BudgetId, BudgetProgress, NewBudget, YearMonth, create_budget, delete_budget,
        get_budget, get_budget_progress, update_budget,
    },
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, base, edit_delete_action_links,
        format_currency,
    },
    money::CurrencyCode,
    navigation::NavBar,
    timezone::get_local_now,
};

#[derive(Debug, Clone)]
pub struct BudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetForm {
    /// The value of a `month` input, e.g. "2025-03".
    pub year_month: String,
    pub amount: f64,
    pub currency: Option<String>,
}

impl BudgetForm {
    pub fn validate(self) -> Result<NewBudget, Error> {
        let currency = match self.currency.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(code) => Some(CurrencyCode::new(code)?),
        };

        Ok(NewBudget {
            year_month: self.year_month.parse()?,
            amount: self.amount,
            currency,
        })
    }
}

pub async fn get_budgets_page(State(state): State<BudgetState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budgets = get_budget_progress(&connection)
        .inspect_err(|error| tracing::error!("could not get budgets: {error}"))?;

    Ok(budgets_view(&budgets).into_response())
}

pub async fn get_budgets_json(State(state): State<BudgetState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_budget_progress(&connection) {
        Ok(budgets) => Json(budgets).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

pub async fn get_new_budget_page(State(state): State<BudgetState>) -> Result<Response, Error> {
    let this_month = YearMonth::of(get_local_now(&state.local_timezone)?.date());
    let form = budget_form_view(
        endpoints::BUDGETS_API,
        "hx-post",
        None,
        &this_month.to_string(),
    );

    Ok(budget_form_page("New Budget", form).into_response())
}

pub async fn get_edit_budget_page(
    Path(budget_id): Path<BudgetId>,
    State(state): State<BudgetState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = get_budget(budget_id, &connection)?;
    let form = budget_form_view(
        &format_endpoint(endpoints::BUDGET, budget_id),
        "hx-put",
        Some(&budget),
        &budget.year_month.to_string(),
    );

    Ok(budget_form_page("Edit Budget", form).into_response())
}

pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let budget = match form.validate() {
        Ok(budget) => budget,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_budget(&budget, &connection) {
        Ok(_) => redirect_to_budgets(),
        Err(error) => {
            tracing::warn!("Could not create budget: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn update_budget_endpoint(
    Path(budget_id): Path<BudgetId>,
    State(state): State<BudgetState>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let budget = match form.validate() {
        Ok(budget) => budget,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_budget(budget_id, &budget, &connection) {
        Ok(()) => redirect_to_budgets(),
        Err(error) => {
            tracing::warn!("Could not update budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}

pub async fn delete_budget_endpoint(
    Path(budget_id): Path<BudgetId>,
    State(state): State<BudgetState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget(budget_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Budget deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn redirect_to_budgets() -> Response {
    (
        HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A bar showing how much of a budget has been spent, red once it is exceeded.
pub fn budget_progress_bar(progress: &BudgetProgress) -> Markup {
    let bar_colour = if progress.is_over() {
        "bg-red-500"
    } else {
        "bg-green-500"
    };
    let currency = &progress.budget.currency;

    html! {
        div class="space-y-1"
        {
            div class="flex justify-between text-sm"
            {
                span { (format_currency(progress.spent, currency)) " spent" }
                span { "of " (format_currency(progress.budget.amount, currency)) }
            }

            div class="w-full h-2 rounded bg-gray-200 dark:bg-gray-700"
            {
                div
                    class={ "h-2 rounded " (bar_colour) }
                    style={ "width: " (format!("{:.0}", progress.percent_used())) "%" }
                {}
            }

            p class="text-xs text-gray-500 dark:text-gray-400"
            {
                @if progress.is_over() {
                    (format_currency(-progress.remaining, currency)) " over budget"
                } @else {
                    (format_currency(progress.remaining, currency)) " left"
                }
            }
        }
    }
}

fn budget_form_view(
    endpoint: &str,
    hx_method: &str,
    budget: Option<&Budget>,
    year_month: &str,
) -> Markup {
    let amount = budget.map(|budget| format!("{:.2}", budget.amount));
    let currency = budget.map(|budget| budget.currency.to_string());
    let (hx_post, hx_put, submit_text) = if hx_method == "hx-put" {
        (None, Some(endpoint), "Save Changes")
    } else {
        (Some(endpoint), None, "Create Budget")
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error={ "#" (ALERT_CONTAINER_ID) }
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="year_month" class=(FORM_LABEL_STYLE) { "Month" }

                input
                    id="year_month"
                    type="month"
                    name="year_month"
                    value=(year_month)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    step="0.01"
                    min="0.01"
                    value=[amount]
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }

                input
                    id="currency"
                    type="text"
                    name="currency"
                    maxlength="3"
                    placeholder="Base currency"
                    value=[currency]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}

fn budget_form_page(title: &str, form: Markup) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { (title) }
            (form)
        }
    };

    base(title, &[], &content)
}

fn budgets_view(budgets: &[BudgetProgress]) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-3xl lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Budgets" }

                    a href=(endpoints::NEW_BUDGET_VIEW) class=(LINK_STYLE) { "Add Budget" }
                }

                ul class="space-y-4"
                {
                    @for progress in budgets {
                        li class=(CARD_STYLE) data-budget-card="true"
                        {
                            h2 class="mb-2 text-sm font-semibold text-gray-900 dark:text-white"
                            { (progress.budget.year_month) }

                            (budget_progress_bar(progress))

                            div class="mt-2 text-sm"
                            {
                                (edit_delete_action_links(
                                    &format_endpoint(endpoints::EDIT_BUDGET_VIEW, progress.budget.id),
                                    &format_endpoint(endpoints::BUDGET, progress.budget.id),
                                    &format!(
                                        "Are you sure you want to delete the budget for {}?",
                                        progress.budget.year_month
                                    ),
                                    "closest [data-budget-card='true']",
                                    "outerHTML",
                                ))
                            }
                        }
                    }

                    @if budgets.is_empty() {
                        li class="text-center text-sm text-gray-500 dark:text-gray-400"
                        { "No budgets yet." }
                    }
                }
            }
        }
    };

    base("Budgets", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        Error,
        budget::{
            BudgetForm, BudgetState, create_budget_endpoint, delete_budget_endpoint,
            get_budget, get_budgets_json, get_budgets_page, get_edit_budget_page,
            get_new_budget_page, update_budget_endpoint,
        },
        db::initialize,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input, assert_form_input_with_value, assert_hx_endpoint,
            assert_hx_redirect, assert_valid_html, must_get_form, parse_html_document,
            response_json,
        },
    };

    fn get_state() -> BudgetState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        BudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn form(query: &str) -> BudgetForm {
        serde_html_form::from_str(query).unwrap()
    }

    #[test]
    fn form_validation() {
        let budget = form("year_month=2025-03&amount=250&currency=").validate().unwrap();
        assert_eq!(budget.currency, None);
        assert_eq!(budget.year_month.to_string(), "2025-03");

        assert_eq!(
            form("year_month=March&amount=250").validate(),
            Err(Error::InvalidYearMonth("March".to_owned()))
        );
        assert_eq!(
            form("year_month=2025-03&amount=250&currency=pounds").validate(),
            Err(Error::InvalidCurrencyCode("pounds".to_owned()))
        );
    }

    #[tokio::test]
    async fn new_page_posts_to_api() {
        let response = get_new_budget_page(State(get_state())).await.unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::BUDGETS_API, "hx-post");
        assert_form_input(&form, "year_month", "month");
        assert_form_input(&form, "amount", "number");
    }

    #[tokio::test]
    async fn create_edit_and_delete_budget() {
        let state = get_state();

        let response =
            create_budget_endpoint(State(state.clone()), Form(form("year_month=2025-03&amount=300")))
                .await;
        assert_hx_redirect(&response, endpoints::BUDGETS_VIEW);

        let html = parse_html_document(
            get_edit_budget_page(Path(1), State(state.clone()))
                .await
                .unwrap(),
        )
        .await;
        let edit_form = must_get_form(&html);
        assert_hx_endpoint(&edit_form, &format_endpoint(endpoints::BUDGET, 1), "hx-put");
        assert_form_input_with_value(&edit_form, "amount", "number", "300.00");

        let response = update_budget_endpoint(
            Path(1),
            State(state.clone()),
            Form(form("year_month=2025-04&amount=350&currency=EUR")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let budget = get_budget(1, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(budget.year_month.to_string(), "2025-04");
        assert_eq!(budget.currency.to_string(), "EUR");

        let json = response_json(get_budgets_json(State(state.clone())).await).await;
        assert_eq!(json[0]["year_month"], "2025-04");
        assert_eq!(json[0]["spent"], 0.0);
        assert_eq!(json[0]["remaining"], 350.0);

        let response = delete_budget_endpoint(Path(1), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = delete_budget_endpoint(Path(1), State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_month_is_bad_request() {
        let state = get_state();
        create_budget_endpoint(State(state.clone()), Form(form("year_month=2025-03&amount=1"))).await;

        let response =
            create_budget_endpoint(State(state.clone()), Form(form("year_month=2025-03&amount=2")))
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let html = parse_html_document(get_budgets_page(State(state)).await.unwrap()).await;
        let cards = html
            .select(&Selector::parse("[data-budget-card]").unwrap())
            .count();
        assert_eq!(cards, 1);
    }
}
