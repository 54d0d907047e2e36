//! Lists payees with the details new transactions are prefilled with.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Error,
    endpoints::{self, format_endpoint},
    html::{
        CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
    payee::{PayeeId, PayeeState, get_all_payees},
};

/// A payee with the names of its most common category, location and project.
struct PayeeRow {
    id: PayeeId,
    name: String,
    category: Option<String>,
    location: Option<String>,
    project: Option<String>,
}

fn get_payee_rows(connection: &Connection) -> Result<Vec<PayeeRow>, Error> {
    connection
        .prepare(
            "SELECT p.id, p.name, c.name, l.name, pr.name
            FROM payee p
            LEFT JOIN category c ON p.most_common_category_id = c.id
            LEFT JOIN location l ON p.most_common_location_id = l.id
            LEFT JOIN project pr ON p.most_common_project_id = pr.id
            ORDER BY p.name ASC",
        )?
        .query_map([], |row| {
            Ok(PayeeRow {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                location: row.get(3)?,
                project: row.get(4)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

pub async fn get_payees_page(State(state): State<PayeeState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rows = get_payee_rows(&connection)
        .inspect_err(|error| tracing::error!("could not get payees: {error}"))?;

    Ok(payees_view(&rows).into_response())
}

pub async fn get_payees_json(State(state): State<PayeeState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_all_payees(&connection) {
        Ok(payees) => Json(payees).into_response(),
        Err(error) => {
            tracing::error!("could not get payees: {error}");
            error.into_alert_response()
        }
    }
}

fn payees_view(rows: &[PayeeRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::PAYEES_VIEW).into_html();
    let dash = || "-".to_owned();

    let actions = |row: &PayeeRow, hx_target: &str, hx_swap: &str| {
        edit_delete_action_links(
            &format_endpoint(endpoints::EDIT_PAYEE_VIEW, row.id),
            &format_endpoint(endpoints::PAYEE, row.id),
            &format!(
                "Are you sure you want to delete the payee '{}'? \
                Its transactions will keep their other details.",
                row.name
            ),
            hx_target,
            hx_swap,
        )
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Payees" }

                    a href=(endpoints::NEW_PAYEE_VIEW) class=(LINK_STYLE) { "Add Payee" }
                }

                ul class="lg:hidden space-y-4"
                {
                    @for row in rows {
                        li class=(CARD_STYLE) data-payee-card="true"
                        {
                            div class="text-sm font-semibold text-gray-900 dark:text-white"
                            { (row.name) }

                            @if let Some(category) = &row.category {
                                div class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                                { "Usually " (category) }
                            }

                            div class="mt-2 flex items-center gap-4 text-sm"
                            {
                                (actions(row, "closest [data-payee-card='true']", "outerHTML"))
                            }
                        }
                    }
                }

                section class="hidden lg:block w-full overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Usual Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Usual Location" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Usual Project" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    th
                                        scope="row"
                                        class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                                    {
                                        (row.name)
                                    }
                                    td class=(TABLE_CELL_STYLE) { (row.category.clone().unwrap_or_else(dash)) }
                                    td class=(TABLE_CELL_STYLE) { (row.location.clone().unwrap_or_else(dash)) }
                                    td class=(TABLE_CELL_STYLE) { (row.project.clone().unwrap_or_else(dash)) }
                                    td class=(TABLE_CELL_STYLE) { (actions(row, "closest tr", "delete")) }
                                }
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td colspan="5" class="px-6 py-4 text-center"
                                    {
                                        "No payees yet. Payees are also created when importing transactions."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Payees", &[], &content)
}
