//! Lists categories as a two-level tree.

use std::collections::HashMap;

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    category::{Category, CategoryId, create::CategoryState, get_all_categories},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
};

struct CategoryRow {
    category: Category,
    parent_name: Option<String>,
    edit_url: String,
    delete_url: String,
    confirm_message: String,
}

/// Render the categories page.
pub async fn get_categories_page(State(state): State<CategoryState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

    let names: HashMap<CategoryId, String> = categories
        .iter()
        .map(|category| (category.id, category.name.to_string()))
        .collect();

    let rows: Vec<CategoryRow> = categories
        .into_iter()
        .map(|category| CategoryRow {
            parent_name: category
                .parent_id
                .and_then(|parent_id| names.get(&parent_id).cloned()),
            edit_url: format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id),
            delete_url: format_endpoint(endpoints::CATEGORY, category.id),
            confirm_message: format!(
                "Are you sure you want to delete the category '{}'? \
                Its transactions will become uncategorised.",
                category.name
            ),
            category,
        })
        .collect();

    Ok(categories_view(&rows).into_response())
}

/// Returns every category as JSON in tree order.
pub async fn get_categories_json(State(state): State<CategoryState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_all_categories(&connection) {
        Ok(categories) => Json(categories).into_response(),
        Err(error) => {
            tracing::error!("could not get categories: {error}");
            error.into_alert_response()
        }
    }
}

fn categories_view(rows: &[CategoryRow]) -> Markup {
    let new_category_url = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let kind_badge = |row: &CategoryRow| {
        html! {
            @if let Some(kind) = row.category.kind {
                span class=(BADGE_STYLE) { (kind.as_str()) }
            }
        }
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(new_category_url) class=(LINK_STYLE) { "Add Category" }
                }

                ul class="lg:hidden space-y-4"
                {
                    @for row in rows {
                        li class=(CARD_STYLE) data-category-card="true"
                        {
                            div class="flex items-center justify-between gap-3"
                            {
                                div class="text-sm font-semibold text-gray-900 dark:text-white"
                                {
                                    @if let Some(parent_name) = &row.parent_name {
                                        span class="text-gray-500 dark:text-gray-400"
                                        { (parent_name) " › " }
                                    }
                                    (row.category.name)
                                }
                                (kind_badge(row))
                            }

                            div class="mt-2 flex items-center gap-4 text-sm"
                            {
                                (edit_delete_action_links(
                                    &row.edit_url,
                                    &row.delete_url,
                                    &row.confirm_message,
                                    "closest [data-category-card='true']",
                                    "outerHTML",
                                ))
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
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
                                        class={
                                            "py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white "
                                            @if row.parent_name.is_some() { "pl-12 pr-6" } @else { "px-6" }
                                        }
                                    {
                                        (row.category.name)
                                    }

                                    td class=(TABLE_CELL_STYLE) { (kind_badge(row)) }

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
                            }

                            @if rows.is_empty() {
                                tr
                                {
                                    td colspan="3" class="px-6 py-4 text-center"
                                    {
                                        "No categories found. Create a category "
                                        a href=(new_category_url) class=(LINK_STYLE) { "here" }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Categories", &[], &content)
}
