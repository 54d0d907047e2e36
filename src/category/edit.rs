//! Category editing page and endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    Error,
    category::{
        Category, CategoryId,
        create::CategoryState,
        form::{CategoryForm, category_form_view},
        get_all_categories, get_category, update_category,
    },
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// Render the category editing page.
pub async fn get_edit_category_page(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = get_category(category_id, &connection)?;
    let parents: Vec<Category> = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?
        .into_iter()
        .filter(|parent| parent.parent_id.is_none() && parent.id != category_id)
        .collect();

    Ok(edit_category_view(&category, &parents).into_response())
}

/// Handle category update form submission.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<CategoryState>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let category = match form.validate() {
        Ok(category) => category,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_category(category_id, &category, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::warn!("Could not update category {category_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn edit_category_view(category: &Category, parents: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();
    let update_endpoint = format_endpoint(endpoints::CATEGORY, category.id);
    let form = category_form_view(
        &update_endpoint,
        "hx-put",
        Some(category),
        parents,
        "Save Changes",
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { "Edit Category" }
            (form)
        }
    };

    base("Edit Category", &[], &content)
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

    use crate::{
        category::{
            NewCategory, create::CategoryState, create_category, form::CategoryForm, get_category,
            get_edit_category_page, update_category_endpoint,
        },
        db::initialize,
        endpoints::{self, format_endpoint},
        name::Name,
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_valid_html, must_get_form,
            parse_html_document,
        },
    };

    fn get_state_with_categories() -> (CategoryState, i64, i64) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let food = create_category(
            &NewCategory {
                name: Name::new_unchecked("Food"),
                parent_id: None,
                kind: None,
            },
            &connection,
        )
        .unwrap();
        let snacks = create_category(
            &NewCategory {
                name: Name::new_unchecked("Snacks"),
                parent_id: None,
                kind: None,
            },
            &connection,
        )
        .unwrap();

        (
            CategoryState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            food.id,
            snacks.id,
        )
    }

    #[tokio::test]
    async fn render_page() {
        let (state, food_id, _) = get_state_with_categories();

        let response = get_edit_category_page(Path(food_id), State(state))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::CATEGORY, food_id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "name", "text", "Food");
    }

    #[tokio::test]
    async fn can_move_category_under_parent() {
        let (state, food_id, snacks_id) = get_state_with_categories();
        let form = CategoryForm {
            name: "Snacks".to_owned(),
            parent_id: Some(food_id),
            kind: None,
        };

        let response =
            update_category_endpoint(Path(snacks_id), State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let snacks = get_category(snacks_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(snacks.parent_id, Some(food_id));
    }

    #[tokio::test]
    async fn own_parent_returns_bad_request() {
        let (state, food_id, _) = get_state_with_categories();
        let form = CategoryForm {
            name: "Food".to_owned(),
            parent_id: Some(food_id),
            kind: None,
        };

        let response = update_category_endpoint(Path(food_id), State(state), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
