//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{
        Category, create_category,
        form::{CategoryForm, category_form_view},
        get_all_categories,
    },
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for the category pages and endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page(State(state): State<CategoryState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let parents: Vec<Category> = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("could not get categories: {error}"))?
        .into_iter()
        .filter(|category| category.parent_id.is_none())
        .collect();

    Ok(new_category_view(&parents).into_response())
}

/// Handle category creation form submission.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Form(form): Form<CategoryForm>,
) -> Response {
    let new_category = match form.validate() {
        Ok(new_category) => new_category,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(&new_category, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::warn!("Could not create category {new_category:?}: {error}");
            error.into_alert_response()
        }
    }
}

fn new_category_view(parents: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let form = category_form_view(
        endpoints::CATEGORIES_API,
        "hx-post",
        None,
        parents,
        "Create Category",
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { "New Category" }
            (form)
        }
    };

    base("Create Category", &[], &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        category::{
            CategoryKind, create::CategoryState, create_category_endpoint, form::CategoryForm,
            get_all_categories, get_new_category_page,
        },
        db::initialize,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_document,
        },
    };

    fn get_state() -> CategoryState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        CategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn render_page() {
        let state = get_state();
        create_category_endpoint(
            State(state.clone()),
            Form(CategoryForm {
                name: "Food".to_owned(),
                parent_id: None,
                kind: None,
            }),
        )
        .await;

        let response = get_new_category_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::CATEGORIES_API, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_submit_button(&form);
        let options: Vec<String> = form
            .select(&Selector::parse("select[name=parent_id] option").unwrap())
            .map(|option| option.text().collect())
            .collect();
        assert_eq!(options, ["None (top-level)", "Food"]);
    }

    #[tokio::test]
    async fn can_create_category() {
        let state = get_state();
        let form = CategoryForm {
            name: "Salary".to_owned(),
            parent_id: None,
            kind: Some(CategoryKind::Income),
        };

        let response = create_category_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let categories = get_all_categories(&state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].kind, Some(CategoryKind::Income));
    }

    #[tokio::test]
    async fn empty_name_returns_bad_request() {
        let form = CategoryForm {
            name: " ".to_owned(),
            parent_id: None,
            kind: None,
        };

        let response = create_category_endpoint(State(get_state()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
