//! Pages and endpoints for managing locations.

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
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links,
    },
    location::{
        Location, LocationId, create_location, delete_location, get_all_locations, get_location,
        update_location,
    },
    name::Name,
    navigation::NavBar,
};

/// The state needed for the location pages and endpoints.
#[derive(Debug, Clone)]
pub struct LocationState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LocationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationForm {
    pub name: String,
}

pub async fn get_locations_page(State(state): State<LocationState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let locations = get_all_locations(&connection)
        .inspect_err(|error| tracing::error!("could not get locations: {error}"))?;

    Ok(locations_view(&locations).into_response())
}

pub async fn get_locations_json(State(state): State<LocationState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_all_locations(&connection) {
        Ok(locations) => Json(locations).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

pub async fn get_new_location_page() -> Response {
    location_form_page(
        "New Location",
        endpoints::LOCATIONS_API,
        "hx-post",
        "",
        "Create Location",
    )
    .into_response()
}

pub async fn get_edit_location_page(
    Path(location_id): Path<LocationId>,
    State(state): State<LocationState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let location = get_location(location_id, &connection)?;

    Ok(location_form_page(
        "Edit Location",
        &format_endpoint(endpoints::LOCATION, location_id),
        "hx-put",
        location.name.as_ref(),
        "Save Changes",
    )
    .into_response())
}

pub async fn create_location_endpoint(
    State(state): State<LocationState>,
    Form(form): Form<LocationForm>,
) -> Response {
    save_location(None, &state, form)
}

pub async fn update_location_endpoint(
    Path(location_id): Path<LocationId>,
    State(state): State<LocationState>,
    Form(form): Form<LocationForm>,
) -> Response {
    save_location(Some(location_id), &state, form)
}

fn save_location(
    location_id: Option<LocationId>,
    state: &LocationState,
    form: LocationForm,
) -> Response {
    let name = match Name::new(&form.name, "Location") {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = match location_id {
        Some(id) => update_location(id, &name, &connection),
        None => create_location(&name, &connection).map(|_| ()),
    };

    match result {
        Ok(()) => (
            HxRedirect(endpoints::LOCATIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::warn!("Could not save location \"{name}\": {error}");
            error.into_alert_response()
        }
    }
}

pub async fn delete_location_endpoint(
    Path(location_id): Path<LocationId>,
    State(state): State<LocationState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_location(location_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Location deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete location {location_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn location_form_page(
    title: &str,
    endpoint: &str,
    hx_method: &str,
    name: &str,
    submit_text: &str,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::LOCATIONS_VIEW).into_html();
    let (hx_post, hx_put) = if hx_method == "hx-put" {
        (None, Some(endpoint))
    } else {
        (Some(endpoint), None)
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { (title) }

            form
                hx-post=[hx_post]
                hx-put=[hx_put]
                hx-target-error={ "#" (ALERT_CONTAINER_ID) }
                class="w-full space-y-4 md:space-y-6"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                    input
                        id="name"
                        type="text"
                        name="name"
                        placeholder="City Centre"
                        value=(name)
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
            }
        }
    };

    base(title, &[], &content)
}

fn locations_view(locations: &[Location]) -> Markup {
    let nav_bar = NavBar::new(endpoints::LOCATIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-3xl lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Locations" }

                    a href=(endpoints::NEW_LOCATION_VIEW) class=(LINK_STYLE) { "Add Location" }
                }

                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for location in locations {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                th
                                    scope="row"
                                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                                {
                                    (location.name)
                                }

                                td class=(TABLE_CELL_STYLE)
                                {
                                    (edit_delete_action_links(
                                        &format_endpoint(endpoints::EDIT_LOCATION_VIEW, location.id),
                                        &format_endpoint(endpoints::LOCATION, location.id),
                                        &format!("Are you sure you want to delete the location '{}'?", location.name),
                                        "closest tr",
                                        "delete",
                                    ))
                                }
                            }
                        }

                        @if locations.is_empty() {
                            tr
                            {
                                td colspan="2" class="px-6 py-4 text-center" { "No locations yet." }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Locations", &[], &content)
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
        db::initialize,
        endpoints::{self, format_endpoint},
        location::{
            LocationForm, LocationState, create_location_endpoint, delete_location_endpoint,
            get_edit_location_page, get_locations_json, get_locations_page,
            update_location_endpoint,
        },
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_document, response_json,
        },
    };

    fn get_state() -> LocationState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        LocationState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn form(name: &str) -> Form<LocationForm> {
        Form(LocationForm {
            name: name.to_owned(),
        })
    }

    #[tokio::test]
    async fn create_list_edit_delete() {
        let state = get_state();

        let response = create_location_endpoint(State(state.clone()), form("Leeds")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::LOCATIONS_VIEW);

        let response = get_locations_page(State(state.clone())).await.unwrap();
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let names: Vec<String> = html
            .select(&Selector::parse("tbody th").unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect();
        assert_eq!(names, ["Leeds"]);

        let response = get_edit_location_page(Path(1), State(state.clone()))
            .await
            .unwrap();
        let html = parse_html_document(response).await;
        let edit_form = must_get_form(&html);
        assert_hx_endpoint(
            &edit_form,
            &format_endpoint(endpoints::LOCATION, 1),
            "hx-put",
        );
        assert_form_input_with_value(&edit_form, "name", "text", "Leeds");

        let response = update_location_endpoint(Path(1), State(state.clone()), form("York")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let json = response_json(get_locations_json(State(state.clone())).await).await;
        assert_eq!(json[0]["name"], "York");

        let response = delete_location_endpoint(Path(1), State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let response = create_location_endpoint(State(get_state()), form("  ")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
