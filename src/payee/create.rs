//! Payee creation page and endpoint.

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
    AppState, Error, endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    payee::{
        create_payee,
        form::{PayeeForm, payee_form_view},
    },
};

/// The state needed for the payee pages and endpoints.
#[derive(Debug, Clone)]
pub struct PayeeState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PayeeState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn get_new_payee_page() -> Response {
    new_payee_view().into_response()
}

pub async fn create_payee_endpoint(
    State(state): State<PayeeState>,
    Form(form): Form<PayeeForm>,
) -> Response {
    let name = match form.validate() {
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

    match create_payee(&name, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::PAYEES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::warn!("Could not create payee: {error}");
            error.into_alert_response()
        }
    }
}

fn new_payee_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_PAYEE_VIEW).into_html();
    let form = payee_form_view(endpoints::PAYEES_API, "hx-post", "", "Create Payee");

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { "New Payee" }
            (form)
        }
    };

    base("New Payee", &[], &content)
}
