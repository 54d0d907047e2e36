//! Payee editing page and endpoint.

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
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    payee::{
        Payee, PayeeId, PayeeState,
        form::{PayeeForm, payee_form_view},
        get_payee, update_payee,
    },
};

pub async fn get_edit_payee_page(
    Path(payee_id): Path<PayeeId>,
    State(state): State<PayeeState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let payee = get_payee(payee_id, &connection)?;

    Ok(edit_payee_view(&payee).into_response())
}

pub async fn update_payee_endpoint(
    Path(payee_id): Path<PayeeId>,
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

    match update_payee(payee_id, &name, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::PAYEES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::warn!("Could not update payee {payee_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn edit_payee_view(payee: &Payee) -> Markup {
    let nav_bar = NavBar::new(endpoints::PAYEES_VIEW).into_html();
    let update_endpoint = format_endpoint(endpoints::PAYEE, payee.id);
    let form = payee_form_view(
        &update_endpoint,
        "hx-put",
        payee.name.as_ref(),
        "Save Changes",
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="w-full mb-4 text-xl font-bold" { "Edit Payee" }
            (form)
        }
    };

    base("Edit Payee", &[], &content)
}
