use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Multipart, State, multipart::Field},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    csv_import::{alert::import_summary_alert, financisto::import_financisto_csv},
};

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler for importing transactions from Financisto CSV files.
///
/// Every uploaded file is read before anything is written, and all files are
/// imported in a single database transaction.
pub async fn import_transactions_endpoint(
    State(state): State<ImportState>,
    mut multipart: Multipart,
) -> Result<Response, Response> {
    let start_time = std::time::Instant::now();
    let mut files = Vec::new();

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|error| {
                tracing::error!("Could not read multipart form: {error}");
                Error::MultipartError(error.body_text()).into_alert_response()
            })?;

        let Some(field) = field else {
            break;
        };

        let csv_data = parse_multipart_field(field)
            .await
            .map_err(Error::into_alert_response)?;

        files.push(csv_data);
    }

    if files.is_empty() {
        return Err(
            Error::MultipartError("No files were uploaded.".to_owned()).into_alert_response(),
        );
    }

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError.into_alert_response()
    })?;

    let summary = import_financisto_csv(&files, &connection)
        .inspect_err(|error| tracing::error!("Failed to import transactions: {error}"))
        .map_err(Error::into_alert_response)?;

    let alert = import_summary_alert(&summary, start_time.elapsed());

    Ok((StatusCode::CREATED, alert.into_oob_html()).into_response())
}

async fn parse_multipart_field(field: Field<'_>) -> Result<String, Error> {
    if field.content_type() != Some("text/csv") {
        return Err(Error::NotCSV);
    }

    let file_name = match field.file_name() {
        Some(file_name) => file_name.to_owned(),
        None => {
            tracing::error!("Could not get file name from multipart form field: {field:#?}");
            return Err(Error::MultipartError(
                "Could not get file name from multipart form field".to_owned(),
            ));
        }
    };

    let data = match field.text().await {
        Ok(data) => data,
        Err(error) => {
            tracing::error!("Could not read data from multipart form field: {error}");
            return Err(Error::MultipartError(
                "Could not read data from multipart form field.".to_owned(),
            ));
        }
    };

    tracing::debug!("Received file '{file_name}' that is {} bytes", data.len());

    Ok(data)
}
