//! Export all transactions in the same CSV layout the importer reads.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    csv_import::financisto::FINANCISTO_COLUMNS,
    money::CurrencyCode,
    timezone::get_local_now,
    transaction::{TransactionListing, get_all_transaction_listings},
};

#[derive(Debug, Clone)]
pub struct ExportState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Field order must match the columns the importer expects.
#[derive(Serialize)]
struct ExportRecord<'a> {
    date: String,
    time: String,
    account: &'a str,
    amount: f64,
    currency: &'a CurrencyCode,
    category: Option<&'a str>,
    parent: Option<&'a str>,
    payee: Option<&'a str>,
    location: Option<&'a str>,
    project: Option<&'a str>,
    note: &'a str,
}

impl<'a> From<&'a TransactionListing> for ExportRecord<'a> {
    fn from(listing: &'a TransactionListing) -> Self {
        let transaction = &listing.transaction;
        let time = transaction.date.time();

        Self {
            date: transaction.date.date().to_string(),
            time: format!(
                "{:02}:{:02}:{:02}",
                time.hour(),
                time.minute(),
                time.second()
            ),
            account: &listing.account_name,
            amount: transaction.amount,
            currency: &transaction.currency,
            category: listing.category_name.as_deref(),
            parent: listing.parent_category_name.as_deref(),
            payee: listing.payee_name.as_deref(),
            location: listing.location_name.as_deref(),
            project: listing.project_name.as_deref(),
            note: &transaction.note,
        }
    }
}

/// Write every transaction as CSV, oldest first.
pub fn export_transactions_csv(connection: &Connection) -> Result<String, Error> {
    let listings = get_all_transaction_listings(connection)?;
    let mut writer = csv::Writer::from_writer(Vec::new());

    for listing in &listings {
        writer
            .serialize(ExportRecord::from(listing))
            .map_err(|error| Error::ExportError(error.to_string()))?;
    }

    // Without any records the header row is never written.
    if listings.is_empty() {
        writer
            .write_record(FINANCISTO_COLUMNS)
            .map_err(|error| Error::ExportError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::ExportError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::ExportError(error.to_string()))
}

/// Route handler that downloads all transactions as a CSV file.
pub async fn export_transactions_endpoint(
    State(state): State<ExportState>,
) -> Result<Response, Error> {
    let today = get_local_now(&state.local_timezone)?.date();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let csv = export_transactions_csv(&connection)
        .inspect_err(|error| tracing::error!("could not export transactions: {error}"))?;

    let file_name = format!(
        "delfin-transactions-{}{:02}{:02}.csv",
        today.year(),
        u8::from(today.month()),
        today.day()
    );

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{body::to_bytes, extract::State, http::StatusCode};
    use rusqlite::Connection;

    use crate::{
        csv_import::{
            ImportSummary,
            export::{ExportState, export_transactions_csv, export_transactions_endpoint},
            import_financisto_csv,
        },
        db::initialize,
        test_utils::{assert_content_type, get_header},
    };

    const IMPORTED: &str = "date,time,account,amount,currency,category,parent,payee,location,project,note\n\
        2025-03-02,18:45:10,Current,-20,GBP,Restaurants,Food,Pizza Place,Town,Birthday,\"dinner, with friends\"\n\
        2025-03-01,07:05:00,Current,1000,GBP,Salary,,,,,\n";

    fn get_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn empty_export_has_header_only() {
        let connection = get_connection();

        let csv = export_transactions_csv(&connection).unwrap();

        assert_eq!(
            csv,
            "date,time,account,amount,currency,category,parent,payee,location,project,note\n"
        );
    }

    #[test]
    fn exports_oldest_first_in_import_layout() {
        let connection = get_connection();
        import_financisto_csv(&[IMPORTED], &connection).unwrap();

        let csv = export_transactions_csv(&connection).unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2025-03-01,07:05:00,Current,1000.0,GBP,Salary,,,,,");
        assert_eq!(
            lines[2],
            "2025-03-02,18:45:10,Current,-20.0,GBP,Restaurants,Food,Pizza Place,Town,Birthday,\"dinner, with friends\""
        );
    }

    #[test]
    fn exported_file_can_be_imported() {
        let connection = get_connection();
        import_financisto_csv(&[IMPORTED], &connection).unwrap();
        let csv = export_transactions_csv(&connection).unwrap();

        let summary = import_financisto_csv(&[csv], &get_connection()).unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                imported: 2,
                duplicates: 0,
                invalid: 0,
            }
        );
    }

    #[tokio::test]
    async fn endpoint_downloads_csv() {
        let connection = get_connection();
        import_financisto_csv(&[IMPORTED], &connection).unwrap();
        let state = ExportState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let response = export_transactions_endpoint(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/csv; charset=utf-8");
        let disposition = get_header(&response, "content-disposition");
        assert!(disposition.starts_with("attachment; filename=\"delfin-transactions-"));
        assert!(disposition.ends_with(".csv\""));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Pizza Place"));
    }
}
