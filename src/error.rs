//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert,
    error_page::{InternalServerError, NotFoundError},
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// A query referenced a row (account, category, payee, etc.) that does not exist.
    #[error("a referenced row does not exist")]
    InvalidForeignKey,

    /// An empty string was used where a name is required.
    ///
    /// The string is the kind of thing being named, e.g. "Account".
    #[error("{0} name cannot be empty")]
    EmptyName(&'static str),

    /// A name that must be unique is already in use.
    ///
    /// The first string is the kind of thing being named, the second the name.
    #[error("the {0} \"{1}\" already exists")]
    DuplicateName(&'static str, String),

    /// The string is not a three letter currency code such as "GBP".
    #[error("\"{0}\" is not a valid currency code")]
    InvalidCurrencyCode(String),

    /// An amount that must be positive was zero or negative.
    #[error("the amount must be greater than zero")]
    NonPositiveAmount,

    /// A date-time string could not be parsed.
    #[error("\"{0}\" is not a valid date and time")]
    InvalidDateTime(String),

    /// A month string was not in the format YYYY-MM.
    #[error("\"{0}\" is not a valid month, expected the format YYYY-MM")]
    InvalidYearMonth(String),

    /// The chosen parent would create a category tree deeper than two levels,
    /// or a category would be its own parent.
    #[error("invalid parent category: {0}")]
    InvalidCategoryParent(String),

    /// An account cannot be deleted while transactions still refer to it.
    #[error("the account still has {0} transaction(s)")]
    AccountHasTransactions(u32),

    /// Both sides of a transfer refer to the same account.
    #[error("a transfer needs two different accounts")]
    SameTransferAccounts,

    /// The specified import ID already exists in the database.
    ///
    /// When importing transactions from a CSV file, an import ID is used to
    /// uniquely identify each transaction so that the same row is never
    /// imported twice.
    #[error("the import ID already exists in the database")]
    DuplicateImportId,

    /// The multipart form could not be parsed as a list of CSV files.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("File is not a CSV")]
    NotCSV,

    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The exchange rate source could not be reached or returned an error status.
    #[error("could not fetch exchange rates: {0}")]
    ExchangeRateFetchError(String),

    /// The exchange rate source returned a document that could not be parsed.
    #[error("could not parse exchange rates: {0}")]
    ExchangeRateParseError(String),

    /// Writing a copy of the database failed.
    #[error("could not back up the database: {0}")]
    BackupError(String),

    /// The transactions could not be written out as CSV.
    #[error("could not export transactions: {0}")]
    ExportError(String),

    /// Tried to update a row that does not exist. The string names the table.
    #[error("tried to update a(n) {0} that is not in the database")]
    UpdateMissing(&'static str),

    /// Tried to delete a row that does not exist. The string names the table.
    #[error("tried to delete a(n) {0} that is not in the database")]
    DeleteMissing(&'static str),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("transaction.import_id") =>
            {
                Error::DuplicateImportId
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 787 => {
                Error::InvalidForeignKey
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// Whether `error` is a UNIQUE constraint violation.
///
/// Callers use this to turn the violation into a [Error::DuplicateName] that
/// carries the offending name.
pub(crate) fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 2067
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::InvalidForeignKey => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid selection".to_owned(),
                    details: "One of the selected accounts, categories, payees, locations or \
                        projects no longer exists. Refresh the page and try again."
                        .to_owned(),
                },
            ),
            error @ (Error::EmptyName(_)
            | Error::InvalidCurrencyCode(_)
            | Error::NonPositiveAmount
            | Error::InvalidDateTime(_)
            | Error::InvalidYearMonth(_)
            | Error::InvalidCategoryParent(_)
            | Error::SameTransferAccounts) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid input".to_owned(),
                    details: capitalise(&error.to_string()),
                },
            ),
            Error::DuplicateName(kind, name) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: format!("Duplicate {kind} name"),
                    details: format!(
                        "The {kind} \"{name}\" already exists. Choose a different name, \
                        or edit the existing {kind}."
                    ),
                },
            ),
            Error::AccountHasTransactions(count) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not delete account".to_owned(),
                    details: format!(
                        "The account still has {count} transaction(s). \
                        Delete or move them to another account first."
                    ),
                },
            ),
            Error::NotCSV => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "File type must be CSV.".to_owned(),
                },
            ),
            Error::InvalidCSV(details) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Failed to parse CSV".to_owned(),
                    details,
                },
            ),
            Error::MultipartError(details) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not read the uploaded files".to_owned(),
                    details,
                },
            ),
            Error::ExchangeRateFetchError(details) | Error::ExchangeRateParseError(details) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "Could not update exchange rates".to_owned(),
                    details,
                },
            ),
            Error::BackupError(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Backup failed".to_owned(),
                    details,
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Not found".to_owned(),
                    details: "The requested item could not be found. \
                        Try refreshing the page."
                        .to_owned(),
                },
            ),
            Error::UpdateMissing(kind) => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: format!("Could not update {kind}"),
                    details: format!("The {kind} could not be found."),
                },
            ),
            Error::DeleteMissing(kind) => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: format!("Could not delete {kind}"),
                    details: format!(
                        "The {kind} could not be found. \
                        Try refreshing the page to see if it has already been deleted."
                    ),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
