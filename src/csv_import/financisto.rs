//! Parses Financisto CSV exports and imports their transactions.

use rusqlite::Connection;
use serde::Deserialize;
use time::PrimitiveDateTime;

use crate::{
    Error,
    account::get_or_create_account,
    balance::recalculate_all_balances,
    category::get_or_create_category,
    datetime::parse_date_time,
    location::get_or_create_location,
    money::CurrencyCode,
    name::Name,
    payee::{get_or_create_payee, refresh_all_payee_statistics},
    project::get_or_create_project,
    transaction::{NewTransaction, insert_transaction},
};

/// The columns a Financisto export must have. Any others are ignored.
pub const FINANCISTO_COLUMNS: [&str; 11] = [
    "date", "time", "account", "amount", "currency", "category", "parent", "payee", "location",
    "project", "note",
];

/// How many rows of an import ended up where.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows written as new transactions.
    pub imported: usize,
    /// Rows that had already been imported.
    pub duplicates: usize,
    /// Rows that could not be parsed.
    pub invalid: usize,
}

#[derive(Debug, Deserialize)]
struct FinancistoRecord {
    date: String,
    time: String,
    account: String,
    amount: f64,
    currency: String,
    category: Option<String>,
    parent: Option<String>,
    payee: Option<String>,
    location: Option<String>,
    project: Option<String>,
    note: Option<String>,
}

/// A record with every field validated, ready to be written to the database.
#[derive(Debug)]
struct ParsedRecord {
    date: PrimitiveDateTime,
    account: Name,
    amount: f64,
    currency: CurrencyCode,
    category: Option<Name>,
    parent: Option<Name>,
    payee: Option<Name>,
    location: Option<Name>,
    project: Option<Name>,
    note: String,
}

impl TryFrom<FinancistoRecord> for ParsedRecord {
    type Error = Error;

    fn try_from(record: FinancistoRecord) -> Result<Self, Self::Error> {
        let date_time = format!("{} {}", record.date.trim(), record.time.trim());
        let date = parse_date_time(&date_time).ok_or(Error::InvalidDateTime(date_time))?;

        if !record.amount.is_finite() {
            return Err(Error::InvalidCSV(format!(
                "{} is not a valid amount",
                record.amount
            )));
        }

        Ok(Self {
            date,
            account: Name::new(&record.account, "account")?,
            amount: record.amount,
            currency: CurrencyCode::new(&record.currency)?,
            category: optional_name(record.category),
            parent: optional_name(record.parent),
            payee: optional_name(record.payee),
            location: optional_name(record.location),
            project: optional_name(record.project),
            note: record.note.unwrap_or_default(),
        })
    }
}

fn optional_name(value: Option<String>) -> Option<Name> {
    value.and_then(|value| Name::new(&value, "name").ok())
}

/// Hash a CSV record so that importing the same row twice can be detected.
pub fn create_import_id(csv_line: &str) -> i64 {
    let hash_128 = md5::compute(csv_line);
    let mut hash_64 = [0; 8];
    hash_64.copy_from_slice(&hash_128[0..8]);
    i64::from_le_bytes(hash_64)
}

/// Import the transactions from one or more Financisto CSV exports.
///
/// Accounts, categories, payees, locations and projects are created as they
/// are first seen. Rows that were already imported are skipped, as are rows
/// that cannot be parsed. Once every file is imported the cached balances
/// and payee statistics are rebuilt. Nothing is written if any step fails.
///
/// # Errors
/// Returns [Error::InvalidCSV] if a file is missing one of the
/// [FINANCISTO_COLUMNS], or an SQL error if the database could not be updated.
pub fn import_financisto_csv<S: AsRef<str>>(
    files: &[S],
    connection: &Connection,
) -> Result<ImportSummary, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let mut summary = ImportSummary::default();

    for text in files {
        import_records(text.as_ref(), &mut summary, &sql_transaction)?;
    }

    if summary.imported > 0 {
        recalculate_all_balances(&sql_transaction)?;
        refresh_all_payee_statistics(&sql_transaction)?;
    }

    sql_transaction.commit()?;

    Ok(summary)
}

fn import_records(
    text: &str,
    summary: &mut ImportSummary,
    connection: &Connection,
) -> Result<(), Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?
        .clone();

    if let Some(missing) = FINANCISTO_COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|header| header == **column))
    {
        return Err(Error::InvalidCSV(format!(
            "the column \"{missing}\" is missing, expected a Financisto export"
        )));
    }

    for (row, maybe_record) in reader.records().enumerate() {
        let parsed = maybe_record
            .map_err(|error| Error::InvalidCSV(error.to_string()))
            .and_then(|record| {
                let import_id = create_import_id(&record.iter().collect::<Vec<_>>().join(","));
                let parsed = record
                    .deserialize::<FinancistoRecord>(Some(&headers))
                    .map_err(|error| Error::InvalidCSV(error.to_string()))?;

                Ok((ParsedRecord::try_from(parsed)?, import_id))
            });

        let (record, import_id) = match parsed {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::debug!("skipping row {}: {error}", row + 1);
                summary.invalid += 1;
                continue;
            }
        };

        match insert_record(&record, import_id, connection) {
            Ok(()) => summary.imported += 1,
            Err(Error::DuplicateImportId) => summary.duplicates += 1,
            Err(error) => return Err(error),
        }
    }

    Ok(())
}

fn insert_record(
    record: &ParsedRecord,
    import_id: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let account_id = get_or_create_account(&record.account, &record.currency, connection)?;

    let category_id = match &record.category {
        Some(category) => Some(get_or_create_category(
            category,
            record.parent.as_ref(),
            connection,
        )?),
        None => None,
    };

    let transaction = NewTransaction {
        currency: Some(record.currency.clone()),
        note: record.note.clone(),
        category_id,
        payee_id: record
            .payee
            .as_ref()
            .map(|payee| get_or_create_payee(payee, connection))
            .transpose()?,
        location_id: record
            .location
            .as_ref()
            .map(|location| get_or_create_location(location, connection))
            .transpose()?,
        project_id: record
            .project
            .as_ref()
            .map(|project| get_or_create_project(project, connection))
            .transpose()?,
        ..NewTransaction::new(account_id, record.date, record.amount)
    };

    insert_transaction(&transaction, Some(import_id), connection).map(|_| ())
}
