//! Importing and exporting transactions as Financisto CSV files.

mod alert;
mod export;
mod financisto;
mod import_page;
mod import_transactions;

pub use export::{ExportState, export_transactions_csv, export_transactions_endpoint};
pub use financisto::{FINANCISTO_COLUMNS, ImportSummary, create_import_id, import_financisto_csv};
pub use import_page::get_import_page;
pub use import_transactions::{ImportState, import_transactions_endpoint};
