//! Import result handling for generating appropriate alert messages.

use std::{sync::OnceLock, time::Duration};

use numfmt::{Formatter, Precision};

use crate::{alert::Alert, csv_import::financisto::ImportSummary};

/// Creates a success alert describing what happened to each row of an import.
pub fn import_summary_alert(summary: &ImportSummary, duration: Duration) -> Alert {
    let formatter = get_thousands_separator_formatter();
    let duration_ms = formatter.fmt_string(duration.as_millis());
    let imported = formatter.fmt_string(summary.imported);

    let mut skipped = Vec::new();

    if summary.duplicates > 0 {
        skipped.push(format!(
            "skipped {} already imported",
            formatter.fmt_string(summary.duplicates)
        ));
    }

    if summary.invalid > 0 {
        skipped.push(format!(
            "skipped {} invalid",
            formatter.fmt_string(summary.invalid)
        ));
    }

    tracing::info!(
        "Import completed in {duration_ms}ms: {} imported, {} duplicates, {} invalid",
        summary.imported,
        summary.duplicates,
        summary.invalid
    );

    let message = if summary.imported == 0 {
        "Import completed".to_owned()
    } else {
        "Import completed successfully!".to_owned()
    };

    let details = if skipped.is_empty() {
        format!("Imported {imported} transactions in {duration_ms}ms.")
    } else {
        format!(
            "Imported {imported} transactions and {} in {duration_ms}ms.",
            skipped.join(" and ")
        )
    };

    Alert::Success { message, details }
}

fn get_thousands_separator_formatter() -> &'static Formatter {
    static FORMATTER: OnceLock<Formatter> = OnceLock::new();

    FORMATTER.get_or_init(|| {
        Formatter::new()
            .separator(',')
            .unwrap_or_else(|_| Formatter::new())
            .precision(Precision::Decimals(0))
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{
        alert::Alert,
        csv_import::{alert::import_summary_alert, financisto::ImportSummary},
    };

    #[test]
    fn reports_every_count() {
        let alert = import_summary_alert(
            &ImportSummary {
                imported: 1234,
                duplicates: 2,
                invalid: 1,
            },
            Duration::from_millis(1500),
        );

        assert_eq!(
            alert,
            Alert::Success {
                message: "Import completed successfully!".to_owned(),
                details: "Imported 1,234 transactions and skipped 2 already imported \
                    and skipped 1 invalid in 1,500ms."
                    .to_owned(),
            }
        );
    }

    #[test]
    fn nothing_imported() {
        let alert = import_summary_alert(
            &ImportSummary {
                imported: 0,
                duplicates: 3,
                invalid: 0,
            },
            Duration::from_millis(5),
        );

        assert_eq!(
            alert,
            Alert::Success {
                message: "Import completed".to_owned(),
                details: "Imported 0 transactions and skipped 3 already imported in 5ms."
                    .to_owned(),
            }
        );
    }
}
