//! Copies of the database written on request from the maintenance page.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::PrimitiveDateTime;

use crate::{AppState, Error, alert::Alert, timezone::get_local_now};

#[derive(Debug, Clone)]
pub struct BackupState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
    /// Where backups are written, created on first use.
    pub backup_dir: PathBuf,
}

impl FromRef<AppState> for BackupState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            backup_dir: state.backup_dir.clone(),
        }
    }
}

/// The backup file name for a backup taken at `now`, e.g. `delfin-20250301-094500.db`.
pub fn backup_file_name(now: PrimitiveDateTime) -> String {
    format!(
        "delfin-{}{:02}{:02}-{:02}{:02}{:02}.db",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// Write a compacted copy of the database into `backup_dir`.
///
/// # Errors
/// Returns [Error::BackupError] if the directory cannot be created or the
/// copy cannot be written, e.g. because a backup with the same name exists.
pub fn backup_database(
    backup_dir: &Path,
    now: PrimitiveDateTime,
    connection: &Connection,
) -> Result<PathBuf, Error> {
    std::fs::create_dir_all(backup_dir).map_err(|error| {
        Error::BackupError(format!(
            "could not create the directory {}: {error}",
            backup_dir.display()
        ))
    })?;

    let path = backup_dir.join(backup_file_name(now));

    connection
        .execute("VACUUM INTO ?1", [path.to_string_lossy()])
        .map_err(|error| Error::BackupError(error.to_string()))?;

    tracing::info!("Backed up the database to {}", path.display());

    Ok(path)
}

/// Route handler that backs up the database and names the new file.
pub async fn backup_database_endpoint(State(state): State<BackupState>) -> Response {
    let now = match get_local_now(&state.local_timezone) {
        Ok(now) => now,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match backup_database(&state.backup_dir, now, &connection) {
        Ok(path) => Alert::Success {
            message: "Backup created".to_owned(),
            details: format!("Saved the database to {}", path.display()),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("could not back up the database: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::PathBuf,
        sync::{Arc, Mutex},
    };

    use axum::{extract::State, http::StatusCode};
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        backup::{BackupState, backup_database, backup_database_endpoint, backup_file_name},
        db::initialize,
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "delfin-backup-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn get_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
            .execute(
                "INSERT INTO account (name, currency) VALUES ('Current', 'GBP')",
                [],
            )
            .unwrap();
        connection
    }

    #[test]
    fn file_name_includes_date_and_time() {
        assert_eq!(
            backup_file_name(datetime!(2025-03-01 09:45:07)),
            "delfin-20250301-094507.db"
        );
    }

    #[test]
    fn writes_readable_copy() {
        let dir = test_dir("copy");
        let connection = get_connection();

        let path = backup_database(&dir, datetime!(2025-03-01 09:45:07), &connection).unwrap();

        assert_eq!(path, dir.join("delfin-20250301-094507.db"));
        let copy = Connection::open(&path).unwrap();
        let name: String = copy
            .query_row("SELECT name FROM account", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "Current");
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn refuses_to_overwrite_backup() {
        let dir = test_dir("overwrite");
        let connection = get_connection();
        let now = datetime!(2025-03-01 09:45:07);
        backup_database(&dir, now, &connection).unwrap();

        let result = backup_database(&dir, now, &connection);

        assert!(matches!(result, Err(Error::BackupError(_))));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn endpoint_names_backup_file() {
        let dir = test_dir("endpoint");
        let state = BackupState {
            db_connection: Arc::new(Mutex::new(get_connection())),
            local_timezone: "Etc/UTC".to_owned(),
            backup_dir: dir.clone(),
        };

        let response = backup_database_endpoint(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Backup created"));
        assert!(text.contains("delfin-"));
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
        std::fs::remove_dir_all(dir).unwrap();
    }
}
