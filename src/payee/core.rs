use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

use crate::{Error, error::is_unique_violation, name::Name};

pub type PayeeId = i64;

/// Someone money is paid to or received from, e.g. a shop or an employer.
///
/// The `most_common_*` fields cache the reference used most often by the
/// payee's transactions, see [refresh_payee_statistics].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payee {
    pub id: PayeeId,
    pub name: Name,
    pub most_common_category_id: Option<i64>,
    pub most_common_location_id: Option<i64>,
    pub most_common_project_id: Option<i64>,
}

/// The defaults suggested for a new transaction with a payee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayeeDefaults {
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub project_id: Option<i64>,
}

pub fn create_payee_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS payee (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            most_common_category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            most_common_location_id INTEGER REFERENCES location(id) ON DELETE SET NULL,
            most_common_project_id INTEGER REFERENCES project(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        (),
    )?;

    Ok(())
}

const SELECT_PAYEE: &str = "SELECT id, name, most_common_category_id, most_common_location_id, \
    most_common_project_id FROM payee";

fn map_row(row: &Row) -> Result<Payee, rusqlite::Error> {
    Ok(Payee {
        id: row.get(0)?,
        name: row.get(1)?,
        most_common_category_id: row.get(2)?,
        most_common_location_id: row.get(3)?,
        most_common_project_id: row.get(4)?,
    })
}

/// Create a payee with no statistics.
///
/// # Errors
/// Returns [Error::DuplicateName] if a payee with the same name exists.
pub fn create_payee(name: &Name, connection: &Connection) -> Result<Payee, Error> {
    connection
        .execute("INSERT INTO payee (name) VALUES (?1)", [name])
        .map_err(|error| map_duplicate_name(error, name))?;

    Ok(Payee {
        id: connection.last_insert_rowid(),
        name: name.clone(),
        most_common_category_id: None,
        most_common_location_id: None,
        most_common_project_id: None,
    })
}

pub fn get_payee(id: PayeeId, connection: &Connection) -> Result<Payee, Error> {
    connection
        .prepare(&format!("{SELECT_PAYEE} WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_row)
        .map_err(|error| error.into())
}

/// Get all payees ordered alphabetically by name.
pub fn get_all_payees(connection: &Connection) -> Result<Vec<Payee>, Error> {
    connection
        .prepare(&format!("{SELECT_PAYEE} ORDER BY name ASC"))?
        .query_map([], map_row)?
        .map(|maybe_payee| maybe_payee.map_err(|error| error.into()))
        .collect()
}

/// Rename a payee.
///
/// # Errors
/// Returns [Error::UpdateMissing] if the payee does not exist, or
/// [Error::DuplicateName] if the new name is taken.
pub fn update_payee(id: PayeeId, name: &Name, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "UPDATE payee SET name = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![name, id],
        )
        .map_err(|error| map_duplicate_name(error, name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("payee"));
    }

    Ok(())
}

/// Delete a payee. Its transactions keep their other details but lose the payee.
pub fn delete_payee(id: PayeeId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM payee WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissing("payee"));
    }

    Ok(())
}

/// Find a payee by name, creating it if it does not exist.
pub fn get_or_create_payee(name: &Name, connection: &Connection) -> Result<PayeeId, Error> {
    let existing: Option<PayeeId> = connection
        .query_row("SELECT id FROM payee WHERE name = ?1", [name], |row| {
            row.get(0)
        })
        .optional()?;

    match existing {
        Some(id) => Ok(id),
        None => create_payee(name, connection).map(|payee| payee.id),
    }
}

pub fn get_payee_defaults(id: PayeeId, connection: &Connection) -> Result<PayeeDefaults, Error> {
    let payee = get_payee(id, connection)?;

    Ok(PayeeDefaults {
        category_id: payee.most_common_category_id,
        location_id: payee.most_common_location_id,
        project_id: payee.most_common_project_id,
    })
}

/// The value of `column` used by most of the payee's transactions.
///
/// NULLs are ignored and ties go to the lowest ID.
fn most_common(
    column: &str,
    payee_id: PayeeId,
    connection: &Connection,
) -> Result<Option<i64>, rusqlite::Error> {
    connection
        .query_row(
            &format!(
                "SELECT {column} FROM \"transaction\"
                WHERE payee_id = ?1 AND {column} IS NOT NULL
                GROUP BY {column}
                ORDER BY COUNT(*) DESC, {column} ASC
                LIMIT 1"
            ),
            [payee_id],
            |row| row.get(0),
        )
        .optional()
}

/// Recompute the most common category, location and project of a payee.
pub fn refresh_payee_statistics(payee_id: PayeeId, connection: &Connection) -> Result<(), Error> {
    let category_id = most_common("category_id", payee_id, connection)?;
    let location_id = most_common("location_id", payee_id, connection)?;
    let project_id = most_common("project_id", payee_id, connection)?;

    connection.execute(
        "UPDATE payee
        SET most_common_category_id = ?1,
            most_common_location_id = ?2,
            most_common_project_id = ?3,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?4",
        params![category_id, location_id, project_id, payee_id],
    )?;

    Ok(())
}

/// Recompute the statistics of every payee, returning how many were refreshed.
pub fn refresh_all_payee_statistics(connection: &Connection) -> Result<usize, Error> {
    let payee_ids: Vec<PayeeId> = connection
        .prepare("SELECT id FROM payee")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for &payee_id in &payee_ids {
        refresh_payee_statistics(payee_id, connection)?;
    }

    Ok(payee_ids.len())
}

fn map_duplicate_name(error: rusqlite::Error, name: &Name) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateName("payee", name.to_string())
    } else {
        error.into()
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        account::{NewAccount, create_account},
        category::{NewCategory, create_category, delete_category},
        db::initialize,
        money::CurrencyCode,
        name::Name,
        payee::{
            PayeeDefaults, create_payee, delete_payee, get_all_payees, get_or_create_payee,
            get_payee, get_payee_defaults, refresh_payee_statistics, update_payee,
        },
        transaction::{NewTransaction, create_transaction},
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_account(
            &NewAccount {
                name: Name::new_unchecked("Current"),
                kind: None,
                currency: CurrencyCode::reference(),
                initial_balance: 0.0,
                is_active: true,
            },
            &connection,
        )
        .unwrap();
        connection
    }

    fn add_category(name: &str, connection: &Connection) -> i64 {
        create_category(
            &NewCategory {
                name: Name::new_unchecked(name),
                parent_id: None,
                kind: None,
            },
            connection,
        )
        .unwrap()
        .id
    }

    fn add_transaction(payee_id: i64, category_id: Option<i64>, connection: &Connection) {
        create_transaction(
            NewTransaction {
                payee_id: Some(payee_id),
                category_id,
                ..NewTransaction::new(1, datetime!(2025-01-01 12:00), -5.0)
            },
            connection,
        )
        .unwrap();
    }

    #[test]
    fn create_and_rename_payee() {
        let connection = get_test_connection();
        let payee = create_payee(&Name::new_unchecked("Tesco"), &connection).unwrap();

        update_payee(payee.id, &Name::new_unchecked("Tesco Extra"), &connection).unwrap();

        assert_eq!(
            get_payee(payee.id, &connection).unwrap().name,
            Name::new_unchecked("Tesco Extra")
        );
    }

    #[test]
    fn duplicate_name_fails() {
        let connection = get_test_connection();
        create_payee(&Name::new_unchecked("Tesco"), &connection).unwrap();

        assert_eq!(
            create_payee(&Name::new_unchecked("Tesco"), &connection),
            Err(Error::DuplicateName("payee", "Tesco".to_owned()))
        );
    }

    #[test]
    fn get_or_create_reuses_payee() {
        let connection = get_test_connection();
        let name = Name::new_unchecked("Landlord");

        let first = get_or_create_payee(&name, &connection).unwrap();
        let second = get_or_create_payee(&name, &connection).unwrap();

        assert_eq!(first, second);
        assert_eq!(get_all_payees(&connection).unwrap().len(), 1);
    }

    #[test]
    fn statistics_pick_most_used_category() {
        let connection = get_test_connection();
        let payee = create_payee(&Name::new_unchecked("Tesco"), &connection).unwrap();
        let groceries = add_category("Groceries", &connection);
        let household = add_category("Household", &connection);
        add_transaction(payee.id, Some(household), &connection);
        add_transaction(payee.id, Some(groceries), &connection);
        add_transaction(payee.id, Some(groceries), &connection);
        add_transaction(payee.id, None, &connection);
        add_transaction(payee.id, None, &connection);
        add_transaction(payee.id, None, &connection);

        let defaults = get_payee_defaults(payee.id, &connection).unwrap();

        assert_eq!(
            defaults,
            PayeeDefaults {
                category_id: Some(groceries),
                location_id: None,
                project_id: None,
            }
        );
    }

    #[test]
    fn statistics_ties_go_to_lowest_id() {
        let connection = get_test_connection();
        let payee = create_payee(&Name::new_unchecked("Tesco"), &connection).unwrap();
        let first = add_category("Groceries", &connection);
        let second = add_category("Household", &connection);
        add_transaction(payee.id, Some(second), &connection);
        add_transaction(payee.id, Some(first), &connection);

        refresh_payee_statistics(payee.id, &connection).unwrap();

        assert_eq!(
            get_payee(payee.id, &connection)
                .unwrap()
                .most_common_category_id,
            Some(first)
        );
    }

    #[test]
    fn deleting_category_clears_statistics() {
        let connection = get_test_connection();
        let payee = create_payee(&Name::new_unchecked("Tesco"), &connection).unwrap();
        let groceries = add_category("Groceries", &connection);
        add_transaction(payee.id, Some(groceries), &connection);

        delete_category(groceries, &connection).unwrap();

        assert_eq!(
            get_payee(payee.id, &connection)
                .unwrap()
                .most_common_category_id,
            None
        );
    }

    #[test]
    fn delete_payee_succeeds_then_missing() {
        let connection = get_test_connection();
        let payee = create_payee(&Name::new_unchecked("Tesco"), &connection).unwrap();

        assert_eq!(delete_payee(payee.id, &connection), Ok(()));
        assert_eq!(
            delete_payee(payee.id, &connection),
            Err(Error::DeleteMissing("payee"))
        );
    }
}
