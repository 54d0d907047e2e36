use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

use crate::{Error, error::is_unique_violation, name::Name, payee::refresh_all_payee_statistics};

pub type LocationId = i64;

/// Where a transaction took place, e.g. a town or a shop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: LocationId,
    pub name: Name,
}

pub fn create_location_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS location (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Location, rusqlite::Error> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

pub fn create_location(name: &Name, connection: &Connection) -> Result<Location, Error> {
    connection
        .execute("INSERT INTO location (name) VALUES (?1)", [name])
        .map_err(|error| map_duplicate_name(error, name))?;

    Ok(Location {
        id: connection.last_insert_rowid(),
        name: name.clone(),
    })
}

pub fn get_location(id: LocationId, connection: &Connection) -> Result<Location, Error> {
    connection
        .query_row("SELECT id, name FROM location WHERE id = ?1", [id], map_row)
        .map_err(Error::from)
}

pub fn get_all_locations(connection: &Connection) -> Result<Vec<Location>, Error> {
    connection
        .prepare("SELECT id, name FROM location ORDER BY name ASC")?
        .query_map([], map_row)?
        .map(|maybe_location| maybe_location.map_err(Error::from))
        .collect()
}

pub fn update_location(id: LocationId, name: &Name, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "UPDATE location SET name = ?1 WHERE id = ?2",
            params![name, id],
        )
        .map_err(|error| map_duplicate_name(error, name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("location"));
    }

    Ok(())
}

/// Delete a location. Transactions and payee statistics lose the reference.
pub fn delete_location(id: LocationId, connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    let rows_affected = transaction.execute("DELETE FROM location WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissing("location"));
    }

    refresh_all_payee_statistics(&transaction)?;
    transaction.commit()?;

    Ok(())
}

pub fn get_or_create_location(name: &Name, connection: &Connection) -> Result<LocationId, Error> {
    let existing: Option<LocationId> = connection
        .query_row("SELECT id FROM location WHERE name = ?1", [name], |row| {
            row.get(0)
        })
        .optional()?;

    match existing {
        Some(id) => Ok(id),
        None => create_location(name, connection).map(|location| location.id),
    }
}

fn map_duplicate_name(error: rusqlite::Error, name: &Name) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateName("location", name.to_string())
    } else {
        error.into()
    }
}
