use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

use crate::{Error, error::is_unique_violation, name::Name, payee::refresh_all_payee_statistics};

pub type ProjectId = i64;

/// A group of transactions that belong together, e.g. a holiday or a renovation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: Name,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: Name,
    pub description: Option<String>,
}

pub fn create_project_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS project (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Project, rusqlite::Error> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

pub fn create_project(project: &NewProject, connection: &Connection) -> Result<Project, Error> {
    connection
        .execute(
            "INSERT INTO project (name, description) VALUES (?1, ?2)",
            params![project.name, project.description],
        )
        .map_err(|error| map_duplicate_name(error, &project.name))?;

    Ok(Project {
        id: connection.last_insert_rowid(),
        name: project.name.clone(),
        description: project.description.clone(),
    })
}

pub fn get_project(id: ProjectId, connection: &Connection) -> Result<Project, Error> {
    connection
        .query_row(
            "SELECT id, name, description FROM project WHERE id = ?1",
            [id],
            map_row,
        )
        .map_err(Error::from)
}

pub fn get_all_projects(connection: &Connection) -> Result<Vec<Project>, Error> {
    connection
        .prepare("SELECT id, name, description FROM project ORDER BY name ASC")?
        .query_map([], map_row)?
        .map(|maybe_project| maybe_project.map_err(Error::from))
        .collect()
}

pub fn update_project(
    id: ProjectId,
    project: &NewProject,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "UPDATE project SET name = ?1, description = ?2 WHERE id = ?3",
            params![project.name, project.description, id],
        )
        .map_err(|error| map_duplicate_name(error, &project.name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("project"));
    }

    Ok(())
}

/// Delete a project. Transactions and payee statistics lose the reference.
pub fn delete_project(id: ProjectId, connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    let rows_affected = transaction.execute("DELETE FROM project WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissing("project"));
    }

    refresh_all_payee_statistics(&transaction)?;
    transaction.commit()?;

    Ok(())
}

pub fn get_or_create_project(name: &Name, connection: &Connection) -> Result<ProjectId, Error> {
    let existing: Option<ProjectId> = connection
        .query_row("SELECT id FROM project WHERE name = ?1", [name], |row| {
            row.get(0)
        })
        .optional()?;

    match existing {
        Some(id) => Ok(id),
        None => create_project(
            &NewProject {
                name: name.clone(),
                description: None,
            },
            connection,
        )
        .map(|project| project.id),
    }
}

fn map_duplicate_name(error: rusqlite::Error, name: &Name) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateName("project", name.to_string())
    } else {
        error.into()
    }
}
