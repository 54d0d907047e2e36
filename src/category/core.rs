use std::collections::HashMap;

use rusqlite::{
    Connection, OptionalExtension, Row, ToSql, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error, error::is_unique_violation, name::Name, payee::refresh_all_payee_statistics,
};

pub type CategoryId = i64;

/// Whether a category is used for money going out or coming in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Expense,
    Income,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "expense",
            CategoryKind::Income => "income",
        }
    }
}

impl ToSql for CategoryKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for CategoryKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "expense" => Ok(CategoryKind::Expense),
            "income" => Ok(CategoryKind::Income),
            other => Err(FromSqlError::Other(
                format!("invalid category kind {other:?}").into(),
            )),
        }
    }
}

/// A category for expenses and income, e.g., 'Groceries', 'Eating Out', 'Wages'.
///
/// Categories form a tree at most two levels deep: a category is either
/// top-level or the child of a top-level category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: Name,
    pub parent_id: Option<CategoryId>,
    pub kind: Option<CategoryKind>,
}

/// The data needed to create or update a category.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: Name,
    pub parent_id: Option<CategoryId>,
    pub kind: Option<CategoryKind>,
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            parent_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            kind TEXT CHECK (kind IN ('expense', 'income')),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_category_name_parent
            ON category(name, COALESCE(parent_id, 0));
        CREATE INDEX IF NOT EXISTS idx_category_parent ON category(parent_id);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        kind: row.get(3)?,
    })
}

/// Create a category.
///
/// # Errors
/// Returns [Error::InvalidCategoryParent] if the parent is itself a child,
/// [Error::InvalidForeignKey] if the parent does not exist, or
/// [Error::DuplicateName] if a sibling with the same name exists.
pub fn create_category(category: &NewCategory, connection: &Connection) -> Result<Category, Error> {
    validate_parent(None, category.parent_id, connection)?;

    connection
        .execute(
            "INSERT INTO category (name, parent_id, kind) VALUES (?1, ?2, ?3)",
            params![category.name, category.parent_id, category.kind],
        )
        .map_err(|error| map_duplicate_name(error, &category.name))?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        name: category.name.clone(),
        parent_id: category.parent_id,
        kind: category.kind,
    })
}

pub fn get_category(id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, parent_id, kind FROM category WHERE id = :id")?
        .query_row(&[(":id", &id)], map_row)
        .map_err(|error| error.into())
}

/// Get all categories in tree order: each top-level category followed by its
/// children, both sorted by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT c.id, c.name, c.parent_id, c.kind
            FROM category c
            LEFT JOIN category p ON c.parent_id = p.id
            ORDER BY COALESCE(p.name, c.name) ASC, COALESCE(p.id, c.id) ASC,
                c.parent_id IS NOT NULL, c.name ASC",
        )?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Category labels for select inputs in tree order, children shown as
/// "Parent › Child".
pub fn get_category_options(connection: &Connection) -> Result<Vec<(CategoryId, String)>, Error> {
    let categories = get_all_categories(connection)?;
    let names: HashMap<CategoryId, &Name> = categories
        .iter()
        .map(|category| (category.id, &category.name))
        .collect();

    Ok(categories
        .iter()
        .map(|category| {
            let label = match category.parent_id.and_then(|id| names.get(&id)) {
                Some(parent_name) => format!("{parent_name} › {}", category.name),
                None => category.name.to_string(),
            };

            (category.id, label)
        })
        .collect())
}

/// Update a category's name, parent and kind.
///
/// # Errors
/// Returns [Error::UpdateMissing] if the category does not exist, plus the
/// errors documented on [create_category].
pub fn update_category(
    id: CategoryId,
    category: &NewCategory,
    connection: &Connection,
) -> Result<(), Error> {
    validate_parent(Some(id), category.parent_id, connection)?;

    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1, parent_id = ?2, kind = ?3 WHERE id = ?4",
            params![category.name, category.parent_id, category.kind, id],
        )
        .map_err(|error| map_duplicate_name(error, &category.name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissing("category"));
    }

    Ok(())
}

/// Delete a category.
///
/// Its children become top-level categories and transactions lose the
/// reference. Payee statistics are refreshed since their counts may change.
pub fn delete_category(id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    let rows_affected = transaction
        .execute("DELETE FROM category WHERE id = ?1", [id])
        .map_err(|error| {
            if is_unique_violation(&error) {
                Error::InvalidCategoryParent(
                    "a subcategory has the same name as an existing top-level category".to_owned(),
                )
            } else {
                error.into()
            }
        })?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissing("category"));
    }

    refresh_all_payee_statistics(&transaction)?;
    transaction.commit()?;

    Ok(())
}

/// Find a category by name under the named parent, creating either if needed.
///
/// `parent_name` of `None` means a top-level category.
pub fn get_or_create_category(
    name: &Name,
    parent_name: Option<&Name>,
    connection: &Connection,
) -> Result<CategoryId, Error> {
    let parent_id = match parent_name {
        Some(parent_name) => Some(get_or_create_category(parent_name, None, connection)?),
        None => None,
    };

    let existing: Option<CategoryId> = connection
        .query_row(
            "SELECT id FROM category WHERE name = ?1 AND parent_id IS ?2",
            params![name, parent_id],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let category = create_category(
        &NewCategory {
            name: name.clone(),
            parent_id,
            kind: None,
        },
        connection,
    )?;

    Ok(category.id)
}

/// Check the category tree stays at most two levels deep.
fn validate_parent(
    category_id: Option<CategoryId>,
    parent_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };

    if category_id == Some(parent_id) {
        return Err(Error::InvalidCategoryParent(
            "a category cannot be its own parent".to_owned(),
        ));
    }

    let parent = match get_category(parent_id, connection) {
        Ok(parent) => parent,
        Err(Error::NotFound) => return Err(Error::InvalidForeignKey),
        Err(error) => return Err(error),
    };

    if parent.parent_id.is_some() {
        return Err(Error::InvalidCategoryParent(format!(
            "\"{}\" is already a subcategory",
            parent.name
        )));
    }

    if let Some(category_id) = category_id {
        let child_count: u32 = connection.query_row(
            "SELECT COUNT(*) FROM category WHERE parent_id = ?1",
            [category_id],
            |row| row.get(0),
        )?;

        if child_count > 0 {
            return Err(Error::InvalidCategoryParent(
                "a category with subcategories cannot have a parent".to_owned(),
            ));
        }
    }

    Ok(())
}

fn map_duplicate_name(error: rusqlite::Error, name: &Name) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateName("category", name.to_string())
    } else {
        error.into()
    }
}
