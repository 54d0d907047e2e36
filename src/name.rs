//! Validated, non-empty display names shared by accounts, categories, payees,
//! locations and projects.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::Serialize;

use crate::Error;

/// A trimmed name that is guaranteed not to be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    /// Create a name from `raw`, trimming surrounding whitespace.
    ///
    /// `kind` is used in the error message, e.g. "Account".
    ///
    /// # Errors
    /// Returns [Error::EmptyName] if `raw` is empty or only whitespace.
    pub fn new(raw: &str, kind: &'static str) -> Result<Self, Error> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            Err(Error::EmptyName(kind))
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }

    /// Create a name without validation, for values read back from the database.
    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for Name {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for Name {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Name::new_unchecked)
    }
}
