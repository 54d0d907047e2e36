//! Merges categories that only differ by letter case or surrounding whitespace.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    category::{Category, CategoryId, get_all_categories},
    payee::refresh_all_payee_statistics,
};

/// What [deduplicate_categories] changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeduplicationSummary {
    /// The number of categories that were merged into another and deleted.
    pub merged_categories: usize,
    /// The number of transactions that now point at the kept category.
    pub transactions_reassigned: usize,
}

/// Merge categories with the same name (ignoring case) and the same parent.
///
/// The category with the lowest ID in each group is kept. Transactions, payee
/// statistics and subcategories of the others are moved to it before they are
/// deleted. Top-level categories are merged first so that their children are
/// compared under a single parent.
pub fn deduplicate_categories(connection: &Connection) -> Result<DeduplicationSummary, Error> {
    let transaction = connection.unchecked_transaction()?;
    let mut summary = DeduplicationSummary::default();

    let top_level: Vec<Category> = get_all_categories(&transaction)?
        .into_iter()
        .filter(|category| category.parent_id.is_none())
        .collect();

    for (keeper, duplicates) in duplicate_groups(&top_level) {
        for duplicate in duplicates {
            move_children(duplicate, keeper, &transaction, &mut summary)?;
            merge_into(duplicate, keeper, &transaction, &mut summary)?;
        }
    }

    let children: Vec<Category> = get_all_categories(&transaction)?
        .into_iter()
        .filter(|category| category.parent_id.is_some())
        .collect();

    for (keeper, duplicates) in duplicate_groups(&children) {
        for duplicate in duplicates {
            merge_into(duplicate, keeper, &transaction, &mut summary)?;
        }
    }

    if summary.merged_categories > 0 {
        refresh_all_payee_statistics(&transaction)?;
    }

    transaction.commit()?;

    Ok(summary)
}

/// Group categories by (parent, normalised name), returning the lowest ID of
/// each group with more than one member and the remaining IDs.
fn duplicate_groups(categories: &[Category]) -> Vec<(CategoryId, Vec<CategoryId>)> {
    let mut groups: BTreeMap<(Option<CategoryId>, String), Vec<CategoryId>> = BTreeMap::new();

    for category in categories {
        groups
            .entry((category.parent_id, normalise(category.name.as_ref())))
            .or_default()
            .push(category.id);
    }

    groups
        .into_values()
        .filter(|ids| ids.len() > 1)
        .map(|mut ids| {
            ids.sort_unstable();
            let keeper = ids.remove(0);
            (keeper, ids)
        })
        .collect()
}

fn normalise(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Re-parent the children of `duplicate` under `keeper`, merging any child
/// whose name clashes with one of the keeper's children.
fn move_children(
    duplicate: CategoryId,
    keeper: CategoryId,
    connection: &Connection,
    summary: &mut DeduplicationSummary,
) -> Result<(), Error> {
    let keeper_children = children_of(keeper, connection)?;

    for (child_id, child_name) in children_of(duplicate, connection)? {
        let clash = keeper_children
            .iter()
            .find(|(_, name)| normalise(name) == normalise(&child_name));

        match clash {
            Some((keeper_child_id, _)) => {
                merge_into(child_id, *keeper_child_id, connection, summary)?
            }
            None => {
                connection.execute(
                    "UPDATE category SET parent_id = ?1 WHERE id = ?2",
                    [keeper, child_id],
                )?;
            }
        }
    }

    Ok(())
}

fn children_of(
    parent_id: CategoryId,
    connection: &Connection,
) -> Result<Vec<(CategoryId, String)>, Error> {
    connection
        .prepare("SELECT id, name FROM category WHERE parent_id = ?1")?
        .query_map([parent_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .map(|maybe_child| maybe_child.map_err(Error::from))
        .collect()
}

fn merge_into(
    duplicate: CategoryId,
    keeper: CategoryId,
    connection: &Connection,
    summary: &mut DeduplicationSummary,
) -> Result<(), Error> {
    let reassigned = connection.execute(
        "UPDATE \"transaction\" SET category_id = ?1 WHERE category_id = ?2",
        [keeper, duplicate],
    )?;
    connection.execute(
        "UPDATE payee SET most_common_category_id = ?1 WHERE most_common_category_id = ?2",
        [keeper, duplicate],
    )?;
    connection.execute("DELETE FROM category WHERE id = ?1", [duplicate])?;

    tracing::debug!("Merged category {duplicate} into {keeper}, reassigned {reassigned} transactions");

    summary.merged_categories += 1;
    summary.transactions_reassigned += reassigned;

    Ok(())
}

/// The state needed for deduplicating categories.
#[derive(Debug, Clone)]
pub struct DeduplicateCategoriesState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeduplicateCategoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Merge duplicate categories and report what changed in an alert.
pub async fn deduplicate_categories_endpoint(
    State(state): State<DeduplicateCategoriesState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match deduplicate_categories(&connection) {
        Ok(summary) if summary.merged_categories == 0 => Alert::SuccessSimple {
            message: "No duplicate categories found".to_owned(),
        }
        .into_response(),
        Ok(summary) => {
            tracing::info!("Deduplicated categories: {summary:?}");
            Alert::Success {
                message: format!("Merged {} duplicate categories", summary.merged_categories),
                details: format!(
                    "{} transaction(s) were moved to the remaining categories.",
                    summary.transactions_reassigned
                ),
            }
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not deduplicate categories: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        account::{NewAccount, create_account},
        category::{
            NewCategory, create_category,
            dedupe::{DeduplicationSummary, deduplicate_categories},
            get_all_categories,
        },
        db::initialize,
        money::CurrencyCode,
        name::Name,
        transaction::{NewTransaction, create_transaction, get_transaction},
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn category(name: &str, parent_id: Option<i64>, connection: &Connection) -> i64 {
        create_category(
            &NewCategory {
                name: Name::new_unchecked(name),
                parent_id,
                kind: None,
            },
            connection,
        )
        .unwrap()
        .id
    }

    #[test]
    fn merges_case_insensitive_duplicates_and_their_children() {
        let connection = get_test_connection();
        let account = create_account(
            &NewAccount {
                name: Name::new_unchecked("Current"),
                kind: None,
                currency: CurrencyCode::new("GBP").unwrap(),
                initial_balance: 0.0,
                is_active: true,
            },
            &connection,
        )
        .unwrap();
        let food = category("Food", None, &connection);
        let food_lower = category("food", None, &connection);
        let groceries = category("Groceries", Some(food), &connection);
        let groceries_dup = category("groceries ", Some(food_lower), &connection);
        let snacks = category("Snacks", Some(food_lower), &connection);
        let mut transaction = NewTransaction::new(account.id, datetime!(2025-01-01 10:00), -5.0);
        transaction.category_id = Some(groceries_dup);
        let transaction = create_transaction(transaction, &connection).unwrap();

        let summary = deduplicate_categories(&connection).unwrap();

        assert_eq!(
            summary,
            DeduplicationSummary {
                merged_categories: 2,
                transactions_reassigned: 1
            }
        );
        let remaining: Vec<(i64, Option<i64>)> = get_all_categories(&connection)
            .unwrap()
            .into_iter()
            .map(|category| (category.id, category.parent_id))
            .collect();
        assert_eq!(
            remaining,
            [(food, None), (groceries, Some(food)), (snacks, Some(food))]
        );
        assert_eq!(
            get_transaction(transaction.id, &connection)
                .unwrap()
                .category_id,
            Some(groceries)
        );
    }

    #[test]
    fn no_duplicates_changes_nothing() {
        let connection = get_test_connection();
        category("Food", None, &connection);
        category("Travel", None, &connection);

        let summary = deduplicate_categories(&connection).unwrap();

        assert_eq!(summary, DeduplicationSummary::default());
        assert_eq!(get_all_categories(&connection).unwrap().len(), 2);
    }
}
