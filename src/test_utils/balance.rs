use rusqlite::Connection;

use crate::balance::recalculate_all_balances;

fn cached_balances(connection: &Connection) -> Vec<(i64, Option<f64>, Option<f64>)> {
    connection
        .prepare(
            "SELECT id, account_balance_after, total_balance_after FROM \"transaction\"
            ORDER BY date, id",
        )
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn current_balances(connection: &Connection) -> Vec<f64> {
    connection
        .prepare("SELECT current_balance FROM account ORDER BY id")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

/// Assert that the cached running balances and account balances are what a
/// rebuild from scratch produces.
#[track_caller]
pub(crate) fn assert_balances_match_rebuild(connection: &Connection) {
    let cached = cached_balances(connection);
    let accounts = current_balances(connection);

    recalculate_all_balances(connection).unwrap();

    assert_eq!(cached, cached_balances(connection), "cached running balances are stale");
    assert_eq!(accounts, current_balances(connection), "account balances are stale");
}
