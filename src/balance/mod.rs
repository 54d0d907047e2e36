//! Running balance caches for accounts and the total across accounts.

mod core;
mod endpoint;

pub(crate) use core::to_base_currency;
pub use core::{
    SortKey, create_balance_state_table, get_total_balance, recalculate_all_balances,
    recalculate_balances,
};
pub use endpoint::{RecalculateBalancesState, recalculate_balances_endpoint};
