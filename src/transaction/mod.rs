//! Transactions: the money moving in and out of accounts.
//!
//! Creating, editing and deleting a transaction also keeps the cached running
//! balances and the payee statistics up to date.

mod core;
mod create;
mod delete;
mod edit;
mod form;
mod transactions_page;
mod view;

pub use core::{
    NewTransaction, Transaction, TransactionFilter, TransactionId, TransactionListing,
    count_filtered_transactions, count_transactions, create_transaction,
    create_transaction_table, delete_transaction, get_all_transaction_listings, get_transaction,
    get_transaction_listing, insert_transaction, map_row_to_transaction, query_transactions,
    update_transaction,
};
pub(crate) use core::insert_transfer_leg;
pub use create::{TransactionState, create_transaction_endpoint, get_new_transaction_page};
pub use delete::delete_transaction_endpoint;
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub use transactions_page::{TransactionsViewState, get_transactions_json, get_transactions_page};
pub use view::{get_transaction_json, get_transaction_page};
