//! Transfers move money between two accounts as a pair of linked transactions.

mod core;
mod handlers;

pub use core::{
    NewTransfer, TRANSFER_IN_LOCATION, TRANSFER_OUT_LOCATION, Transfer, TransferId,
    create_transfer, create_transfer_table, delete_transfer, get_all_transfers, get_transfer,
};
pub use handlers::{
    TransferForm, TransferState, create_transfer_endpoint, delete_transfer_endpoint,
    get_new_transfer_page, get_transfers_json, get_transfers_page,
};
