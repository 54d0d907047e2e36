//! Payees and the statistics used to prefill new transactions.

mod core;
mod create;
mod delete;
mod edit;
mod form;
mod payees_page;
mod statistics;

pub use core::{
    Payee, PayeeDefaults, PayeeId, create_payee, create_payee_table, delete_payee,
    get_all_payees, get_or_create_payee, get_payee, get_payee_defaults,
    refresh_all_payee_statistics, refresh_payee_statistics, update_payee,
};
pub use create::{PayeeState, create_payee_endpoint, get_new_payee_page};
pub use delete::delete_payee_endpoint;
pub use edit::{get_edit_payee_page, update_payee_endpoint};
pub use payees_page::{get_payees_json, get_payees_page};
pub use statistics::{get_payee_defaults_endpoint, refresh_payee_statistics_endpoint};
