//! Exchange rates against GBP, conversion between currencies and updates from
//! the European Central Bank.

mod core;
mod ecb;
mod handlers;

pub use core::{
    ExchangeRate, RATE_LOOK_BACK_DAYS, convert_amount, create_exchange_rate_table,
    get_base_currency, get_exchange_rate_history, get_foreign_transaction_currencies,
    get_latest_exchange_rates, get_latest_rates, get_rate_for_date, get_rates_for_date,
    get_rates_in_range, upsert_exchange_rate,
};
pub use ecb::{
    EcbDay, RateUpdateSummary, calculate_gbp_rate, fetch_ecb_xml, parse_ecb_xml, store_ecb_rates,
};
pub use handlers::{
    ExchangeRateForm, ExchangeRateState, apply_ecb_rates, create_exchange_rate_endpoint,
    get_exchange_rates_json, get_exchange_rates_page, update_exchange_rates_endpoint,
};
