//! Delfin is a web app for tracking personal finances across accounts and
//! currencies.
//!
//! This library provides a REST API that directly serves HTML pages, plus the
//! import and maintenance functions used by the command line tools.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod backup;
mod balance;
mod budget;
mod category;
mod csv_import;
mod dashboard;
mod datetime;
mod db;
mod endpoints;
mod error;
mod error_page;
mod exchange_rate;
mod html;
mod location;
mod logging;
mod maintenance;
mod money;
mod name;
mod navigation;
mod pagination;
mod payee;
mod project;
mod routing;
#[cfg(test)]
mod test_utils;
mod timezone;
mod transaction;
mod transfer;

pub use app_state::{AppState, DEFAULT_ECB_URL};
pub use balance::recalculate_all_balances;
pub use category::{DeduplicationSummary, deduplicate_categories};
pub use csv_import::{ImportSummary, import_financisto_csv};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use exchange_rate::{RateUpdateSummary, apply_ecb_rates, fetch_ecb_xml};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use payee::refresh_all_payee_statistics;
pub use routing::build_router;
pub use timezone::get_local_offset;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
