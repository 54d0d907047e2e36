//! Application router configuration with the page and API route definitions.

use axum::{
    Router,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_accounts_json, get_accounts_page, get_create_account_page, get_edit_account_page,
    },
    backup::backup_database_endpoint,
    balance::recalculate_balances_endpoint,
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budgets_json, get_budgets_page,
        get_edit_budget_page, get_new_budget_page, update_budget_endpoint,
    },
    category::{
        create_category_endpoint, deduplicate_categories_endpoint, delete_category_endpoint,
        get_categories_json, get_categories_page, get_edit_category_page, get_new_category_page,
        update_category_endpoint,
    },
    csv_import::{export_transactions_endpoint, get_import_page, import_transactions_endpoint},
    dashboard::{get_dashboard_page, get_dashboard_summary_json},
    endpoints,
    error_page::{get_404_not_found, get_internal_server_error_page},
    exchange_rate::{
        create_exchange_rate_endpoint, get_exchange_rates_json, get_exchange_rates_page,
        update_exchange_rates_endpoint,
    },
    location::{
        create_location_endpoint, delete_location_endpoint, get_edit_location_page,
        get_locations_json, get_locations_page, get_new_location_page, update_location_endpoint,
    },
    maintenance::get_maintenance_page,
    payee::{
        create_payee_endpoint, delete_payee_endpoint, get_edit_payee_page, get_new_payee_page,
        get_payee_defaults_endpoint, get_payees_json, get_payees_page,
        refresh_payee_statistics_endpoint, update_payee_endpoint,
    },
    project::{
        create_project_endpoint, delete_project_endpoint, get_edit_project_page,
        get_new_project_page, get_projects_json, get_projects_page, update_project_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_edit_transaction_page,
        get_new_transaction_page, get_transaction_json, get_transaction_page,
        get_transactions_json, get_transactions_page, update_transaction_endpoint,
    },
    transfer::{
        create_transfer_endpoint, delete_transfer_endpoint, get_new_transfer_page,
        get_transfers_json, get_transfers_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_new_transaction_page),
        )
        .route(endpoints::TRANSACTION_VIEW, get(get_transaction_page))
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::TRANSFERS_VIEW, get(get_transfers_page))
        .route(endpoints::NEW_TRANSFER_VIEW, get(get_new_transfer_page))
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::NEW_ACCOUNT_VIEW, get(get_create_account_page))
        .route(endpoints::EDIT_ACCOUNT_VIEW, get(get_edit_account_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .route(endpoints::PAYEES_VIEW, get(get_payees_page))
        .route(endpoints::NEW_PAYEE_VIEW, get(get_new_payee_page))
        .route(endpoints::EDIT_PAYEE_VIEW, get(get_edit_payee_page))
        .route(endpoints::LOCATIONS_VIEW, get(get_locations_page))
        .route(endpoints::NEW_LOCATION_VIEW, get(get_new_location_page))
        .route(endpoints::EDIT_LOCATION_VIEW, get(get_edit_location_page))
        .route(endpoints::PROJECTS_VIEW, get(get_projects_page))
        .route(endpoints::NEW_PROJECT_VIEW, get(get_new_project_page))
        .route(endpoints::EDIT_PROJECT_VIEW, get(get_edit_project_page))
        .route(endpoints::EXCHANGE_RATES_VIEW, get(get_exchange_rates_page))
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::NEW_BUDGET_VIEW, get(get_new_budget_page))
        .route(endpoints::EDIT_BUDGET_VIEW, get(get_edit_budget_page))
        .route(endpoints::IMPORT_VIEW, get(get_import_page))
        .route(endpoints::MAINTENANCE_VIEW, get(get_maintenance_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let api_routes = Router::new()
        .route(
            endpoints::ACCOUNTS_API,
            get(get_accounts_json).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT,
            put(edit_account_endpoint).delete(delete_account_endpoint),
        )
        .route(
            endpoints::CATEGORIES_API,
            get(get_categories_json).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            put(update_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::DEDUPLICATE_CATEGORIES,
            post(deduplicate_categories_endpoint),
        )
        .route(
            endpoints::PAYEES_API,
            get(get_payees_json).post(create_payee_endpoint),
        )
        .route(
            endpoints::PAYEE,
            put(update_payee_endpoint).delete(delete_payee_endpoint),
        )
        .route(endpoints::PAYEE_DEFAULTS, get(get_payee_defaults_endpoint))
        .route(
            endpoints::PAYEE_STATISTICS,
            post(refresh_payee_statistics_endpoint),
        )
        .route(
            endpoints::LOCATIONS_API,
            get(get_locations_json).post(create_location_endpoint),
        )
        .route(
            endpoints::LOCATION,
            put(update_location_endpoint).delete(delete_location_endpoint),
        )
        .route(
            endpoints::PROJECTS_API,
            get(get_projects_json).post(create_project_endpoint),
        )
        .route(
            endpoints::PROJECT,
            put(update_project_endpoint).delete(delete_project_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_API,
            get(get_transactions_json).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_json)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::TRANSFERS_API,
            get(get_transfers_json).post(create_transfer_endpoint),
        )
        .route(endpoints::TRANSFER, delete(delete_transfer_endpoint))
        .route(
            endpoints::EXCHANGE_RATES_API,
            get(get_exchange_rates_json).post(create_exchange_rate_endpoint),
        )
        .route(
            endpoints::UPDATE_EXCHANGE_RATES,
            post(update_exchange_rates_endpoint),
        )
        .route(
            endpoints::BUDGETS_API,
            get(get_budgets_json).post(create_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            put(update_budget_endpoint).delete(delete_budget_endpoint),
        )
        .route(
            endpoints::DASHBOARD_SUMMARY,
            get(get_dashboard_summary_json),
        )
        .route(endpoints::IMPORT, post(import_transactions_endpoint))
        .route(endpoints::EXPORT, get(export_transactions_endpoint))
        .route(endpoints::BACKUP, post(backup_database_endpoint))
        .route(
            endpoints::RECALCULATE_BALANCES,
            post(recalculate_balances_endpoint),
        );

    page_routes
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
