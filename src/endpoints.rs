//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/accounts/{account_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page with balances, budgets and charts.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for listing and filtering transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page showing a single transaction.
pub const TRANSACTION_VIEW: &str = "/transactions/{transaction_id}";
/// The page for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page for listing transfers between accounts.
pub const TRANSFERS_VIEW: &str = "/transfers";
/// The page for creating a new transfer.
pub const NEW_TRANSFER_VIEW: &str = "/transfers/new";
/// The page for listing all accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for creating a new account.
pub const NEW_ACCOUNT_VIEW: &str = "/accounts/new";
/// The page for editing an existing account.
pub const EDIT_ACCOUNT_VIEW: &str = "/accounts/{account_id}/edit";
/// The page for listing all categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page for editing an existing category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The page for listing all payees.
pub const PAYEES_VIEW: &str = "/payees";
/// The page for creating a new payee.
pub const NEW_PAYEE_VIEW: &str = "/payees/new";
/// The page for editing an existing payee.
pub const EDIT_PAYEE_VIEW: &str = "/payees/{payee_id}/edit";
/// The page for listing all locations.
pub const LOCATIONS_VIEW: &str = "/locations";
/// The page for creating a new location.
pub const NEW_LOCATION_VIEW: &str = "/locations/new";
/// The page for editing an existing location.
pub const EDIT_LOCATION_VIEW: &str = "/locations/{location_id}/edit";
/// The page for listing all projects.
pub const PROJECTS_VIEW: &str = "/projects";
/// The page for creating a new project.
pub const NEW_PROJECT_VIEW: &str = "/projects/new";
/// The page for editing an existing project.
pub const EDIT_PROJECT_VIEW: &str = "/projects/{project_id}/edit";
/// The page for listing and entering exchange rates.
pub const EXCHANGE_RATES_VIEW: &str = "/exchange-rates";
/// The page for listing monthly budgets.
pub const BUDGETS_VIEW: &str = "/budgets";
/// The page for creating a new budget.
pub const NEW_BUDGET_VIEW: &str = "/budgets/new";
/// The page for editing an existing budget.
pub const EDIT_BUDGET_VIEW: &str = "/budgets/{budget_id}/edit";
/// The page for importing transactions from CSV files.
pub const IMPORT_VIEW: &str = "/import";
/// The page with backup, export and recalculation tools.
pub const MAINTENANCE_VIEW: &str = "/maintenance";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to list and create accounts.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to update or delete an account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to list and create categories.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to update or delete a category.
pub const CATEGORY: &str = "/api/categories/{category_id}";
/// The route to merge duplicate categories.
pub const DEDUPLICATE_CATEGORIES: &str = "/api/categories/deduplicate";
/// The route to list and create payees.
pub const PAYEES_API: &str = "/api/payees";
/// The route to update or delete a payee.
pub const PAYEE: &str = "/api/payees/{payee_id}";
/// The route to get a payee's most common category, location and project.
pub const PAYEE_DEFAULTS: &str = "/api/payees/{payee_id}/defaults";
/// The route to refresh the statistics of every payee.
pub const PAYEE_STATISTICS: &str = "/api/payees/statistics";
/// The route to list and create locations.
pub const LOCATIONS_API: &str = "/api/locations";
/// The route to update or delete a location.
pub const LOCATION: &str = "/api/locations/{location_id}";
/// The route to list and create projects.
pub const PROJECTS_API: &str = "/api/projects";
/// The route to update or delete a project.
pub const PROJECT: &str = "/api/projects/{project_id}";
/// The route to list and create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to get, update or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to list and create transfers.
pub const TRANSFERS_API: &str = "/api/transfers";
/// The route to delete a transfer.
pub const TRANSFER: &str = "/api/transfers/{transfer_id}";
/// The route to list the latest rates and store a rate.
pub const EXCHANGE_RATES_API: &str = "/api/exchange-rates";
/// The route to fetch new rates from the ECB.
pub const UPDATE_EXCHANGE_RATES: &str = "/api/exchange-rates/update";
/// The route to list and create budgets.
pub const BUDGETS_API: &str = "/api/budgets";
/// The route to update or delete a budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route for the dashboard summary figures.
pub const DASHBOARD_SUMMARY: &str = "/api/dashboard/summary";
/// The route to upload CSV files for importing transactions.
pub const IMPORT: &str = "/api/import";
/// The route to download every transaction as CSV.
pub const EXPORT: &str = "/api/export";
/// The route to write a copy of the database to the backup directory.
pub const BACKUP: &str = "/api/backup";
/// The route to rebuild every cached balance.
pub const RECALCULATE_BALANCES: &str = "/api/balances/recalculate";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/accounts/{account_id}', '{account_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_VIEW);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_TRANSACTION_VIEW);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_TRANSACTION_VIEW);
        assert_endpoint_is_valid_uri(endpoints::TRANSFERS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_TRANSFER_VIEW);
        assert_endpoint_is_valid_uri(endpoints::ACCOUNTS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_ACCOUNT_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_ACCOUNT_VIEW);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_CATEGORY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_CATEGORY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::PAYEES_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_PAYEE_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_PAYEE_VIEW);
        assert_endpoint_is_valid_uri(endpoints::LOCATIONS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_LOCATION_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_LOCATION_VIEW);
        assert_endpoint_is_valid_uri(endpoints::PROJECTS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_PROJECT_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_PROJECT_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EXCHANGE_RATES_VIEW);
        assert_endpoint_is_valid_uri(endpoints::BUDGETS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_BUDGET_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_BUDGET_VIEW);
        assert_endpoint_is_valid_uri(endpoints::IMPORT_VIEW);
        assert_endpoint_is_valid_uri(endpoints::MAINTENANCE_VIEW);
        assert_endpoint_is_valid_uri(endpoints::INTERNAL_ERROR_VIEW);
        assert_endpoint_is_valid_uri(endpoints::STATIC);

        assert_endpoint_is_valid_uri(endpoints::ACCOUNTS_API);
        assert_endpoint_is_valid_uri(endpoints::ACCOUNT);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES_API);
        assert_endpoint_is_valid_uri(endpoints::CATEGORY);
        assert_endpoint_is_valid_uri(endpoints::DEDUPLICATE_CATEGORIES);
        assert_endpoint_is_valid_uri(endpoints::PAYEES_API);
        assert_endpoint_is_valid_uri(endpoints::PAYEE);
        assert_endpoint_is_valid_uri(endpoints::PAYEE_DEFAULTS);
        assert_endpoint_is_valid_uri(endpoints::PAYEE_STATISTICS);
        assert_endpoint_is_valid_uri(endpoints::LOCATIONS_API);
        assert_endpoint_is_valid_uri(endpoints::LOCATION);
        assert_endpoint_is_valid_uri(endpoints::PROJECTS_API);
        assert_endpoint_is_valid_uri(endpoints::PROJECT);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_API);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::TRANSFERS_API);
        assert_endpoint_is_valid_uri(endpoints::TRANSFER);
        assert_endpoint_is_valid_uri(endpoints::EXCHANGE_RATES_API);
        assert_endpoint_is_valid_uri(endpoints::UPDATE_EXCHANGE_RATES);
        assert_endpoint_is_valid_uri(endpoints::BUDGETS_API);
        assert_endpoint_is_valid_uri(endpoints::BUDGET);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_SUMMARY);
        assert_endpoint_is_valid_uri(endpoints::IMPORT);
        assert_endpoint_is_valid_uri(endpoints::EXPORT);
        assert_endpoint_is_valid_uri(endpoints::BACKUP);
        assert_endpoint_is_valid_uri(endpoints::RECALCULATE_BALANCES);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
