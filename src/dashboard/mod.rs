//! Overview page with the total balance, account balances, this month's
//! budget and charts of the last twelve months.

mod aggregation;
mod charts;
mod handlers;
mod summary;

pub use aggregation::{
    MonthlyTotals, get_expenses_by_category, get_month_end_balances, get_monthly_totals,
    last_twelve_months,
};
pub use handlers::{DashboardState, get_dashboard_page, get_dashboard_summary_json};
pub use summary::{AccountBalance, DashboardSummary, get_account_balances, get_dashboard_summary};
