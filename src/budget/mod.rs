//! Monthly spending targets and how much of them has been used.

mod core;
mod handlers;

pub use core::{
    Budget, BudgetId, BudgetProgress, NewBudget, YearMonth, create_budget, create_budget_table,
    delete_budget, get_all_budgets, get_budget, get_budget_progress,
    get_budget_progress_for_month, get_month_spending, update_budget,
};
pub use handlers::{
    BudgetForm, BudgetState, budget_progress_bar, create_budget_endpoint, delete_budget_endpoint,
    get_budgets_json, get_budgets_page, get_edit_budget_page, get_new_budget_page,
    update_budget_endpoint,
};
