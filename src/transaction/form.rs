//! The form shared by the create and edit transaction pages.

use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    Error,
    account::{Account, AccountId, get_all_accounts},
    alert::ALERT_CONTAINER_ID,
    category::{CategoryId, get_category_options},
    datetime::{format_date_time_input, parse_date_time},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, optional_select,
    },
    location::{Location, LocationId, get_all_locations},
    money::{CurrencyCode, round_amount},
    payee::{Payee, PayeeId, get_all_payees},
    project::{Project, ProjectId, get_all_projects},
    transaction::{NewTransaction, Transaction},
};

/// Whether the money leaves or enters the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
    Income,
}

/// The form data for creating or updating a transaction.
///
/// The amount is always positive, the sign comes from the transaction type.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub date: String,
    pub account_id: AccountId,
    pub currency: Option<String>,
    pub note: Option<String>,
    pub category_id: Option<CategoryId>,
    pub payee_id: Option<PayeeId>,
    pub location_id: Option<LocationId>,
    pub project_id: Option<ProjectId>,
}

impl TransactionForm {
    /// Validate the form data.
    ///
    /// # Errors
    /// Returns an error if the amount is not positive once rounded to cents,
    /// or the date or currency cannot be parsed.
    pub fn validate(self) -> Result<NewTransaction, Error> {
        let amount = round_amount(self.amount);
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::NonPositiveAmount);
        }

        let date = parse_date_time(&self.date).ok_or(Error::InvalidDateTime(self.date))?;

        let currency = match self.currency.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Some(CurrencyCode::new(code)?),
            _ => None,
        };

        let amount = match self.transaction_type {
            TransactionType::Expense => -amount,
            TransactionType::Income => amount,
        };

        Ok(NewTransaction {
            account_id: self.account_id,
            date,
            amount,
            currency,
            note: self.note.unwrap_or_default(),
            category_id: self.category_id,
            payee_id: self.payee_id,
            location_id: self.location_id,
            project_id: self.project_id,
        })
    }
}

/// The choices offered by the select inputs of the transaction form.
pub struct TransactionFormOptions {
    pub accounts: Vec<Account>,
    pub categories: Vec<(CategoryId, String)>,
    pub payees: Vec<Payee>,
    pub locations: Vec<Location>,
    pub projects: Vec<Project>,
}

impl TransactionFormOptions {
    pub fn load(connection: &Connection) -> Result<Self, Error> {
        Ok(Self {
            accounts: get_all_accounts(connection)?,
            categories: get_category_options(connection)?,
            payees: get_all_payees(connection)?,
            locations: get_all_locations(connection)?,
            projects: get_all_projects(connection)?,
        })
    }
}

/// Renders the transaction form.
///
/// `hx_method` is either "hx-post" or "hx-put". Inactive accounts are only
/// listed when `transaction` already belongs to one.
pub fn transaction_form_view(
    endpoint: &str,
    hx_method: &str,
    transaction: Option<&Transaction>,
    options: &TransactionFormOptions,
    default_date: &str,
    submit_text: &str,
) -> Markup {
    let is_expense = transaction.is_none_or(|transaction| transaction.amount < 0.0);
    let amount = transaction.map(|transaction| format!("{:.2}", transaction.amount.abs()));
    let date = transaction
        .map(|transaction| format_date_time_input(transaction.date))
        .unwrap_or_else(|| default_date.to_owned());
    let account_id = transaction.map(|transaction| transaction.account_id);
    let currency = transaction.map(|transaction| transaction.currency.as_ref());
    let note = transaction.map(|transaction| transaction.note.as_str());
    let (hx_post, hx_put) = if hx_method == "hx-put" {
        (None, Some(endpoint))
    } else {
        (Some(endpoint), None)
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error={ "#" (ALERT_CONTAINER_ID) }
            class="w-full space-y-4 md:space-y-6"
        {
            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Transaction type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    div class="flex items-center gap-3"
                    {
                        input
                            name="transaction_type"
                            id="transaction-type-expense"
                            type="radio"
                            value="expense"
                            checked[is_expense]
                            required
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for="transaction-type-expense" class=(FORM_RADIO_LABEL_STYLE)
                        {
                            "Expense"
                        }
                    }

                    div class="flex items-center gap-3"
                    {
                        input
                            name="transaction_type"
                            id="transaction-type-income"
                            type="radio"
                            value="income"
                            checked[!is_expense]
                            required
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for="transaction-type-income" class=(FORM_RADIO_LABEL_STYLE)
                        {
                            "Income"
                        }
                    }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    value=[amount]
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="date"
                    type="datetime-local"
                    name="date"
                    value=(date)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

                select id="account_id" name="account_id" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for account in &options.accounts {
                        @if account.is_active || account_id == Some(account.id) {
                            option
                                value=(account.id)
                                data-currency=(account.currency)
                                selected[account_id == Some(account.id)]
                            {
                                (account.name) " (" (account.currency) ")"
                            }
                        }
                    }
                }
            }

            div
            {
                label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }

                input
                    id="currency"
                    type="text"
                    name="currency"
                    minlength="3"
                    maxlength="3"
                    placeholder="Account currency"
                    value=[currency]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (optional_select(
                "payee_id",
                "Payee",
                options.payees.iter().map(|payee| (payee.id, payee.name.as_ref())),
                transaction.and_then(|transaction| transaction.payee_id),
            ))

            (optional_select(
                "category_id",
                "Category",
                options.categories.iter().map(|(id, label)| (*id, label.as_str())),
                transaction.and_then(|transaction| transaction.category_id),
            ))

            (optional_select(
                "location_id",
                "Location",
                options.locations.iter().map(|location| (location.id, location.name.as_ref())),
                transaction.and_then(|transaction| transaction.location_id),
            ))

            (optional_select(
                "project_id",
                "Project",
                options.projects.iter().map(|project| (project.id, project.name.as_ref())),
                transaction.and_then(|transaction| transaction.project_id),
            ))

            div
            {
                label for="note" class=(FORM_LABEL_STYLE) { "Note" }

                input
                    id="note"
                    type="text"
                    name="note"
                    placeholder="Note"
                    value=[note]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }

        // Filled in by app.js when a payee is picked.
        template id="payee-defaults-endpoint" data-endpoint=(endpoints::PAYEE_DEFAULTS) {}
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        Error,
        transaction::form::{TransactionForm, TransactionType},
    };

    #[test]
    fn expense_amount_becomes_negative() {
        let form: TransactionForm = serde_html_form::from_str(
            "transaction_type=expense&amount=12.5&date=2025-03-14T09%3A05&account_id=1\
            &currency=&note=Lunch&category_id=&payee_id=3",
        )
        .unwrap();

        let transaction = form.validate().unwrap();

        assert_eq!(transaction.amount, -12.5);
        assert_eq!(transaction.date, datetime!(2025-03-14 09:05));
        assert_eq!(transaction.currency, None);
        assert_eq!(transaction.category_id, None);
        assert_eq!(transaction.payee_id, Some(3));
        assert_eq!(transaction.note, "Lunch");
    }

    #[test]
    fn income_keeps_amount_and_currency() {
        let form: TransactionForm = serde_html_form::from_str(
            "transaction_type=income&amount=100&date=2025-03-14T09%3A05&account_id=1&currency=eur",
        )
        .unwrap();

        let transaction = form.validate().unwrap();

        assert_eq!(transaction.amount, 100.0);
        assert_eq!(
            transaction.currency.map(|currency| currency.to_string()),
            Some("EUR".to_owned())
        );
    }

    #[test]
    fn rejects_non_positive_amount() {
        for amount in ["0", "-5", "0.004"] {
            let form: TransactionForm = serde_html_form::from_str(&format!(
                "transaction_type=expense&amount={amount}&date=2025-03-14T09%3A05&account_id=1"
            ))
            .unwrap();

            assert_eq!(form.validate(), Err(Error::NonPositiveAmount));
        }
    }

    #[test]
    fn rejects_invalid_date() {
        let form: TransactionForm = serde_html_form::from_str(
            "transaction_type=expense&amount=1&date=tomorrow&account_id=1",
        )
        .unwrap();

        assert_eq!(
            form.validate(),
            Err(Error::InvalidDateTime("tomorrow".to_owned()))
        );
    }
}
